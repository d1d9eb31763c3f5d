//! Where source documents come from.

use crate::error::{StorageError, StorageResult};
use crate::resolver::PathResolver;
use async_trait::async_trait;
use bytes::Bytes;
use std::path::Path;
use tokio::fs;
use tracing::instrument;

/// Read access to source documents by sanitized filename.
///
/// The [`DocumentStore`](crate::DocumentStore) reads exclusively through
/// this trait, which also lets tests count source reads.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Read the complete source document.
    async fn load(&self, filename: &str) -> StorageResult<Bytes>;

    /// Check whether a document exists without reading it.
    async fn exists(&self, filename: &str) -> StorageResult<bool>;

    /// Name of the document `filename` ultimately refers to.
    ///
    /// Sources without aliases return the name unchanged.
    async fn resolved_name(&self, filename: &str) -> StorageResult<String> {
        Ok(filename.to_string())
    }
}

/// Uploaded documents on the local filesystem.
pub struct FilesystemSource {
    resolver: PathResolver,
}

impl FilesystemSource {
    /// Create a source reading under `root`.
    pub fn new(root: impl AsRef<Path>) -> StorageResult<Self> {
        Ok(Self {
            resolver: PathResolver::new(root)?,
        })
    }

    /// The resolver this source reads through.
    pub fn resolver(&self) -> &PathResolver {
        &self.resolver
    }
}

#[async_trait]
impl DocumentSource for FilesystemSource {
    #[instrument(skip(self), fields(source = "filesystem"))]
    async fn load(&self, filename: &str) -> StorageResult<Bytes> {
        let path = self.resolver.resolve_async(filename).await?;
        let data = fs::read(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::NotFound(filename.to_string())
            } else {
                StorageError::Io(e)
            }
        })?;
        Ok(Bytes::from(data))
    }

    #[instrument(skip(self), fields(source = "filesystem"))]
    async fn exists(&self, filename: &str) -> StorageResult<bool> {
        match self.resolver.resolve_async(filename).await {
            Ok(_) => Ok(true),
            Err(StorageError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    #[instrument(skip(self), fields(source = "filesystem"))]
    async fn resolved_name(&self, filename: &str) -> StorageResult<String> {
        let path = self.resolver.resolve_async(filename).await?;
        Ok(path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| filename.to_string()))
    }
}
