//! Untrusted filename to on-disk path resolution.
//!
//! Every filename arriving from a request is treated as hostile. Resolution
//! fails closed: anything that is not a plain basename of a file that
//! canonicalizes to a location under the uploads root is rejected.

use crate::error::{StorageError, StorageResult};
use std::path::{Component, Path, PathBuf};

/// Maximum accepted filename length in bytes.
pub const MAX_NAME_LEN: usize = 255;

/// Lexical filename validation.
///
/// Accepts only a bare basename: no separators, no parent markers, no
/// control characters. Does not touch the filesystem.
pub fn validate_name(requested: &str) -> StorageResult<&str> {
    if requested.is_empty() || requested.len() > MAX_NAME_LEN {
        return Err(StorageError::InvalidName("bad length".to_string()));
    }

    // Fast path for the obvious attempts.
    if requested.contains("..")
        || requested.contains('/')
        || requested.contains('\\')
        || requested.chars().any(|c| c.is_control())
    {
        return Err(StorageError::InvalidName(format!(
            "path traversal not allowed: {requested:?}"
        )));
    }

    // The basename must be the whole input and a normal component.
    let path = Path::new(requested);
    let mut components = path.components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(name)), None) if name == path.as_os_str() => {}
        _ => {
            return Err(StorageError::InvalidName(format!(
                "not a plain file name: {requested:?}"
            )));
        }
    }

    Ok(requested)
}

/// Maps request filenames to files under a fixed root directory.
#[derive(Clone, Debug)]
pub struct PathResolver {
    /// Canonical uploads root.
    root: PathBuf,
}

impl PathResolver {
    /// Create a resolver for `root`.
    ///
    /// The root must already exist; it is canonicalized once here.
    pub fn new(root: impl AsRef<Path>) -> StorageResult<Self> {
        let root = root.as_ref();
        let canonical = root.canonicalize().map_err(|e| {
            StorageError::Config(format!(
                "uploads root {} is not accessible: {e}",
                root.display()
            ))
        })?;
        if !canonical.is_dir() {
            return Err(StorageError::Config(format!(
                "uploads root {} is not a directory",
                root.display()
            )));
        }
        Ok(Self { root: canonical })
    }

    /// Canonical uploads root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a requested filename to a path of an existing regular file
    /// under the root.
    ///
    /// This is the async wrapper around [`PathResolver::resolve`] that moves
    /// the blocking `canonicalize` call onto the blocking pool.
    pub async fn resolve_async(&self, requested: &str) -> StorageResult<PathBuf> {
        let resolver = self.clone();
        let requested = requested.to_string();
        tokio::task::spawn_blocking(move || resolver.resolve(&requested))
            .await
            .map_err(|e| {
                StorageError::Io(std::io::Error::other(format!("spawn_blocking failed: {e}")))
            })?
    }

    /// Resolve a requested filename synchronously.
    ///
    /// Symlinks are followed and then re-checked, so a link inside the root
    /// pointing outside of it is rejected as an invalid name.
    pub fn resolve(&self, requested: &str) -> StorageResult<PathBuf> {
        let name = validate_name(requested)?;
        let candidate = self.root.join(name);

        let canonical = match candidate.canonicalize() {
            Ok(path) => path,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // Dangling symlinks land here too.
                return Err(StorageError::NotFound(name.to_string()));
            }
            Err(e) => return Err(StorageError::Io(e)),
        };

        if !canonical.starts_with(&self.root) {
            return Err(StorageError::InvalidName(format!(
                "resolved path escapes uploads root: {name:?}"
            )));
        }

        if !canonical.is_file() {
            return Err(StorageError::NotFound(name.to_string()));
        }

        Ok(canonical)
    }
}
