//! Full and first-page document retrieval with a derivative cache.
//!
//! Restricted viewers receive a single-page copy of each document. Building
//! that copy means parsing the whole PDF, so the result is cached per
//! filename for a freshness window.
//!
//! # Concurrency
//!
//! The cache is best-effort. Two concurrent misses for the same filename
//! both derive the page and the last insert wins. Derivation depends only
//! on the source bytes, so either result is correct.

use crate::derive;
use crate::error::{StorageError, StorageResult};
use crate::resolver::validate_name;
use crate::source::DocumentSource;
use bytes::Bytes;
use dashmap::DashMap;
use folio_core::{Entitlement, Sweep};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::instrument;

/// Whether a derivative came from the cache.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CacheStatus {
    Hit,
    Miss,
}

/// Document bytes plus how they were produced.
#[derive(Clone, Debug)]
pub struct Fetched {
    /// Raw (not yet obfuscated) PDF bytes.
    pub bytes: Bytes,
    /// Cache status for previews; `None` for full documents.
    pub cache: Option<CacheStatus>,
}

struct CachedDerivative {
    bytes: Bytes,
    created_at: Instant,
}

/// Serves full documents and cached first-page derivatives.
pub struct DocumentStore {
    source: Arc<dyn DocumentSource>,
    derivatives: DashMap<String, CachedDerivative>,
    freshness: Duration,
}

impl DocumentStore {
    /// Create a store reading from `source`, reusing derivatives for
    /// `freshness`.
    pub fn new(source: Arc<dyn DocumentSource>, freshness: Duration) -> Self {
        Self {
            source,
            derivatives: DashMap::new(),
            freshness,
        }
    }

    /// Check that a document exists.
    pub async fn exists(&self, filename: &str) -> StorageResult<bool> {
        let name = validate_name(filename)?;
        self.source.exists(name).await
    }

    /// Name of the file a request name actually reads, after aliases are
    /// followed.
    pub async fn resolved_name(&self, filename: &str) -> StorageResult<String> {
        let name = validate_name(filename)?;
        self.source.resolved_name(name).await
    }

    /// Read the complete document.
    pub async fn get_full(&self, filename: &str) -> StorageResult<Bytes> {
        let name = validate_name(filename)?;
        self.source.load(name).await
    }

    /// Return the first page of the document as its own PDF.
    pub async fn get_first_page(&self, filename: &str) -> StorageResult<Bytes> {
        self.first_page_with_status(filename)
            .await
            .map(|(bytes, _)| bytes)
    }

    /// Fetch the variant a given entitlement allows.
    pub async fn fetch(&self, filename: &str, entitlement: Entitlement) -> StorageResult<Fetched> {
        match entitlement {
            Entitlement::Full => Ok(Fetched {
                bytes: self.get_full(filename).await?,
                cache: None,
            }),
            Entitlement::Preview => {
                let (bytes, status) = self.first_page_with_status(filename).await?;
                Ok(Fetched {
                    bytes,
                    cache: Some(status),
                })
            }
        }
    }

    #[instrument(skip(self))]
    async fn first_page_with_status(&self, filename: &str) -> StorageResult<(Bytes, CacheStatus)> {
        let name = validate_name(filename)?;

        if let Some(entry) = self.derivatives.get(name)
            && entry.created_at.elapsed() < self.freshness
        {
            tracing::debug!(filename = %name, "Derivative cache hit");
            return Ok((entry.bytes.clone(), CacheStatus::Hit));
        }

        let source = self.source.load(name).await?;
        let derived = tokio::task::spawn_blocking(move || derive::first_page(&source))
            .await
            .map_err(|e| StorageError::Derivation(format!("derivation task failed: {e}")))??;
        let derived = Bytes::from(derived);

        self.derivatives.insert(
            name.to_string(),
            CachedDerivative {
                bytes: derived.clone(),
                created_at: Instant::now(),
            },
        );
        tracing::debug!(filename = %name, size = derived.len(), "Derivative cached");

        Ok((derived, CacheStatus::Miss))
    }

    /// Drop any cached derivative for `filename`.
    pub fn invalidate(&self, filename: &str) -> bool {
        self.derivatives.remove(filename).is_some()
    }

    /// Number of cached derivatives, fresh or not.
    pub fn cached_len(&self) -> usize {
        self.derivatives.len()
    }
}

impl Sweep for DocumentStore {
    fn name(&self) -> &'static str {
        "derivatives"
    }

    fn sweep(&self) -> usize {
        let before = self.derivatives.len();
        self.derivatives
            .retain(|_, entry| entry.created_at.elapsed() < self.freshness);
        before.saturating_sub(self.derivatives.len())
    }
}
