//! Document storage for folio.
//!
//! This crate provides:
//! - Traversal-safe resolution of request filenames under the uploads root
//! - The [`DocumentSource`] seam and its filesystem implementation
//! - First-page PDF derivation
//! - The [`DocumentStore`] with its time-bounded derivative cache

pub mod derive;
pub mod document;
pub mod error;
pub mod resolver;
pub mod source;

pub use document::{CacheStatus, DocumentStore, Fetched};
pub use error::{StorageError, StorageResult};
pub use resolver::{PathResolver, validate_name};
pub use source::{DocumentSource, FilesystemSource};

use folio_core::config::{DerivativeConfig, UploadsConfig};
use std::sync::Arc;

/// Create a document store from configuration.
pub fn from_config(
    uploads: &UploadsConfig,
    derivatives: &DerivativeConfig,
) -> StorageResult<DocumentStore> {
    derivatives.validate().map_err(StorageError::Config)?;

    let source = FilesystemSource::new(&uploads.root)?;
    tracing::info!(root = %source.resolver().root().display(), "Serving documents from uploads root");
    Ok(DocumentStore::new(Arc::new(source), derivatives.freshness()))
}
