//! Storage error types.

use thiserror::Error;

/// Storage operation errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The requested filename failed path validation.
    #[error("invalid file name: {0}")]
    InvalidName(String),

    #[error("document not found: {0}")]
    NotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The source could not be parsed or has no pages.
    #[error("derivation failed: {0}")]
    Derivation(String),

    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = std::result::Result<T, StorageError>;
