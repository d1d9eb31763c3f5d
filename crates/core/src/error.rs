//! Error types for the core domain.

use thiserror::Error;

/// Core domain error type.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid subject id: {0}")]
    InvalidSubject(String),

    #[error("invalid token: {0}")]
    InvalidToken(String),

    #[error("invalid secret: {0}")]
    InvalidSecret(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;
