//! Token store error types.
//!
//! Rejection reasons are for logs and metrics only. Callers facing a client
//! must collapse them into one indistinguishable response.

use thiserror::Error;

/// Token store errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("unknown token")]
    Unknown,

    #[error("token was issued to a different subject")]
    SubjectMismatch,

    #[error("token expired")]
    Expired,

    #[error("configuration error: {0}")]
    Config(String),
}

impl TokenError {
    /// Short label for metrics and log fields.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::SubjectMismatch => "subject_mismatch",
            Self::Expired => "expired",
            Self::Config(_) => "config",
        }
    }
}

/// Result type for token store operations.
pub type TokenResult<T> = std::result::Result<T, TokenError>;
