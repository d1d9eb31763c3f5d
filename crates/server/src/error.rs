//! API error types.
//!
//! Client-facing messages never carry internal detail. Token failures share
//! one message whatever the cause, and server-side failures are logged here
//! and answered with a generic body.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use folio_storage::StorageError;
use serde::Serialize;

/// API error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

/// API error type.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("missing token")]
    MissingToken,

    #[error("invalid or expired token")]
    TokenInvalid,

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl ApiError {
    /// Get the error code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingToken => "bad_request",
            Self::TokenInvalid | Self::Forbidden(_) => "forbidden",
            Self::NotFound(_) => "not_found",
            Self::Internal(_) => "internal_error",
            Self::Storage(e) => match e {
                StorageError::InvalidName(_) => "invalid_name",
                StorageError::NotFound(_) => "not_found",
                StorageError::Derivation(_) => "derivation_failed",
                StorageError::Io(_) | StorageError::Config(_) => "internal_error",
            },
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingToken => StatusCode::BAD_REQUEST,
            Self::TokenInvalid | Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Storage(e) => match e {
                StorageError::InvalidName(_) => StatusCode::BAD_REQUEST,
                StorageError::NotFound(_) => StatusCode::NOT_FOUND,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    /// Message safe to show a client.
    pub fn public_message(&self) -> String {
        match self {
            Self::MissingToken => "token parameter is required".to_string(),
            Self::TokenInvalid => self.to_string(),
            Self::Forbidden(msg) | Self::NotFound(msg) => msg.clone(),
            Self::Internal(_) => "internal server error".to_string(),
            Self::Storage(e) => match e {
                StorageError::InvalidName(_) => "invalid file name".to_string(),
                StorageError::NotFound(_) => "document not found".to_string(),
                _ => "internal server error".to_string(),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, code = self.code(), "Request failed");
        } else {
            tracing::debug!(error = %self, code = self.code(), "Request rejected");
        }

        let body = ErrorResponse {
            code: self.code().to_string(),
            message: self.public_message(),
        };
        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers.
pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError::MissingToken.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::TokenInvalid.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            ApiError::from(StorageError::InvalidName("../x".into())).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(StorageError::NotFound("x".into())).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(StorageError::Derivation("no pages".into())).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_public_message_hides_detail() {
        let err = ApiError::from(StorageError::Derivation("xref table corrupt at 1234".into()));
        assert!(!err.public_message().contains("xref"));

        let err = ApiError::from(StorageError::InvalidName("../../etc/passwd".into()));
        assert!(!err.public_message().contains("passwd"));

        let err = ApiError::Internal("lock poisoned".into());
        assert!(!err.public_message().contains("poisoned"));
    }
}
