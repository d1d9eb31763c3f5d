//! Direct-access gate for protected uploads.
//!
//! Uploaded files are also reachable by name under `/files/`. Protected
//! documents must go through the token gateway instead, so this middleware
//! rejects direct requests for them unless the subject holds the elevated
//! role. The gate never consults the token store.

use crate::auth::get_subject;
use crate::error::ApiError;
use crate::metrics;
use crate::state::AppState;
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use folio_core::Subject;
use percent_encoding::percent_decode_str;

/// Whether `path` names a protected document, before or after
/// percent-decoding.
fn targets_protected(state: &AppState, path: &str) -> bool {
    let uploads = &state.config.uploads;
    if uploads.is_protected(path) {
        return true;
    }
    let decoded = percent_decode_str(path).decode_utf8_lossy();
    uploads.is_protected(&decoded)
}

/// Whether `subject` may read the document `name` without a token.
pub(crate) fn may_read_directly(state: &AppState, subject: &Subject, name: &str) -> bool {
    !state.config.uploads.is_protected(name)
        || subject.has_role(&state.config.session.elevated_role)
}

/// Count and log a refused direct read, returning the error to send.
pub(crate) fn deny_direct_access(path: &str) -> ApiError {
    metrics::DIRECT_ACCESS_DENIED.inc();
    tracing::info!(path, "Direct access to protected document denied");
    ApiError::Forbidden("direct access to this document is not allowed".to_string())
}

/// Reject direct requests for protected documents from non-elevated subjects.
pub async fn direct_access_gate(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    let path = req.uri().path();
    if targets_protected(&state, path) {
        let subject = get_subject(&req);
        if !subject.has_role(&state.config.session.elevated_role) {
            return deny_direct_access(path).into_response();
        }
        tracing::debug!(path, "Direct access to protected document by elevated subject");
    }

    next.run(req).await
}
