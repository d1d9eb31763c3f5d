//! Viewer render step.
//!
//! Issues a token for the requesting subject and embeds it, with its secret,
//! in a server-rendered page. No other endpoint returns a secret.

use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::state::AppState;
use crate::templates::{ViewerPage, render_viewer};
use axum::Extension;
use axum::extract::{Path, State};
use axum::http::header::{CACHE_CONTROL, X_CONTENT_TYPE_OPTIONS};
use axum::response::{Html, IntoResponse, Response};
use folio_core::{Entitlement, Subject};
use folio_storage::validate_name;

/// Path of the gateway endpoint the viewer fetches from.
pub const CONTENT_PATH: &str = "/v1/documents/content";

/// GET /view/{filename}
pub async fn view_document(
    State(state): State<AppState>,
    Extension(subject): Extension<Subject>,
    Path(filename): Path<String>,
) -> ApiResult<Response> {
    let name = validate_name(&filename)?;
    if !state.documents.exists(name).await? {
        return Err(ApiError::NotFound("document not found".to_string()));
    }

    let entitled = state.entitlements.is_entitled(&subject, name);
    let issued = state.tokens.issue(subject.id, name, entitled);
    metrics::TOKENS_ISSUED.inc();
    state.record_active_tokens();

    let secret = state
        .tokens
        .peek_secret(&issued.token)
        .ok_or_else(|| ApiError::Internal("token vanished before render".to_string()))?;

    let html = render_viewer(&ViewerPage {
        filename: name,
        token: issued.token.as_str(),
        secret: &secret,
        entitlement: Entitlement::from_flag(entitled).as_str(),
        content_url: CONTENT_PATH,
    });

    tracing::info!(filename = name, entitled, "Rendered viewer page");

    Ok((
        [(CACHE_CONTROL, "no-store"), (X_CONTENT_TYPE_OPTIONS, "nosniff")],
        Html(html),
    )
        .into_response())
}
