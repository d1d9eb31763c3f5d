//! Raw uploaded files by name.
//!
//! Sits behind [`direct_access_gate`](crate::guard::direct_access_gate), so
//! protected documents only reach elevated subjects here. The gate sees only
//! the request path, so the handler repeats the check against the name the
//! file resolves to when that differs.

use crate::error::ApiResult;
use crate::guard::{deny_direct_access, may_read_directly};
use crate::state::AppState;
use axum::Extension;
use axum::extract::{Path, State};
use axum::http::header::{CONTENT_TYPE, X_CONTENT_TYPE_OPTIONS};
use axum::response::{IntoResponse, Response};
use folio_core::Subject;

fn content_type_for(filename: &str) -> &'static str {
    match filename.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase()) {
        Some(ext) if ext == "pdf" => "application/pdf",
        Some(ext) if ext == "txt" => "text/plain; charset=utf-8",
        Some(ext) if ext == "png" => "image/png",
        Some(ext) if ext == "jpg" || ext == "jpeg" => "image/jpeg",
        _ => "application/octet-stream",
    }
}

/// GET /files/{filename}
pub async fn get_file(
    State(state): State<AppState>,
    Extension(subject): Extension<Subject>,
    Path(filename): Path<String>,
) -> ApiResult<Response> {
    let resolved = state.documents.resolved_name(&filename).await?;
    if resolved != filename && !may_read_directly(&state, &subject, &resolved) {
        tracing::debug!(requested = %filename, resolved = %resolved, "Alias resolves to protected document");
        return Err(deny_direct_access(&filename));
    }

    let bytes = state.documents.get_full(&filename).await?;
    Ok((
        [
            (CONTENT_TYPE, content_type_for(&filename)),
            (X_CONTENT_TYPE_OPTIONS, "nosniff"),
        ],
        bytes,
    )
        .into_response())
}
