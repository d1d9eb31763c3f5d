//! Access gateway: token redemption and obfuscated document delivery.

use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::state::AppState;
use axum::Extension;
use axum::extract::{Query, State};
use axum::http::header::{
    CACHE_CONTROL, CONTENT_DISPOSITION, CONTENT_TYPE, EXPIRES, HeaderName, PRAGMA,
    X_CONTENT_TYPE_OPTIONS,
};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use folio_core::{Entitlement, Subject, TokenId, codec};
use folio_storage::{CacheStatus, StorageError};
use serde::Deserialize;

/// Header telling the viewer which variant it received.
pub static X_FOLIO_ENTITLEMENT: HeaderName = HeaderName::from_static("x-folio-entitlement");

/// Query parameters for the content endpoint.
#[derive(Debug, Deserialize)]
pub struct ContentQuery {
    pub token: Option<String>,
}

/// GET /v1/documents/content?token=...
///
/// Redeems the token for the requesting subject, fetches the variant its
/// entitlement allows, and returns the bytes run through the codec with the
/// token's secret. Every token failure is the same 403.
pub async fn get_document_content(
    State(state): State<AppState>,
    Extension(subject): Extension<Subject>,
    Query(query): Query<ContentQuery>,
) -> ApiResult<Response> {
    let raw = query
        .token
        .filter(|t| !t.is_empty())
        .ok_or(ApiError::MissingToken)?;

    let token = TokenId::parse(&raw).map_err(|_| {
        metrics::record_token_rejected("malformed");
        ApiError::TokenInvalid
    })?;

    let redeemed = state.tokens.redeem_checked(&token, subject.id);
    state.record_active_tokens();
    let record = redeemed.map_err(|e| {
        metrics::record_token_rejected(e.reason());
        tracing::debug!(token = token.log_prefix(), reason = e.reason(), "Token rejected");
        ApiError::TokenInvalid
    })?;
    metrics::TOKENS_REDEEMED.inc();

    let timer = metrics::DOCUMENT_FETCH_DURATION
        .with_label_values(&[record.entitlement.as_str()])
        .start_timer();
    let fetched = state
        .documents
        .fetch(&record.filename, record.entitlement)
        .await
        .inspect_err(|e| {
            if matches!(e, StorageError::Derivation(_)) {
                metrics::DERIVATIONS_FAILED.inc();
            }
        })?;
    timer.observe_duration();

    match fetched.cache {
        Some(CacheStatus::Hit) => metrics::DERIVATIVE_CACHE_HITS.inc(),
        Some(CacheStatus::Miss) => metrics::DERIVATIVE_CACHE_MISSES.inc(),
        None => {}
    }

    let mut body = fetched.bytes.to_vec();
    codec::transform_in_place(&mut body, record.secret.as_bytes());
    metrics::BYTES_SERVED.inc_by(body.len() as u64);

    tracing::info!(
        filename = %record.filename,
        entitlement = %record.entitlement,
        size = body.len(),
        "Served obfuscated document"
    );

    Ok(obfuscated_response(body, record.entitlement))
}

/// Wrap codec output in headers that disable caching and sniffing and
/// declare a generic binary type.
fn obfuscated_response(body: Vec<u8>, entitlement: Entitlement) -> Response {
    (
        StatusCode::OK,
        [
            (CONTENT_TYPE, "application/octet-stream"),
            (CACHE_CONTROL, "no-store, no-cache, must-revalidate, private"),
            (PRAGMA, "no-cache"),
            (EXPIRES, "0"),
            (X_CONTENT_TYPE_OPTIONS, "nosniff"),
            (CONTENT_DISPOSITION, "attachment; filename=\"blob.bin\""),
            (X_FOLIO_ENTITLEMENT.clone(), entitlement.as_str()),
        ],
        body,
    )
        .into_response()
}
