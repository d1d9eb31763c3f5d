//! Prometheus metrics for the folio server.
//!
//! Exposes counters for token issue/redeem/reject, the derivative cache,
//! the direct-access gate, and document fetch latency.
//!
//! # Security Note
//!
//! The `/metrics` endpoint is unauthenticated to allow Prometheus scraping.
//! Metrics carry no filenames, subjects, or token material, but they do expose
//! aggregate usage. Restrict the endpoint to scraper IPs at the network level.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts,
    Registry, TextEncoder,
};
use std::sync::{LazyLock, Once};

/// Global Prometheus registry for all metrics.
pub static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

// Token metrics
pub static TOKENS_ISSUED: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "folio_tokens_issued_total",
        "Total number of capability tokens issued",
    )
    .expect("metric creation failed")
});

pub static TOKENS_REDEEMED: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "folio_tokens_redeemed_total",
        "Total number of capability tokens successfully redeemed",
    )
    .expect("metric creation failed")
});

pub static TOKENS_REJECTED: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "folio_tokens_rejected_total",
            "Total token redemptions rejected, by reason",
        ),
        &["reason"],
    )
    .expect("metric creation failed")
});

pub static TOKENS_SWEPT: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "folio_tokens_swept_total",
        "Total number of expired tokens removed by the sweeper",
    )
    .expect("metric creation failed")
});

pub static ACTIVE_TOKENS: LazyLock<IntGauge> = LazyLock::new(|| {
    IntGauge::new(
        "folio_active_tokens",
        "Current number of outstanding capability tokens",
    )
    .expect("metric creation failed")
});

// Derivative cache metrics
pub static DERIVATIVE_CACHE_HITS: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "folio_derivative_cache_hits_total",
        "Total first-page requests served from the derivative cache",
    )
    .expect("metric creation failed")
});

pub static DERIVATIVE_CACHE_MISSES: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "folio_derivative_cache_misses_total",
        "Total first-page requests that derived a new page",
    )
    .expect("metric creation failed")
});

pub static DERIVATIONS_FAILED: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "folio_derivations_failed_total",
        "Total first-page derivations that failed",
    )
    .expect("metric creation failed")
});

pub static DERIVATIVES_EVICTED: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "folio_derivatives_evicted_total",
        "Total stale derivatives removed by the sweeper",
    )
    .expect("metric creation failed")
});

// Gateway metrics
pub static DIRECT_ACCESS_DENIED: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "folio_direct_access_denied_total",
        "Total direct requests for protected files rejected by the gate",
    )
    .expect("metric creation failed")
});

pub static BYTES_SERVED: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "folio_bytes_served_total",
        "Total obfuscated document bytes served by the gateway",
    )
    .expect("metric creation failed")
});

pub static DOCUMENT_FETCH_DURATION: LazyLock<HistogramVec> = LazyLock::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "folio_document_fetch_duration_seconds",
            "Time to fetch a document variant, by entitlement",
        )
        .buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5]),
        &["entitlement"],
    )
    .expect("metric creation failed")
});

/// Guard to ensure metrics are only registered once.
static REGISTER_ONCE: Once = Once::new();

/// Register all metrics with the global registry.
///
/// This function is idempotent - subsequent calls after the first are no-ops.
pub fn register_metrics() {
    REGISTER_ONCE.call_once(|| {
        REGISTRY
            .register(Box::new(TOKENS_ISSUED.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(TOKENS_REDEEMED.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(TOKENS_REJECTED.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(TOKENS_SWEPT.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(ACTIVE_TOKENS.clone()))
            .expect("metric registration failed");

        REGISTRY
            .register(Box::new(DERIVATIVE_CACHE_HITS.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(DERIVATIVE_CACHE_MISSES.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(DERIVATIONS_FAILED.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(DERIVATIVES_EVICTED.clone()))
            .expect("metric registration failed");

        REGISTRY
            .register(Box::new(DIRECT_ACCESS_DENIED.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(BYTES_SERVED.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(DOCUMENT_FETCH_DURATION.clone()))
            .expect("metric registration failed");
    });
}

/// GET /metrics - Prometheus metrics endpoint.
pub async fn metrics_handler() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();

    let mut buffer = Vec::new();
    match encoder.encode(&metric_families, &mut buffer) {
        Ok(()) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            buffer,
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            [("content-type", "text/plain; charset=utf-8")],
            format!("Failed to encode metrics: {e}").into_bytes(),
        ),
    }
}

/// Record a rejected token redemption.
pub fn record_token_rejected(reason: &str) {
    TOKENS_REJECTED.with_label_values(&[reason]).inc();
}
