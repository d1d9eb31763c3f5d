//! Route configuration.

use crate::auth::session_middleware;
use crate::guard::direct_access_gate;
use crate::handlers;
use crate::metrics::{metrics_handler, register_metrics};
use crate::state::AppState;
use axum::Router;
use axum::middleware;
use axum::routing::get;
use tower_http::trace::TraceLayer;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        // Health check (unauthenticated for load balancers/k8s probes)
        .route("/v1/health", get(handlers::health_check))
        // Access gateway
        .route(
            "/v1/documents/content",
            get(handlers::get_document_content),
        )
        // Render step; the only place a token secret is emitted
        .route("/view/{filename}", get(handlers::view_document));

    // Raw uploads, gated so protected documents go through the gateway.
    let file_routes = Router::new()
        .route("/files/{filename}", get(handlers::get_file))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            direct_access_gate,
        ));

    let mut router = Router::new().merge(api_routes).merge(file_routes);

    // SECURITY: When enabled, this endpoint MUST be network-restricted
    // to authorized Prometheus scraper IPs only.
    if state.config.server.metrics_enabled {
        register_metrics();
        router = router.route("/metrics", get(metrics_handler));
    }

    // Order of execution: TraceLayer -> Session -> (Gate) -> Handler
    router
        .layer(middleware::from_fn_with_state(
            state.clone(),
            session_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
