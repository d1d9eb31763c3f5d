//! HTTP access gateway for protected PDF documents.
//!
//! This crate provides the HTTP surface:
//! - The viewer render step that issues capability tokens
//! - The token-redeeming content gateway with byte obfuscation
//! - The direct-access gate in front of raw uploads
//! - Health and Prometheus metrics endpoints

pub mod auth;
pub mod entitlement;
pub mod error;
pub mod guard;
pub mod handlers;
pub mod metrics;
pub mod routes;
pub mod state;
pub mod templates;

pub use auth::TraceId;
pub use entitlement::{ConfigEntitlements, EntitlementResolver};
pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
