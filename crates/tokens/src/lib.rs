//! Capability token store for folio.
//!
//! A token binds a subject, a document, an entitlement and a per-token codec
//! secret. Tokens are redeemable once and only within their time-to-live;
//! abandoned tokens are reclaimed by a periodic sweep.

pub mod error;
pub mod record;
pub mod store;

pub use error::{TokenError, TokenResult};
pub use record::{IssuedToken, TokenRecord};
pub use store::TokenStore;
