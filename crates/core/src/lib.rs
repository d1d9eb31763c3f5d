//! Core domain types and shared logic for folio.
//!
//! This crate defines the data model used across all other crates:
//! - Subjects and the anonymous sentinel
//! - Capability token ids, per-token secrets, and entitlements
//! - The keyed byte obfuscation codec
//! - Configuration types
//! - Background sweeper tasks for time-bounded stores

pub mod codec;
pub mod config;
pub mod error;
pub mod subject;
pub mod sweep;
pub mod token;

pub use error::{Error, Result};
pub use subject::{Subject, SubjectId};
pub use sweep::{Sweep, SweepHandle, spawn_sweeper};
pub use token::{Entitlement, TokenId, TokenSecret};
