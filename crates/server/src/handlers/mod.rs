//! HTTP request handlers.

pub mod documents;
pub mod files;
pub mod health;
pub mod viewer;

pub use documents::*;
pub use files::*;
pub use health::*;
pub use viewer::*;
