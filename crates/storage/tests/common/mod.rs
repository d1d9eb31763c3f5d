pub mod fixtures;
pub mod mocks;

#[allow(unused_imports)]
pub use fixtures::{build_pdf, page_texts};
#[allow(unused_imports)]
pub use mocks::InstrumentedSource;
