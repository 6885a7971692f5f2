//! Data models for the advisor core service.
//!
//! Field names follow the bridge service's snake_case wire format.

mod document;
mod qa;
mod stats;
mod sync;

pub use document::*;
pub use qa::*;
pub use stats::*;
pub use sync::*;
