//! Manifest building.
//!
//! Turns candidate photos into an ordered list of copies keyed by capture
//! date, hashing every source before anything is copied.

mod builder;
mod types;

pub use builder::ManifestBuilder;
pub use types::*;
