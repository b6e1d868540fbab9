//! # Photo Replicator
//!
//! Copies photos into a `YYYY/MM` tree keyed by capture date and verifies
//! every copy.
//!
//! ## Core Philosophy
//! - **Never clobber** - existing destinations are left alone unless asked
//! - **Verify everything** - size and digest are checked after each copy
//! - **Keep going** - one bad file is recorded, the rest still copy
//!
//! ## Architecture
//! - `core` - The replication engine
//! - `events` - Event-driven progress reporting
//! - `error` - Error types
//! - `cli` - Command-line interface (binary only)

pub mod core;
pub mod error;
pub mod events;

// Re-export commonly used types at the crate root
pub use error::{ReplicatorError, Result};

/// Initialize tracing for the library
///
/// This should be called by the application entry point. `RUST_LOG`
/// overrides the default `info` level. Calling it twice is harmless.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
