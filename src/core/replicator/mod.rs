//! # Replicator Module
//!
//! Copies manifest entries with a fixed pool of worker threads and verifies
//! every copy against the digest taken while planning.
//!
//! ## Execution model
//! - one dispatcher (the calling thread) fills a bounded work queue
//! - `workers` threads drain it, one `CopyResult` per entry
//! - one aggregator thread consumes results and reports progress
//!
//! A failing entry never stops the run. The run's `Result` only fails on
//! bad configuration; per-entry failures are in the returned `RunSummary`.

mod engine;
mod types;
mod worker;

pub use engine::{queue_capacity, Replicator};
pub use types::*;
pub use worker::replicate_one;
