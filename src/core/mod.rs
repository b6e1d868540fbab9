//! # Core Module
//!
//! The front-end agnostic replication engine.
//!
//! ## Modules
//! - `scanner` - Selects candidate photos in the source tree
//! - `metadata` - Reads capture times from EXIF
//! - `hasher` - Content digests used to verify copies
//! - `manifest` - Plans the destination of every candidate
//! - `replicator` - Copies and verifies with a worker pool
//! - `progress` - Aggregates results and reports throughput
//! - `pipeline` - Orchestrates the full workflow

pub mod hasher;
pub mod manifest;
pub mod metadata;
pub mod pipeline;
pub mod progress;
pub mod replicator;
pub mod scanner;

// Re-export commonly used types
pub use hasher::{ContentDigest, DigestAlgorithm};
pub use manifest::{Manifest, ManifestEntry, SkipReason};
pub use pipeline::{Pipeline, PipelineResult};
pub use progress::ProgressSnapshot;
pub use replicator::{ReplicateConfig, RunSummary};
pub use scanner::FileSelection;
