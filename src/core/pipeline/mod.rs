//! # Pipeline Module
//!
//! Orchestrates a full replication run.
//!
//! ## Pipeline Stages
//! 1. **Scan** - Select candidate photos under the source root
//! 2. **Plan** - Read capture times, hash, and build the manifest
//! 3. **Replicate** - Copy and verify with the worker pool
//!
//! ## Parallelism
//! Planning uses rayon; replication uses its own bounded worker pool.

mod executor;

pub use executor::{Pipeline, PipelineBuilder, PipelineConfig, PipelineResult};
