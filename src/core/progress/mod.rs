//! # Progress Module
//!
//! Turns the stream of copy results into periodic throughput reports.
//!
//! `RunStatistics` is owned by a single aggregator thread: workers never
//! touch it, they only send `CopyResult`s down a channel.

mod reporter;
mod stats;

pub use reporter::{Aggregate, ProgressReporter};
pub use stats::{format_duration, ProgressSnapshot, RunStatistics};
