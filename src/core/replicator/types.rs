//! Types for the replicator module.

use crate::core::hasher::DigestAlgorithm;
use crate::error::CopyError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use uuid::Uuid;

/// Configuration for the replication engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplicateConfig {
    /// Number of copy workers
    pub workers: usize,
    /// Replace destination files that already exist
    pub overwrite: bool,
    /// Remove a destination that failed verification
    pub cleanup_on_error: bool,
    /// Report success without touching the filesystem
    pub dry_run: bool,
    /// In dry runs, sleep 0-2s per entry to mimic real work
    pub dry_run_delay: bool,
    /// Stamp the copy with the capture time
    pub preserve_times: bool,
    /// Digest used to verify copies; must match the manifest's
    pub digest: DigestAlgorithm,
    /// Interval between progress lines
    pub tick: Duration,
    /// Interval between rate recalculations
    pub update: Duration,
}

impl Default for ReplicateConfig {
    fn default() -> Self {
        Self {
            workers: 3,
            overwrite: false,
            cleanup_on_error: false,
            dry_run: false,
            dry_run_delay: true,
            preserve_times: true,
            digest: DigestAlgorithm::default(),
            tick: Duration::from_secs(1),
            update: Duration::from_secs(1),
        }
    }
}

/// Outcome of one worker handling one entry
#[derive(Debug)]
pub struct CopyResult {
    pub source_path: PathBuf,
    pub bytes_copied: u64,
    /// `None` on success
    pub error: Option<CopyError>,
}

/// A failed entry, as kept in the run summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedEntry {
    pub source: PathBuf,
    pub kind: String,
    pub message: String,
}

/// Result of a replication run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub total_files: usize,
    /// Entries that reported back, successful or not
    pub processed: usize,
    pub failed: usize,
    pub bytes_planned: u64,
    pub bytes_copied: u64,
    pub elapsed: Duration,
    pub dry_run: bool,
    pub failures: Vec<FailedEntry>,
}

impl RunSummary {
    pub fn succeeded(&self) -> usize {
        self.processed - self.failed
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}
