//! Event type definitions for progress reporting.

use crate::core::manifest::SkipReason;
use crate::core::progress::ProgressSnapshot;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// All events emitted while organizing a photo tree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    /// Source tree traversal
    Scan(ScanEvent),
    /// Manifest building (timestamp extraction and hashing)
    Manifest(ManifestEvent),
    /// Copy and verify
    Replicate(ReplicateEvent),
    /// Pipeline-level events
    Pipeline(PipelineEvent),
}

/// Events during source traversal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ScanEvent {
    Started { root: PathBuf },
    Completed { total_files: usize },
}

/// Events during manifest building
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ManifestEvent {
    Started { total_candidates: usize },
    Progress(ManifestProgress),
    /// A candidate was deliberately left out of the manifest
    Skipped { source: PathBuf, reason: SkipReason },
    Completed {
        queued: usize,
        skipped: usize,
        total_bytes: u64,
    },
}

/// Progress while inspecting candidates
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestProgress {
    /// Candidates inspected so far
    pub inspected: usize,
    /// Total candidates
    pub total: usize,
    /// File just inspected
    pub current_path: PathBuf,
}

/// Events from the replication engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ReplicateEvent {
    Started { total_files: usize, total_bytes: u64 },
    /// Periodic throughput report
    Progress(ProgressSnapshot),
    /// One entry failed; the run continues
    EntryFailed { source: PathBuf, message: String },
    Completed {
        completed: usize,
        failed: usize,
        bytes_copied: u64,
        duration_ms: u64,
    },
}

/// Pipeline-level events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PipelineEvent {
    Started,
    PhaseChanged { phase: PipelinePhase },
    Completed,
    Error { message: String },
}

/// Phases of the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelinePhase {
    Scanning,
    Planning,
    Replicating,
}

impl std::fmt::Display for PipelinePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelinePhase::Scanning => write!(f, "Scanning"),
            PipelinePhase::Planning => write!(f, "Planning"),
            PipelinePhase::Replicating => write!(f, "Replicating"),
        }
    }
}
