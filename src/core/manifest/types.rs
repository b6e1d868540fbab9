//! Types for the manifest module.

use crate::core::hasher::DigestAlgorithm;
use chrono::{Datelike, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// One planned copy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Existing, readable source file
    pub source_path: PathBuf,
    /// Where the copy goes: `dest_root/YYYY/MM/<name>`
    pub dest_path: PathBuf,
    /// Digest of the source taken while planning
    pub content_hash: String,
    /// Source size taken while planning
    pub byte_count: u64,
    /// When the photo was taken
    pub capture_time: NaiveDateTime,
}

/// Why a candidate was left out of the manifest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The destination is already there and overwrite is off
    DestinationExists,
    /// No usable capture time (only with `MetadataPolicy::Skip`)
    MissingMetadata,
    /// Another candidate with identical content maps to the same destination
    DuplicateContent,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::DestinationExists => write!(f, "destination exists"),
            SkipReason::MissingMetadata => write!(f, "missing metadata"),
            SkipReason::DuplicateContent => write!(f, "duplicate content"),
        }
    }
}

/// A candidate deliberately not queued
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedEntry {
    pub source: PathBuf,
    /// Planned destination, when one could be derived
    pub destination: Option<PathBuf>,
    pub reason: SkipReason,
    pub detail: Option<String>,
}

/// What to do with a photo that has no capture time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetadataPolicy {
    /// Stop the whole run at the first such photo
    #[default]
    Abort,
    /// Leave the photo out and keep going
    Skip,
}

/// What to do when two photos map to the same destination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionPolicy {
    /// Give the later photo a name suffixed with its digest
    #[default]
    Disambiguate,
    /// Stop the run
    Fail,
}

/// Configuration for manifest building
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestConfig {
    pub dest_root: PathBuf,
    pub overwrite: bool,
    pub digest: DigestAlgorithm,
    pub on_missing_metadata: MetadataPolicy,
    pub on_collision: CollisionPolicy,
}

impl ManifestConfig {
    pub fn new(dest_root: impl Into<PathBuf>) -> Self {
        Self {
            dest_root: dest_root.into(),
            overwrite: false,
            digest: DigestAlgorithm::default(),
            on_missing_metadata: MetadataPolicy::default(),
            on_collision: CollisionPolicy::default(),
        }
    }
}

/// The ordered list of copies to perform, plus what was left out
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub id: Uuid,
    pub digest: DigestAlgorithm,
    /// In source traversal order
    pub entries: Vec<ManifestEntry>,
    pub skipped: Vec<SkippedEntry>,
}

impl Manifest {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of `byte_count` over all entries
    pub fn total_bytes(&self) -> u64 {
        self.entries.iter().map(|e| e.byte_count).sum()
    }

    /// Number of candidates skipped for `reason`
    pub fn skipped_for(&self, reason: SkipReason) -> usize {
        self.skipped.iter().filter(|s| s.reason == reason).count()
    }
}

/// `dest_root/YYYY/MM/<file name of source>`
pub fn destination_for(dest_root: &Path, capture_time: &NaiveDateTime, source: &Path) -> PathBuf {
    let name = source.file_name().unwrap_or(source.as_os_str());
    dest_root
        .join(format!("{:04}", capture_time.year()))
        .join(format!("{:02}", capture_time.month()))
        .join(name)
}
