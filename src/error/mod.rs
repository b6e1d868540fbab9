//! # Error Module
//!
//! Error types for the photo replicator.
//!
//! ## Design Principles
//! - **Never panic** on user data - return errors instead
//! - **Include context** - paths, sizes, digests
//! - **Fatal vs per-entry** - `ReplicatorError` stops a run, `CopyError`
//!   is recorded against a single entry and the run carries on

use std::path::PathBuf;
use thiserror::Error;

/// Top-level application error. Any of these aborts the run.
#[derive(Error, Debug)]
pub enum ReplicatorError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Scanning error: {0}")]
    Scan(#[from] ScanError),

    #[error("Metadata error: {0}")]
    Metadata(#[from] MetadataError),

    #[error("Hashing error: {0}")]
    Hash(#[from] HashError),

    #[error("Manifest error: {0}")]
    Manifest(#[from] ManifestError),
}

/// Problems with the run configuration itself
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("source directory is required")]
    MissingSource,

    #[error("destination directory is required")]
    MissingDestination,

    #[error("worker count must be at least 1 (got {value})")]
    InvalidWorkers { value: usize },

    #[error("{name} interval must be greater than zero")]
    InvalidInterval { name: &'static str },

    #[error("failed to create destination directory {path}: {source}")]
    DestinationCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors while walking the source tree
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    #[error("Failed to walk directory {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

/// Errors while reading a photo's capture time
#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode EXIF in {path}: {reason}")]
    NoExif { path: PathBuf, reason: String },

    #[error("failed to extract date taken in {path}")]
    NoCaptureTime { path: PathBuf },
}

/// Errors while computing a content digest
#[derive(Error, Debug)]
pub enum HashError {
    #[error("failed to hash {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors while planning destinations
#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("{first} and {second} both map to {destination}")]
    DestinationCollision {
        destination: PathBuf,
        first: PathBuf,
        second: PathBuf,
    },
}

/// Failure of a single copy. Recorded in the run summary, never fatal.
#[derive(Error, Debug)]
pub enum CopyError {
    #[error("path exists and overwrite is not set: {path}")]
    AlreadyExists { path: PathBuf },

    #[error("failed to create dir {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to copy {source_path} -> {dest_path}: {source}")]
    CopyIo {
        source_path: PathBuf,
        dest_path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("bytes don't match {source_path} [{expected}] -> {dest_path} [{actual}]")]
    SizeMismatch {
        source_path: PathBuf,
        dest_path: PathBuf,
        expected: u64,
        actual: u64,
    },

    #[error("hash mismatch after copy {source_path} [{expected}] -> {dest_path} [{actual}]")]
    HashMismatch {
        source_path: PathBuf,
        dest_path: PathBuf,
        expected: String,
        actual: String,
    },

    #[error("failed to verify {path}: {source}")]
    Verify {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to set times on {path}: {source}")]
    SetTimes {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CopyError {
    /// Short machine-friendly label for summaries
    pub fn kind(&self) -> &'static str {
        match self {
            CopyError::AlreadyExists { .. } => "already_exists",
            CopyError::CreateDir { .. } => "create_dir",
            CopyError::Open { .. } => "open",
            CopyError::CopyIo { .. } => "copy_io",
            CopyError::SizeMismatch { .. } => "size_mismatch",
            CopyError::HashMismatch { .. } => "hash_mismatch",
            CopyError::Verify { .. } => "verify",
            CopyError::SetTimes { .. } => "set_times",
        }
    }

    /// True when a destination was written but cannot be trusted to match the source
    pub fn is_integrity_failure(&self) -> bool {
        matches!(
            self,
            CopyError::CopyIo { .. }
                | CopyError::SizeMismatch { .. }
                | CopyError::HashMismatch { .. }
                | CopyError::Verify { .. }
        )
    }
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, ReplicatorError>;
