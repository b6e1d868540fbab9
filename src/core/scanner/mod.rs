//! # Scanner Module
//!
//! Selects candidate photos from the source tree.
//!
//! ## Selection
//! - JPEG (.jpg, .jpeg) by default
//! - camera raw (.cr2, .nef, .arw, .dng, ...) or both on request
//! - optional include / exclude substrings on the file name
//!
//! Files are returned in lexical traversal order. A traversal failure aborts
//! the scan: a partially walked tree would silently leave photos behind.

mod filter;
mod walker;

pub use filter::PhotoFilter;
pub use walker::{ScanConfig, WalkDirScanner};

use crate::error::ScanError;
use crate::events::EventSender;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Which kinds of photo to pick up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileSelection {
    /// JPEG files only
    #[default]
    Jpeg,
    /// Camera raw files only
    Raw,
    /// JPEG and camera raw
    Both,
}

/// Trait for candidate selection.
///
/// Implement this trait to feed the manifest builder from somewhere other
/// than a directory walk.
pub trait PhotoScanner: Send + Sync {
    /// Walk `root` and return every selected file
    fn scan(&self, root: &Path) -> Result<Vec<PathBuf>, ScanError>;

    /// Same as `scan`, reporting start and completion through `events`
    fn scan_with_events(&self, root: &Path, events: &EventSender) -> Result<Vec<PathBuf>, ScanError>;
}
