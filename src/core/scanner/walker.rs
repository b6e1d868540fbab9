//! Directory walking implementation using walkdir.

use super::{filter::PhotoFilter, FileSelection, PhotoScanner};
use crate::error::ScanError;
use crate::events::{Event, EventSender, ScanEvent};
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Configuration for the directory scanner
#[derive(Debug, Clone, Default)]
pub struct ScanConfig {
    /// Whether to follow symbolic links
    pub follow_symlinks: bool,
    /// Whether to include hidden files and directories
    pub include_hidden: bool,
    /// Which photo kinds to pick up
    pub selection: FileSelection,
    /// File name must contain this
    pub include: Option<String>,
    /// File name must not contain this
    pub exclude: Option<String>,
}

/// Scanner implementation using the walkdir crate
pub struct WalkDirScanner {
    config: ScanConfig,
    filter: PhotoFilter,
}

impl WalkDirScanner {
    /// Create a new scanner with the given configuration
    pub fn new(config: ScanConfig) -> Self {
        let filter = PhotoFilter::new(config.selection)
            .with_hidden(config.include_hidden)
            .with_include(config.include.clone())
            .with_exclude(config.exclude.clone());

        Self { config, filter }
    }

    fn is_hidden_dir(&self, root: &Path, entry: &walkdir::DirEntry) -> bool {
        !self.config.include_hidden
            && entry.file_type().is_dir()
            && entry.path() != root
            && entry
                .file_name()
                .to_str()
                .map(|n| n.starts_with('.'))
                .unwrap_or(false)
    }
}

impl PhotoScanner for WalkDirScanner {
    fn scan(&self, root: &Path) -> Result<Vec<PathBuf>, ScanError> {
        if !root.is_dir() {
            return Err(ScanError::DirectoryNotFound {
                path: root.to_path_buf(),
            });
        }

        let walker = WalkDir::new(root)
            .follow_links(self.config.follow_symlinks)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !self.is_hidden_dir(root, e));

        let mut files = Vec::new();
        for entry in walker {
            let entry = entry.map_err(|source| ScanError::Walk {
                path: root.to_path_buf(),
                source,
            })?;

            if entry.file_type().is_dir() {
                continue;
            }

            if !self.filter.should_include(entry.path()) {
                debug!(path = %entry.path().display(), "not selected");
                continue;
            }

            files.push(entry.into_path());
        }

        Ok(files)
    }

    fn scan_with_events(&self, root: &Path, events: &EventSender) -> Result<Vec<PathBuf>, ScanError> {
        events.send(Event::Scan(ScanEvent::Started {
            root: root.to_path_buf(),
        }));

        let files = self.scan(root)?;

        events.send(Event::Scan(ScanEvent::Completed {
            total_files: files.len(),
        }));

        Ok(files)
    }
}
