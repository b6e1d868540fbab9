//! File selection rules for the scanner.

use super::FileSelection;
use std::path::Path;

const JPEG_EXTENSIONS: &[&str] = &["jpg", "jpeg"];

const RAW_EXTENSIONS: &[&str] = &[
    "cr2", "cr3", "nef", "arw", "dng", "raf", "orf", "rw2", "pef", "srw",
];

/// Decides which files in the source tree are candidates
#[derive(Debug, Clone)]
pub struct PhotoFilter {
    selection: FileSelection,
    include: Option<String>,
    exclude: Option<String>,
    include_hidden: bool,
}

impl PhotoFilter {
    /// Filter accepting the given kind of photo
    pub fn new(selection: FileSelection) -> Self {
        Self {
            selection,
            include: None,
            exclude: None,
            include_hidden: false,
        }
    }

    /// Only accept names containing `pattern`. An empty pattern means no restriction.
    pub fn with_include(mut self, pattern: Option<String>) -> Self {
        self.include = pattern.filter(|p| !p.is_empty());
        self
    }

    /// Reject names containing `pattern`. An empty pattern means no restriction.
    pub fn with_exclude(mut self, pattern: Option<String>) -> Self {
        self.exclude = pattern.filter(|p| !p.is_empty());
        self
    }

    /// Include hidden files (starting with .)
    pub fn with_hidden(mut self, include: bool) -> Self {
        self.include_hidden = include;
        self
    }

    /// Check if a file should be included
    pub fn should_include(&self, path: &Path) -> bool {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };

        if !self.include_hidden && name.starts_with('.') {
            return false;
        }

        if let Some(ref include) = self.include {
            if !name.contains(include.as_str()) {
                return false;
            }
        }

        if let Some(ref exclude) = self.exclude {
            if name.contains(exclude.as_str()) {
                return false;
            }
        }

        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return false;
        };
        let ext = ext.to_lowercase();

        let jpeg = JPEG_EXTENSIONS.contains(&ext.as_str());
        let raw = RAW_EXTENSIONS.contains(&ext.as_str());

        match self.selection {
            FileSelection::Jpeg => jpeg,
            FileSelection::Raw => raw,
            FileSelection::Both => jpeg || raw,
        }
    }
}

impl Default for PhotoFilter {
    fn default() -> Self {
        Self::new(FileSelection::default())
    }
}
