//! Pipeline execution implementation.

use crate::core::hasher::DigestAlgorithm;
use crate::core::manifest::{
    CollisionPolicy, ManifestBuilder, ManifestConfig, MetadataPolicy, SkipReason, SkippedEntry,
};
use crate::core::metadata::{CaptureTimeSource, ExifCaptureTime};
use crate::core::replicator::{ReplicateConfig, Replicator, RunSummary};
use crate::core::scanner::{FileSelection, PhotoScanner, ScanConfig, WalkDirScanner};
use crate::error::{ConfigError, Result};
use crate::events::{null_sender, Event, EventSender, PipelineEvent, PipelinePhase};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::info;
use uuid::Uuid;

/// Result of pipeline execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineResult {
    /// Id of the manifest that was replicated
    pub manifest_id: Uuid,
    /// Files selected by the scan
    pub candidates: usize,
    /// Entries handed to the replicator
    pub planned: usize,
    /// Candidates deliberately left out of the manifest
    pub skipped: Vec<SkippedEntry>,
    /// Outcome of the copy phase
    pub summary: RunSummary,
    /// Duration in milliseconds, scan included
    pub duration_ms: u64,
}

impl PipelineResult {
    pub fn skipped_for(&self, reason: SkipReason) -> usize {
        self.skipped.iter().filter(|s| s.reason == reason).count()
    }
}

/// Configuration for the pipeline
#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    /// Tree to read photos from
    pub source: Option<PathBuf>,
    /// Root of the YYYY/MM destination tree
    pub destination: Option<PathBuf>,
    pub scan: ScanConfig,
    pub on_missing_metadata: MetadataPolicy,
    pub on_collision: CollisionPolicy,
    pub replicate: ReplicateConfig,
}

/// Builder for pipeline configuration
pub struct PipelineBuilder {
    config: PipelineConfig,
    timestamps: Option<Box<dyn CaptureTimeSource>>,
}

impl PipelineBuilder {
    /// Create a new pipeline builder
    pub fn new() -> Self {
        Self {
            config: PipelineConfig::default(),
            timestamps: None,
        }
    }

    pub fn source(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.source = Some(path.into());
        self
    }

    pub fn destination(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.destination = Some(path.into());
        self
    }

    /// Set scanner configuration
    pub fn scan_config(mut self, config: ScanConfig) -> Self {
        self.config.scan = config;
        self
    }

    pub fn selection(mut self, selection: FileSelection) -> Self {
        self.config.scan.selection = selection;
        self
    }

    pub fn include(mut self, pattern: Option<String>) -> Self {
        self.config.scan.include = pattern;
        self
    }

    pub fn exclude(mut self, pattern: Option<String>) -> Self {
        self.config.scan.exclude = pattern;
        self
    }

    pub fn follow_symlinks(mut self, follow: bool) -> Self {
        self.config.scan.follow_symlinks = follow;
        self
    }

    /// Include hidden files
    pub fn include_hidden(mut self, include: bool) -> Self {
        self.config.scan.include_hidden = include;
        self
    }

    pub fn on_missing_metadata(mut self, policy: MetadataPolicy) -> Self {
        self.config.on_missing_metadata = policy;
        self
    }

    pub fn on_collision(mut self, policy: CollisionPolicy) -> Self {
        self.config.on_collision = policy;
        self
    }

    /// Set replication configuration
    pub fn replicate_config(mut self, config: ReplicateConfig) -> Self {
        self.config.replicate = config;
        self
    }

    pub fn workers(mut self, workers: usize) -> Self {
        self.config.replicate.workers = workers;
        self
    }

    /// Replace existing destinations. Applies to planning and copying.
    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.config.replicate.overwrite = overwrite;
        self
    }

    pub fn cleanup_on_error(mut self, cleanup: bool) -> Self {
        self.config.replicate.cleanup_on_error = cleanup;
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.config.replicate.dry_run = dry_run;
        self
    }

    pub fn dry_run_delay(mut self, delay: bool) -> Self {
        self.config.replicate.dry_run_delay = delay;
        self
    }

    pub fn preserve_times(mut self, preserve: bool) -> Self {
        self.config.replicate.preserve_times = preserve;
        self
    }

    pub fn digest(mut self, digest: DigestAlgorithm) -> Self {
        self.config.replicate.digest = digest;
        self
    }

    /// Interval between progress lines
    pub fn tick(mut self, tick: Duration) -> Self {
        self.config.replicate.tick = tick;
        self
    }

    /// Interval between rate recalculations
    pub fn update(mut self, update: Duration) -> Self {
        self.config.replicate.update = update;
        self
    }

    /// Set the capture time source. Defaults to EXIF.
    pub fn capture_times(mut self, source: Box<dyn CaptureTimeSource>) -> Self {
        self.timestamps = Some(source);
        self
    }

    /// Build the pipeline
    pub fn build(self) -> Result<Pipeline> {
        let config = self.config;
        let source = config.source.clone().ok_or(ConfigError::MissingSource)?;
        let destination = config
            .destination
            .clone()
            .ok_or(ConfigError::MissingDestination)?;
        if config.replicate.workers == 0 {
            return Err(ConfigError::InvalidWorkers { value: 0 }.into());
        }

        let manifest_config = ManifestConfig {
            dest_root: destination.clone(),
            overwrite: config.replicate.overwrite,
            digest: config.replicate.digest,
            on_missing_metadata: config.on_missing_metadata,
            on_collision: config.on_collision,
        };
        let timestamps = self
            .timestamps
            .unwrap_or_else(|| Box::new(ExifCaptureTime));

        Ok(Pipeline {
            scanner: WalkDirScanner::new(config.scan.clone()),
            planner: ManifestBuilder::new(manifest_config, timestamps),
            replicator: Replicator::new(config.replicate.clone()),
            source,
            destination,
            config,
        })
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Scan, plan and replicate one source tree
pub struct Pipeline {
    config: PipelineConfig,
    source: PathBuf,
    destination: PathBuf,
    scanner: WalkDirScanner,
    planner: ManifestBuilder,
    replicator: Replicator,
}

impl Pipeline {
    /// Create a new pipeline builder
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    /// Run the pipeline without events
    pub fn run(&self) -> Result<PipelineResult> {
        self.run_with_events(&null_sender())
    }

    /// Run the pipeline with event reporting
    pub fn run_with_events(&self, events: &EventSender) -> Result<PipelineResult> {
        events.send(Event::Pipeline(PipelineEvent::Started));

        let result = self.execute(events);
        match &result {
            Ok(_) => events.send(Event::Pipeline(PipelineEvent::Completed)),
            Err(e) => events.send(Event::Pipeline(PipelineEvent::Error {
                message: e.to_string(),
            })),
        }
        result
    }

    fn execute(&self, events: &EventSender) -> Result<PipelineResult> {
        let start_time = Instant::now();

        // Phase 1: Scanning
        events.send(Event::Pipeline(PipelineEvent::PhaseChanged {
            phase: PipelinePhase::Scanning,
        }));
        let candidates = self.scanner.scan_with_events(&self.source, events)?;
        info!("found {} files in {}", candidates.len(), self.source.display());

        if !self.config.replicate.dry_run {
            fs::create_dir_all(&self.destination).map_err(|source| {
                ConfigError::DestinationCreate {
                    path: self.destination.clone(),
                    source,
                }
            })?;
        }

        // Phase 2: Planning
        events.send(Event::Pipeline(PipelineEvent::PhaseChanged {
            phase: PipelinePhase::Planning,
        }));
        let manifest = self.planner.build(&candidates, events)?;

        // Phase 3: Replicating
        events.send(Event::Pipeline(PipelineEvent::PhaseChanged {
            phase: PipelinePhase::Replicating,
        }));
        let summary = self.replicator.replicate_manifest(&manifest, events)?;

        Ok(PipelineResult {
            manifest_id: manifest.id,
            candidates: candidates.len(),
            planned: manifest.len(),
            skipped: manifest.skipped,
            summary,
            duration_ms: start_time.elapsed().as_millis() as u64,
        })
    }
}
