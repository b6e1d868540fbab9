//! Manifest builder.

use super::types::*;
use crate::core::hasher::{compute_digest, ContentDigest};
use crate::core::metadata::CaptureTimeSource;
use crate::error::{HashError, ManifestError, MetadataError, ReplicatorError, Result};
use crate::events::{Event, EventSender, ManifestEvent, ManifestProgress};
use chrono::NaiveDateTime;
use rayon::prelude::*;
use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Capture time and digest of one candidate
struct Inspected {
    capture_time: NaiveDateTime,
    digest: ContentDigest,
}

enum InspectError {
    Metadata(MetadataError),
    Hash(HashError),
}

/// Builds manifests from candidate paths
pub struct ManifestBuilder {
    config: ManifestConfig,
    timestamps: Box<dyn CaptureTimeSource>,
}

impl ManifestBuilder {
    pub fn new(config: ManifestConfig, timestamps: Box<dyn CaptureTimeSource>) -> Self {
        Self { config, timestamps }
    }

    /// Open the file once, read its capture time, then hash the same handle.
    fn inspect(&self, path: &Path) -> std::result::Result<Inspected, InspectError> {
        let mut file = File::open(path).map_err(|source| {
            InspectError::Metadata(MetadataError::Open {
                path: path.to_path_buf(),
                source,
            })
        })?;

        let capture_time = self
            .timestamps
            .capture_time(&mut file, path)
            .map_err(InspectError::Metadata)?;

        let digest = compute_digest(&mut file, self.config.digest).map_err(|source| {
            InspectError::Hash(HashError::Io {
                path: path.to_path_buf(),
                source,
            })
        })?;

        Ok(Inspected {
            capture_time,
            digest,
        })
    }

    /// Build a manifest from `candidates`, keeping their order.
    ///
    /// Inspection runs in parallel; planning destinations is sequential so
    /// collisions resolve the same way on every run.
    pub fn build(&self, candidates: &[PathBuf], events: &EventSender) -> Result<Manifest> {
        let total = candidates.len();
        events.send(Event::Manifest(ManifestEvent::Started {
            total_candidates: total,
        }));

        // Lowest index whose inspection failed fatally; later candidates are
        // not inspected once it is set.
        let first_fatal = AtomicUsize::new(usize::MAX);
        let inspected_count = AtomicUsize::new(0);
        let inspected: Vec<Option<_>> = candidates
            .par_iter()
            .enumerate()
            .map(|(index, path)| {
                if index > first_fatal.load(Ordering::SeqCst) {
                    return None;
                }
                debug!(path = %path.display(), "extracting");
                let result = self.inspect(path);
                if let Err(e) = &result {
                    if self.is_fatal(e) {
                        first_fatal.fetch_min(index, Ordering::SeqCst);
                    }
                }
                let done = inspected_count.fetch_add(1, Ordering::SeqCst) + 1;
                events.send(Event::Manifest(ManifestEvent::Progress(ManifestProgress {
                    inspected: done,
                    total,
                    current_path: path.clone(),
                })));
                Some(result)
            })
            .collect();

        let mut entries = Vec::with_capacity(total);
        let mut skipped = Vec::new();
        // destination -> (source, content hash) of the first candidate to claim it
        let mut planned: HashMap<PathBuf, (PathBuf, String)> = HashMap::new();

        for (path, slot) in candidates.iter().zip(inspected) {
            // only candidates after the first fatal failure are left uninspected
            let Some(result) = slot else {
                break;
            };
            let found = match result {
                Ok(found) => found,
                Err(InspectError::Hash(e)) => return Err(e.into()),
                Err(InspectError::Metadata(e)) => match self.config.on_missing_metadata {
                    MetadataPolicy::Abort => return Err(e.into()),
                    MetadataPolicy::Skip => {
                        warn!("skipping {}: {}", path.display(), e);
                        self.skip(
                            &mut skipped,
                            events,
                            SkippedEntry {
                                source: path.clone(),
                                destination: None,
                                reason: SkipReason::MissingMetadata,
                                detail: Some(e.to_string()),
                            },
                        );
                        continue;
                    }
                },
            };

            let natural = destination_for(&self.config.dest_root, &found.capture_time, path);
            let dest_path = match planned.get(&natural) {
                None => natural,
                Some((first, hash)) if *hash == found.digest.hex => {
                    self.skip(
                        &mut skipped,
                        events,
                        SkippedEntry {
                            source: path.clone(),
                            destination: Some(natural.clone()),
                            reason: SkipReason::DuplicateContent,
                            detail: Some(format!("same content as {}", first.display())),
                        },
                    );
                    continue;
                }
                Some((first, _)) => match self.config.on_collision {
                    CollisionPolicy::Fail => {
                        return Err(ReplicatorError::Manifest(
                            ManifestError::DestinationCollision {
                                destination: natural.clone(),
                                first: first.clone(),
                                second: path.clone(),
                            },
                        ))
                    }
                    CollisionPolicy::Disambiguate => {
                        let renamed = disambiguate(&natural, &found.digest.hex, &planned);
                        info!(
                            "{} collides with {}, using {}",
                            path.display(),
                            first.display(),
                            renamed.display()
                        );
                        renamed
                    }
                },
            };

            planned.insert(
                dest_path.clone(),
                (path.clone(), found.digest.hex.clone()),
            );

            if !self.config.overwrite && dest_path.exists() {
                debug!(dest = %dest_path.display(), "destination exists, not queued");
                self.skip(
                    &mut skipped,
                    events,
                    SkippedEntry {
                        source: path.clone(),
                        destination: Some(dest_path),
                        reason: SkipReason::DestinationExists,
                        detail: None,
                    },
                );
                continue;
            }

            entries.push(ManifestEntry {
                source_path: path.clone(),
                dest_path,
                content_hash: found.digest.hex,
                byte_count: found.digest.bytes,
                capture_time: found.capture_time,
            });
        }

        let manifest = Manifest {
            id: Uuid::new_v4(),
            digest: self.config.digest,
            entries,
            skipped,
        };

        events.send(Event::Manifest(ManifestEvent::Completed {
            queued: manifest.len(),
            skipped: manifest.skipped.len(),
            total_bytes: manifest.total_bytes(),
        }));

        Ok(manifest)
    }

    fn is_fatal(&self, error: &InspectError) -> bool {
        match error {
            InspectError::Hash(_) => true,
            InspectError::Metadata(_) => self.config.on_missing_metadata == MetadataPolicy::Abort,
        }
    }

    fn skip(&self, skipped: &mut Vec<SkippedEntry>, events: &EventSender, entry: SkippedEntry) {
        events.send(Event::Manifest(ManifestEvent::Skipped {
            source: entry.source.clone(),
            reason: entry.reason,
        }));
        skipped.push(entry);
    }
}

/// `stem_<first 8 hex of digest>.ext`, with a counter if even that is taken
fn disambiguate(
    path: &Path,
    hash: &str,
    planned: &HashMap<PathBuf, (PathBuf, String)>,
) -> PathBuf {
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("photo");
    let ext = path.extension().and_then(|e| e.to_str());
    let parent = path.parent().unwrap_or(Path::new(""));
    let short = &hash[..hash.len().min(8)];

    let name = |suffix: String| match ext {
        Some(ext) => format!("{}_{}.{}", stem, suffix, ext),
        None => format!("{}_{}", stem, suffix),
    };

    let candidate = parent.join(name(short.to_string()));
    if !planned.contains_key(&candidate) {
        return candidate;
    }

    let mut counter = 1;
    loop {
        let candidate = parent.join(name(format!("{}_{}", short, counter)));
        if !planned.contains_key(&candidate) {
            return candidate;
        }
        counter += 1;
    }
}
