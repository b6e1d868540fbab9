//! Worker pool and dispatcher.

use super::types::{CopyResult, ReplicateConfig, RunSummary};
use super::worker::{replicate_one, run_worker};
use crate::core::manifest::{Manifest, ManifestEntry};
use crate::core::progress::{format_duration, Aggregate, ProgressReporter};
use crate::error::{ConfigError, CopyError, Result};
use crate::events::{Event, EventSender, ReplicateEvent};
use crossbeam_channel::bounded;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info};
use uuid::Uuid;

const MB: u64 = 1024 * 1024;

/// Capacity of the work and result queues for a pool of `workers`
pub fn queue_capacity(workers: usize) -> usize {
    workers * 2
}

/// Replicates manifest entries with a bounded worker pool
pub struct Replicator {
    config: ReplicateConfig,
}

impl Replicator {
    pub fn new(config: ReplicateConfig) -> Self {
        Self { config }
    }

    fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.config.workers == 0 {
            return Err(ConfigError::InvalidWorkers {
                value: self.config.workers,
            });
        }
        if self.config.tick == Duration::ZERO {
            return Err(ConfigError::InvalidInterval { name: "tick" });
        }
        if self.config.update == Duration::ZERO {
            return Err(ConfigError::InvalidInterval { name: "update" });
        }
        Ok(())
    }

    /// Replicate a planned manifest, verifying with the manifest's own digest.
    pub fn replicate_manifest(&self, manifest: &Manifest, events: &EventSender) -> Result<RunSummary> {
        if manifest.digest == self.config.digest {
            return self.replicate(&manifest.entries, events);
        }
        let config = ReplicateConfig {
            digest: manifest.digest,
            ..self.config.clone()
        };
        Replicator::new(config).replicate(&manifest.entries, events)
    }

    /// Copy every entry, returning once all of them have been handled.
    ///
    /// Entries are handed out in order through a queue holding at most
    /// `queue_capacity(workers)` entries, so the dispatcher blocks while
    /// the pool is saturated. Failed entries are collected in the summary.
    pub fn replicate(&self, entries: &[ManifestEntry], events: &EventSender) -> Result<RunSummary> {
        self.validate()?;

        let config = &self.config;
        let run_id = Uuid::new_v4();
        let total = entries.len();
        let bytes_planned: u64 = entries.iter().map(|e| e.byte_count).sum();
        let started = Instant::now();

        info!(
            run = %run_id,
            workers = config.workers,
            dry_run = config.dry_run,
            "replicating {} files, {}MB",
            total,
            bytes_planned / MB
        );
        events.send(Event::Replicate(ReplicateEvent::Started {
            total_files: total,
            total_bytes: bytes_planned,
        }));

        let aggregate = self.dispatch(entries, total, bytes_planned, events, |entry| {
            replicate_one(entry, config)
        });

        let elapsed = started.elapsed();
        let stats = aggregate.stats;
        let summary = RunSummary {
            run_id,
            total_files: total,
            processed: stats.processed,
            failed: stats.errors,
            bytes_planned,
            bytes_copied: stats.bytes_copied,
            elapsed,
            dry_run: config.dry_run,
            failures: aggregate.failures,
        };

        info!("done, replicated {} files in {}", summary.processed, format_duration(elapsed));
        events.send(Event::Replicate(ReplicateEvent::Completed {
            completed: summary.succeeded(),
            failed: summary.failed,
            bytes_copied: summary.bytes_copied,
            duration_ms: elapsed.as_millis() as u64,
        }));

        Ok(summary)
    }

    /// Feed `entries` through the bounded queue to the worker pool, applying
    /// `copy` to each one, and wait for the aggregator.
    fn dispatch<'a, I, F>(
        &self,
        entries: I,
        total: usize,
        bytes_planned: u64,
        events: &EventSender,
        copy: F,
    ) -> Aggregate
    where
        I: IntoIterator<Item = &'a ManifestEntry>,
        F: Fn(&ManifestEntry) -> std::result::Result<u64, CopyError> + Sync,
    {
        let config = &self.config;
        let copy = &copy;
        let capacity = queue_capacity(config.workers);
        let (work_tx, work_rx) = bounded::<&ManifestEntry>(capacity);
        let (results_tx, results_rx) = bounded::<CopyResult>(capacity);

        thread::scope(|s| {
            let reporter = ProgressReporter::new(config.tick, config.update, events.clone());
            let aggregator = s.spawn(move || reporter.run(results_rx, total, bytes_planned));

            let workers: Vec<_> = (0..config.workers)
                .map(|id| {
                    let work = work_rx.clone();
                    let results = results_tx.clone();
                    s.spawn(move || run_worker(id, work, results, copy))
                })
                .collect();
            drop(work_rx);
            drop(results_tx);

            for entry in entries {
                if work_tx.send(entry).is_err() {
                    break;
                }
            }
            drop(work_tx);
            debug!("all {} entries dispatched", total);

            for handle in workers {
                if let Err(panic) = handle.join() {
                    std::panic::resume_unwind(panic);
                }
            }

            aggregator
                .join()
                .unwrap_or_else(|panic| std::panic::resume_unwind(panic))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::hasher::{digest_file, DigestAlgorithm};
    use crate::error::ReplicatorError;
    use crate::events::{null_sender, EventChannel};
    use chrono::NaiveDate;
    use std::fs;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    fn entries(root: &Path, count: usize) -> Vec<ManifestEntry> {
        let taken = NaiveDate::from_ymd_opt(2022, 11, 5)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();
        (0..count)
            .map(|i| {
                let source = root.join(format!("src/IMG_{:04}.JPG", i));
                fs::create_dir_all(source.parent().unwrap()).unwrap();
                fs::write(&source, format!("photo number {}", i)).unwrap();
                let digest = digest_file(&source, DigestAlgorithm::Md5).unwrap();
                ManifestEntry {
                    dest_path: root.join(format!("dest/2022/11/IMG_{:04}.JPG", i)),
                    source_path: source,
                    content_hash: digest.hex,
                    byte_count: digest.bytes,
                    capture_time: taken,
                }
            })
            .collect()
    }

    fn quick(workers: usize) -> ReplicateConfig {
        ReplicateConfig {
            workers,
            tick: Duration::from_millis(20),
            update: Duration::from_millis(20),
            ..ReplicateConfig::default()
        }
    }

    #[test]
    fn queue_holds_two_entries_per_worker() {
        assert_eq!(queue_capacity(1), 2);
        assert_eq!(queue_capacity(3), 6);
    }

    #[test]
    fn dispatcher_blocks_while_single_worker_is_busy() {
        let dir = TempDir::new().unwrap();
        let entries = entries(dir.path(), 20);
        let replicator = Replicator::new(quick(1));
        let pulled = AtomicUsize::new(0);
        let (release_tx, release_rx) = bounded::<()>(0);

        let (seen, aggregate) = thread::scope(|s| {
            let run = s.spawn(|| {
                let counted = entries.iter().inspect(|_| {
                    pulled.fetch_add(1, Ordering::SeqCst);
                });
                replicator.dispatch(counted, entries.len(), 0, &null_sender(), |entry| {
                    // every copy waits until the test lets go
                    let _ = release_rx.recv();
                    Ok(entry.byte_count)
                })
            });

            thread::sleep(Duration::from_millis(200));
            let seen = pulled.load(Ordering::SeqCst);
            drop(release_tx);
            (seen, run.join().unwrap())
        });

        // one entry in the worker, a full queue, one blocked in send
        assert!(
            seen <= 1 + queue_capacity(1) + 1,
            "dispatcher pulled {} entries ahead of a blocked worker",
            seen
        );
        assert_eq!(aggregate.stats.processed, 20);
        assert_eq!(pulled.load(Ordering::SeqCst), 20);
    }

    #[test]
    fn copies_every_entry() {
        let dir = TempDir::new().unwrap();
        let entries = entries(dir.path(), 12);

        let summary = Replicator::new(quick(3))
            .replicate(&entries, &null_sender())
            .unwrap();

        assert_eq!(summary.processed, 12);
        assert_eq!(summary.failed, 0);
        assert_eq!(summary.bytes_copied, summary.bytes_planned);
        for entry in &entries {
            assert_eq!(
                fs::read(&entry.dest_path).unwrap(),
                fs::read(&entry.source_path).unwrap()
            );
        }
    }

    #[test]
    fn outcome_does_not_depend_on_worker_count() {
        for workers in [1, 2, 8] {
            let dir = TempDir::new().unwrap();
            let entries = entries(dir.path(), 10);
            // one pre-existing destination fails regardless of scheduling
            fs::create_dir_all(entries[4].dest_path.parent().unwrap()).unwrap();
            fs::write(&entries[4].dest_path, b"already here").unwrap();

            let summary = Replicator::new(quick(workers))
                .replicate(&entries, &null_sender())
                .unwrap();

            assert_eq!(summary.processed, 10, "workers = {}", workers);
            assert_eq!(summary.failed, 1, "workers = {}", workers);
            assert_eq!(summary.failures[0].source, entries[4].source_path);
            assert_eq!(summary.failures[0].kind, "already_exists");
        }
    }

    #[test]
    fn empty_manifest_finishes_immediately() {
        let summary = Replicator::new(quick(3))
            .replicate(&[], &null_sender())
            .unwrap();

        assert_eq!(summary.total_files, 0);
        assert_eq!(summary.processed, 0);
        assert!(!summary.has_failures());
    }

    #[test]
    fn zero_workers_is_rejected() {
        let result = Replicator::new(quick(0)).replicate(&[], &null_sender());
        assert!(matches!(
            result,
            Err(ReplicatorError::Config(ConfigError::InvalidWorkers { value: 0 }))
        ));
    }

    #[test]
    fn zero_tick_is_rejected() {
        let config = ReplicateConfig {
            tick: Duration::ZERO,
            ..quick(1)
        };
        let result = Replicator::new(config).replicate(&[], &null_sender());
        assert!(matches!(
            result,
            Err(ReplicatorError::Config(ConfigError::InvalidInterval { name: "tick" }))
        ));
    }

    #[test]
    fn dry_run_reports_planned_bytes_without_copying() {
        let dir = TempDir::new().unwrap();
        let entries = entries(dir.path(), 4);
        let config = ReplicateConfig {
            dry_run: true,
            dry_run_delay: false,
            ..quick(2)
        };

        let summary = Replicator::new(config)
            .replicate(&entries, &null_sender())
            .unwrap();

        assert!(summary.dry_run);
        assert_eq!(summary.bytes_copied, summary.bytes_planned);
        assert!(!dir.path().join("dest").exists());
    }

    #[test]
    fn emits_started_and_completed() {
        let dir = TempDir::new().unwrap();
        let entries = entries(dir.path(), 3);
        let (sender, receiver) = EventChannel::new();

        Replicator::new(quick(2))
            .replicate(&entries, &sender)
            .unwrap();
        drop(sender);

        let events: Vec<Event> = receiver.iter().collect();
        assert!(matches!(
            events.first(),
            Some(Event::Replicate(ReplicateEvent::Started { total_files: 3, .. }))
        ));
        assert!(matches!(
            events.last(),
            Some(Event::Replicate(ReplicateEvent::Completed {
                completed: 3,
                failed: 0,
                ..
            }))
        ));
    }
}
