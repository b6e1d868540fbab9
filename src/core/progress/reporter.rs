//! Result aggregation and periodic progress lines.

use super::stats::RunStatistics;
use crate::core::replicator::{CopyResult, FailedEntry};
use crate::events::{Event, EventSender, ReplicateEvent};
use crossbeam_channel::{select, tick, Receiver};
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// What the aggregator hands back once the run is over
#[derive(Debug)]
pub struct Aggregate {
    pub stats: RunStatistics,
    pub failures: Vec<FailedEntry>,
}

/// Consumes copy results and reports progress on a fixed tick
pub struct ProgressReporter {
    tick: Duration,
    update: Duration,
    events: EventSender,
}

impl ProgressReporter {
    /// `tick` paces the progress lines, `update` paces the rate window.
    pub fn new(tick: Duration, update: Duration, events: EventSender) -> Self {
        Self {
            tick,
            update,
            events,
        }
    }

    /// Aggregate until `expected` results have arrived or every sender is gone.
    pub fn run(self, results: Receiver<CopyResult>, expected: usize, bytes_planned: u64) -> Aggregate {
        let mut stats = RunStatistics::new(expected, bytes_planned);
        let mut failures = Vec::new();

        let ticker = tick(self.tick);
        let updater = tick(self.update);

        while !stats.is_complete() {
            select! {
                recv(results) -> msg => match msg {
                    Ok(result) => self.absorb(&mut stats, &mut failures, result),
                    Err(_) => {
                        warn!(
                            "result channel closed after {} of {} entries",
                            stats.processed, expected
                        );
                        break;
                    }
                },
                recv(ticker) -> _ => self.report(&stats),
                recv(updater) -> _ => stats.roll_window(Instant::now()),
            }
        }

        stats.roll_window(Instant::now());
        self.report(&stats);

        Aggregate { stats, failures }
    }

    fn absorb(&self, stats: &mut RunStatistics, failures: &mut Vec<FailedEntry>, result: CopyResult) {
        match result.error {
            None => stats.record(result.bytes_copied, false),
            Some(error) => {
                stats.record(result.bytes_copied, true);
                warn!("error: {}", error);
                self.events.send(Event::Replicate(ReplicateEvent::EntryFailed {
                    source: result.source_path.clone(),
                    message: error.to_string(),
                }));
                failures.push(FailedEntry {
                    source: result.source_path,
                    kind: error.kind().to_string(),
                    message: error.to_string(),
                });
            }
        }
    }

    fn report(&self, stats: &RunStatistics) {
        let snapshot = stats.snapshot();
        info!("{}", snapshot);
        self.events
            .send(Event::Replicate(ReplicateEvent::Progress(snapshot)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CopyError;
    use crate::events::{null_sender, EventChannel};
    use crossbeam_channel::bounded;
    use std::path::PathBuf;
    use std::thread;

    fn ok(name: &str, bytes: u64) -> CopyResult {
        CopyResult {
            source_path: PathBuf::from(name),
            bytes_copied: bytes,
            error: None,
        }
    }

    fn failed(name: &str) -> CopyResult {
        CopyResult {
            source_path: PathBuf::from(name),
            bytes_copied: 0,
            error: Some(CopyError::AlreadyExists {
                path: PathBuf::from(format!("/dest/{}", name)),
            }),
        }
    }

    #[test]
    fn stops_after_expected_results() {
        let (tx, rx) = bounded(4);
        tx.send(ok("a.jpg", 10)).unwrap();
        tx.send(failed("b.jpg")).unwrap();
        tx.send(ok("c.jpg", 5)).unwrap();

        // The sender stays alive: only the count can end the loop.
        let reporter = ProgressReporter::new(
            Duration::from_millis(50),
            Duration::from_millis(50),
            null_sender(),
        );
        let aggregate = reporter.run(rx, 3, 15);

        assert_eq!(aggregate.stats.processed, 3);
        assert_eq!(aggregate.stats.errors, 1);
        assert_eq!(aggregate.stats.bytes_copied, 15);
        assert_eq!(aggregate.failures.len(), 1);
        assert_eq!(aggregate.failures[0].kind, "already_exists");
        drop(tx);
    }

    #[test]
    fn stops_when_senders_disappear() {
        let (tx, rx) = bounded(4);
        tx.send(ok("a.jpg", 10)).unwrap();
        drop(tx);

        let reporter = ProgressReporter::new(
            Duration::from_secs(60),
            Duration::from_secs(60),
            null_sender(),
        );
        let aggregate = reporter.run(rx, 5, 50);

        assert_eq!(aggregate.stats.processed, 1);
        assert!(!aggregate.stats.is_complete());
    }

    #[test]
    fn ticks_while_waiting() {
        let (tx, rx) = bounded(1);
        let (events, receiver) = EventChannel::new();

        let handle = thread::spawn(move || {
            ProgressReporter::new(Duration::from_millis(10), Duration::from_millis(10), events)
                .run(rx, 1, 1)
        });

        thread::sleep(Duration::from_millis(60));
        tx.send(ok("a.jpg", 1)).unwrap();
        handle.join().unwrap();

        let progress = receiver
            .iter()
            .filter(|e| matches!(e, Event::Replicate(ReplicateEvent::Progress(_))))
            .count();
        // at least one tick while idle plus the closing report
        assert!(progress >= 2);
    }
}
