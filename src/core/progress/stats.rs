//! Run statistics and the rolling rate window.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};

const MB: u64 = 1024 * 1024;

/// Progress counters for one run, plus a rolling rate
#[derive(Debug, Clone)]
pub struct RunStatistics {
    /// Files in the manifest
    pub total_files: usize,
    /// Results received so far, successful or not
    pub processed: usize,
    /// Results that carried an error
    pub errors: usize,
    /// Sum of planned byte counts
    pub bytes_planned: u64,
    /// Bytes reported copied by successful results
    pub bytes_copied: u64,
    started: Instant,
    window: RateWindow,
}

/// Counters at the start of the current rate window
#[derive(Debug, Clone)]
struct RateWindow {
    opened: Instant,
    processed: usize,
    bytes_copied: u64,
    files_per_sec: f64,
    bytes_per_sec: f64,
}

impl RunStatistics {
    pub fn new(total_files: usize, bytes_planned: u64) -> Self {
        Self::starting_at(total_files, bytes_planned, Instant::now())
    }

    pub fn starting_at(total_files: usize, bytes_planned: u64, started: Instant) -> Self {
        Self {
            total_files,
            processed: 0,
            errors: 0,
            bytes_planned,
            bytes_copied: 0,
            started,
            window: RateWindow {
                opened: started,
                processed: 0,
                bytes_copied: 0,
                files_per_sec: 0.0,
                bytes_per_sec: 0.0,
            },
        }
    }

    /// Account for one finished entry
    pub fn record(&mut self, bytes_copied: u64, failed: bool) {
        self.processed += 1;
        if failed {
            self.errors += 1;
        } else {
            self.bytes_copied += bytes_copied;
        }
    }

    /// True once every manifest entry has reported back
    pub fn is_complete(&self) -> bool {
        self.processed >= self.total_files
    }

    /// Recompute the rate from progress since the window opened, then open a new window.
    pub fn roll_window(&mut self, now: Instant) {
        let elapsed = now.saturating_duration_since(self.window.opened).as_secs_f64();
        if elapsed <= 0.0 {
            return;
        }

        let files = self.processed - self.window.processed;
        let bytes = self.bytes_copied - self.window.bytes_copied;

        self.window = RateWindow {
            opened: now,
            processed: self.processed,
            bytes_copied: self.bytes_copied,
            files_per_sec: files as f64 / elapsed,
            bytes_per_sec: bytes as f64 / elapsed,
        };
    }

    /// Point-in-time view for reporting
    pub fn snapshot(&self) -> ProgressSnapshot {
        self.snapshot_at(Instant::now())
    }

    pub fn snapshot_at(&self, now: Instant) -> ProgressSnapshot {
        let percent = if self.total_files == 0 {
            100.0
        } else {
            100.0 * self.processed as f64 / self.total_files as f64
        };

        let remaining = self.bytes_planned.saturating_sub(self.bytes_copied);
        let eta = if self.window.bytes_per_sec > 0.0 {
            Some(Duration::from_secs_f64(
                remaining as f64 / self.window.bytes_per_sec,
            ))
        } else {
            None
        };

        ProgressSnapshot {
            percent,
            errors: self.errors,
            files_done: self.processed,
            files_total: self.total_files,
            bytes_done: self.bytes_copied,
            bytes_total: self.bytes_planned,
            files_per_sec: self.window.files_per_sec,
            bytes_per_sec: self.window.bytes_per_sec,
            eta,
            elapsed: now.saturating_duration_since(self.started),
        }
    }
}

/// One progress report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    pub percent: f64,
    pub errors: usize,
    pub files_done: usize,
    pub files_total: usize,
    pub bytes_done: u64,
    pub bytes_total: u64,
    pub files_per_sec: f64,
    pub bytes_per_sec: f64,
    /// Unknown until some bytes have moved
    pub eta: Option<Duration>,
    pub elapsed: Duration,
}

impl fmt::Display for ProgressSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "completed {:.1}% (errors {}) {} / {}, {}MB / {}MB ({:.0}/s, {}MB/s",
            self.percent,
            self.errors,
            self.files_done,
            self.files_total,
            self.bytes_done / MB,
            self.bytes_total / MB,
            self.files_per_sec,
            (self.bytes_per_sec as u64) / MB,
        )?;
        if let Some(eta) = self.eta {
            write!(f, ", eta {}", format_duration(eta))?;
        }
        write!(f, ")")
    }
}

/// Compact human duration: `4s`, `2m 5s`, `1h 0m 3s`
pub fn format_duration(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    let hours = secs / 3600;
    let mins = (secs % 3600) / 60;
    let secs = secs % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, mins, secs)
    } else if mins > 0 {
        format!("{}m {}s", mins, secs)
    } else {
        format!("{}s", secs)
    }
}
