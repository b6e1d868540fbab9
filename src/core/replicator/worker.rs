//! Copy, verify and clean up a single manifest entry.

use super::types::{CopyResult, ReplicateConfig};
use crate::core::hasher::compute_digest;
use crate::core::manifest::ManifestEntry;
use crate::error::CopyError;
use chrono::{Local, NaiveDateTime, TimeZone};
use crossbeam_channel::{Receiver, Sender};
use filetime::FileTime;
use rand::Rng;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, Write};
use std::path::Path;
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

/// Upper bound of the simulated per-entry delay in dry runs
const MAX_DRY_RUN_DELAY_MS: u64 = 2000;

/// Pull entries until the queue is closed and drained, one result per entry.
pub(super) fn run_worker<F>(
    id: usize,
    work: Receiver<&ManifestEntry>,
    results: Sender<CopyResult>,
    copy: &F,
) where
    F: Fn(&ManifestEntry) -> Result<u64, CopyError>,
{
    for entry in work.iter() {
        let result = match copy(entry) {
            Ok(n) => CopyResult {
                source_path: entry.source_path.clone(),
                bytes_copied: n,
                error: None,
            },
            Err(error) => CopyResult {
                source_path: entry.source_path.clone(),
                bytes_copied: 0,
                error: Some(error),
            },
        };
        if results.send(result).is_err() {
            warn!(worker = id, "result channel closed, stopping");
            return;
        }
    }
    debug!(worker = id, "queue drained");
}

/// Copy one entry and verify the copy.
///
/// Returns the number of bytes copied. The destination is left alone if it
/// exists and overwrite is off. It is only created once the source is open,
/// and when cleanup is on, a destination that was written but failed to
/// verify is removed.
pub fn replicate_one(entry: &ManifestEntry, config: &ReplicateConfig) -> Result<u64, CopyError> {
    if config.dry_run {
        if config.dry_run_delay {
            let ms = rand::thread_rng().gen_range(0..MAX_DRY_RUN_DELAY_MS);
            thread::sleep(Duration::from_millis(ms));
        }
        return Ok(entry.byte_count);
    }

    let dest = entry.dest_path.as_path();

    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).map_err(|source| CopyError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    if !config.overwrite && dest.exists() {
        return Err(CopyError::AlreadyExists {
            path: dest.to_path_buf(),
        });
    }

    let mut src = File::open(&entry.source_path).map_err(|source| CopyError::Open {
        path: entry.source_path.clone(),
        source,
    })?;
    let mut dst = open_destination(dest, config.overwrite)?;

    let outcome = copy_and_verify(entry, config, &mut src, &mut dst);
    drop(src);
    drop(dst);

    let n = match outcome {
        Ok(n) => n,
        Err(error) => {
            if config.cleanup_on_error && error.is_integrity_failure() {
                discard(dest);
            }
            return Err(error);
        }
    };

    if config.preserve_times {
        let when = capture_filetime(&entry.capture_time);
        filetime::set_file_times(dest, when, when).map_err(|source| CopyError::SetTimes {
            path: dest.to_path_buf(),
            source,
        })?;
    }

    Ok(n)
}

/// Stream `src` into `dst`, then check the byte count and re-read `dst`
/// for its digest.
fn copy_and_verify<R, W>(
    entry: &ManifestEntry,
    config: &ReplicateConfig,
    src: &mut R,
    dst: &mut W,
) -> Result<u64, CopyError>
where
    R: Read,
    W: Read + Write + Seek,
{
    let dest = entry.dest_path.as_path();

    let n = io::copy(src, dst)
        .and_then(|n| dst.flush().map(|_| n))
        .map_err(|source| CopyError::CopyIo {
            source_path: entry.source_path.clone(),
            dest_path: dest.to_path_buf(),
            source,
        })?;

    if n != entry.byte_count {
        return Err(CopyError::SizeMismatch {
            source_path: entry.source_path.clone(),
            dest_path: dest.to_path_buf(),
            expected: entry.byte_count,
            actual: n,
        });
    }

    let digest = compute_digest(dst, config.digest).map_err(|source| CopyError::Verify {
        path: dest.to_path_buf(),
        source,
    })?;

    if digest.hex != entry.content_hash {
        return Err(CopyError::HashMismatch {
            source_path: entry.source_path.clone(),
            dest_path: dest.to_path_buf(),
            expected: entry.content_hash.clone(),
            actual: digest.hex,
        });
    }

    Ok(n)
}

/// Open the destination for writing and reading back.
fn open_destination(dest: &Path, overwrite: bool) -> Result<File, CopyError> {
    let mut options = OpenOptions::new();
    options.read(true).write(true);
    if overwrite {
        options.create(true).truncate(true);
    } else {
        // The existence check above can race with another writer.
        options.create_new(true);
    }

    options.open(dest).map_err(|source| {
        if source.kind() == io::ErrorKind::AlreadyExists {
            CopyError::AlreadyExists {
                path: dest.to_path_buf(),
            }
        } else {
            CopyError::Open {
                path: dest.to_path_buf(),
                source,
            }
        }
    })
}

/// Best-effort removal of a destination that failed to copy or verify
fn discard(dest: &Path) {
    match fs::remove_file(dest) {
        Ok(()) => debug!(path = %dest.display(), "removed unverified copy"),
        Err(e) => warn!("failed to remove {}: {}", dest.display(), e),
    }
}

/// EXIF times carry no zone; read them as local wall-clock time.
pub(crate) fn capture_filetime(capture_time: &NaiveDateTime) -> FileTime {
    let secs = Local
        .from_local_datetime(capture_time)
        .earliest()
        .map(|dt| dt.timestamp())
        .unwrap_or_else(|| capture_time.and_utc().timestamp());
    FileTime::from_unix_time(secs, 0)
}
