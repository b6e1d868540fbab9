//! Integration tests for a full replication run.
//!
//! These tests drive the public pipeline against real files:
//! - date-keyed destination layout
//! - reruns with and without overwrite
//! - name collisions and duplicate content
//! - photos without a capture time
//! - worker-count independence

use assert_fs::prelude::*;
use assert_fs::TempDir;
use chrono::NaiveDate;
use photo_replicator::core::manifest::{CollisionPolicy, MetadataPolicy, SkipReason};
use photo_replicator::core::metadata::testing::jpeg_with_capture_time;
use photo_replicator::core::metadata::FixedCaptureTime;
use photo_replicator::core::pipeline::{Pipeline, PipelineBuilder};
use photo_replicator::core::scanner::FileSelection;
use photo_replicator::error::{ManifestError, ReplicatorError};
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

fn pipeline(src: &Path, dest: &Path) -> PipelineBuilder {
    Pipeline::builder()
        .source(src)
        .destination(dest)
        .tick(Duration::from_millis(25))
        .update(Duration::from_millis(25))
}

/// Every file under `root`, relative to it, with its contents
fn tree(root: &Path) -> Vec<(PathBuf, Vec<u8>)> {
    let mut files: Vec<_> = walkdir::WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            let rel = e.path().strip_prefix(root).unwrap().to_path_buf();
            (rel, fs::read(e.path()).unwrap())
        })
        .collect();
    files.sort();
    files
}

fn card(src: &TempDir) {
    src.child("DCIM/100CANON/IMG_0001.JPG")
        .write_binary(&jpeg_with_capture_time("2023:01:15 09:00:00", b"first"))
        .unwrap();
    src.child("DCIM/100CANON/IMG_0002.JPG")
        .write_binary(&jpeg_with_capture_time("2023:01:20 18:30:00", b"second"))
        .unwrap();
    src.child("DCIM/101CANON/IMG_0100.jpeg")
        .write_binary(&jpeg_with_capture_time("2022:12:31 23:59:59", b"third"))
        .unwrap();
    src.child("DCIM/101CANON/notes.txt")
        .write_str("not a photo")
        .unwrap();
}

#[test]
fn replicates_into_year_month_folders() {
    let src = TempDir::new().unwrap();
    let dest = TempDir::new().unwrap();
    card(&src);

    let result = pipeline(src.path(), dest.path()).build().unwrap().run().unwrap();

    assert_eq!(result.candidates, 3);
    assert_eq!(result.summary.succeeded(), 3);
    assert!(!result.summary.has_failures());

    dest.child("2023/01/IMG_0001.JPG")
        .assert(predicate::path::is_file());
    dest.child("2023/01/IMG_0002.JPG")
        .assert(predicate::path::is_file());
    dest.child("2022/12/IMG_0100.jpeg")
        .assert(predicate::path::is_file());
    dest.child("2022/12/notes.txt")
        .assert(predicate::path::missing());

    dest.child("2023/01/IMG_0002.JPG").assert(predicate::path::eq_file(
        src.child("DCIM/100CANON/IMG_0002.JPG").path(),
    ));
}

#[test]
fn second_run_without_overwrite_changes_nothing() {
    let src = TempDir::new().unwrap();
    let dest = TempDir::new().unwrap();
    card(&src);

    pipeline(src.path(), dest.path()).build().unwrap().run().unwrap();
    let before = tree(dest.path());

    let rerun = pipeline(src.path(), dest.path()).build().unwrap().run().unwrap();

    assert_eq!(rerun.planned, 0);
    assert_eq!(rerun.skipped_for(SkipReason::DestinationExists), 3);
    assert_eq!(tree(dest.path()), before);
}

#[test]
fn overwrite_replaces_stale_copies() {
    let src = TempDir::new().unwrap();
    let dest = TempDir::new().unwrap();
    card(&src);
    dest.child("2023/01/IMG_0001.JPG")
        .write_str("stale bytes from an older import")
        .unwrap();

    let result = pipeline(src.path(), dest.path())
        .overwrite(true)
        .build()
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(result.summary.succeeded(), 3);
    dest.child("2023/01/IMG_0001.JPG").assert(predicate::path::eq_file(
        src.child("DCIM/100CANON/IMG_0001.JPG").path(),
    ));
}

#[test]
fn same_name_from_two_folders_is_disambiguated() {
    let src = TempDir::new().unwrap();
    let dest = TempDir::new().unwrap();
    src.child("a/IMG_0001.JPG")
        .write_binary(&jpeg_with_capture_time("2024:05:01 12:00:00", b"morning"))
        .unwrap();
    src.child("b/IMG_0001.JPG")
        .write_binary(&jpeg_with_capture_time("2024:05:02 12:00:00", b"evening"))
        .unwrap();

    let result = pipeline(src.path(), dest.path()).build().unwrap().run().unwrap();

    assert_eq!(result.summary.succeeded(), 2);
    let month = dest.path().join("2024/05");
    let names: Vec<String> = fs::read_dir(&month)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names.len(), 2);
    assert!(names.contains(&"IMG_0001.JPG".to_string()));
    assert!(names
        .iter()
        .any(|n| n.starts_with("IMG_0001_") && n.ends_with(".JPG")));
}

#[test]
fn identical_copies_are_planned_once() {
    let src = TempDir::new().unwrap();
    let dest = TempDir::new().unwrap();
    let bytes = jpeg_with_capture_time("2024:05:01 12:00:00", b"same");
    src.child("a/IMG_0001.JPG").write_binary(&bytes).unwrap();
    src.child("backup/IMG_0001.JPG").write_binary(&bytes).unwrap();

    let result = pipeline(src.path(), dest.path()).build().unwrap().run().unwrap();

    assert_eq!(result.planned, 1);
    assert_eq!(result.skipped_for(SkipReason::DuplicateContent), 1);
    assert_eq!(tree(dest.path()).len(), 1);
}

#[test]
fn collision_can_abort_the_run() {
    let src = TempDir::new().unwrap();
    let dest = TempDir::new().unwrap();
    src.child("a/IMG_0001.JPG")
        .write_binary(&jpeg_with_capture_time("2024:05:01 12:00:00", b"morning"))
        .unwrap();
    src.child("b/IMG_0001.JPG")
        .write_binary(&jpeg_with_capture_time("2024:05:02 12:00:00", b"evening"))
        .unwrap();

    let result = pipeline(src.path(), dest.path())
        .on_collision(CollisionPolicy::Fail)
        .build()
        .unwrap()
        .run();

    assert!(matches!(
        result,
        Err(ReplicatorError::Manifest(ManifestError::DestinationCollision { .. }))
    ));
    dest.child("2024").assert(predicate::path::missing());
}

#[test]
fn photos_without_capture_time_can_be_skipped() {
    let src = TempDir::new().unwrap();
    let dest = TempDir::new().unwrap();
    card(&src);
    src.child("DCIM/100CANON/SCREENSHOT.JPG")
        .write_binary(&[0xFF, 0xD8, 0xFF, 0xD9])
        .unwrap();

    let aborted = pipeline(src.path(), dest.path()).build().unwrap().run();
    assert!(matches!(aborted, Err(ReplicatorError::Metadata(_))));
    dest.child("2023").assert(predicate::path::missing());

    let result = pipeline(src.path(), dest.path())
        .on_missing_metadata(MetadataPolicy::Skip)
        .build()
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(result.summary.succeeded(), 3);
    assert_eq!(result.skipped_for(SkipReason::MissingMetadata), 1);
}

#[test]
fn include_and_exclude_filter_names() {
    let src = TempDir::new().unwrap();
    let dest = TempDir::new().unwrap();
    card(&src);

    let result = pipeline(src.path(), dest.path())
        .include(Some("IMG_000".to_string()))
        .exclude(Some("0002".to_string()))
        .build()
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(result.candidates, 1);
    dest.child("2023/01/IMG_0001.JPG")
        .assert(predicate::path::is_file());
    dest.child("2023/01/IMG_0002.JPG")
        .assert(predicate::path::missing());
}

#[test]
fn raw_selection_with_fixed_capture_time() {
    let src = TempDir::new().unwrap();
    let dest = TempDir::new().unwrap();
    src.child("DSC_0001.NEF").write_str("raw sensor data").unwrap();
    src.child("DSC_0001.JPG").write_str("preview").unwrap();

    let when = NaiveDate::from_ymd_opt(2020, 8, 9)
        .unwrap()
        .and_hms_opt(10, 0, 0)
        .unwrap();
    let result = pipeline(src.path(), dest.path())
        .selection(FileSelection::Raw)
        .capture_times(Box::new(FixedCaptureTime(when)))
        .build()
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(result.candidates, 1);
    dest.child("2020/08/DSC_0001.NEF")
        .assert("raw sensor data");
    dest.child("2020/08/DSC_0001.JPG")
        .assert(predicate::path::missing());
}

#[test]
fn worker_count_does_not_change_the_result() {
    let src = TempDir::new().unwrap();
    for i in 0..20 {
        src.child(format!("IMG_{:04}.JPG", i))
            .write_binary(&jpeg_with_capture_time(
                &format!("2021:{:02}:10 08:00:00", i % 12 + 1),
                format!("photo {}", i).as_bytes(),
            ))
            .unwrap();
    }

    let mut trees = Vec::new();
    for workers in [1, 3, 8] {
        let dest = TempDir::new().unwrap();
        let result = pipeline(src.path(), dest.path())
            .workers(workers)
            .preserve_times(false)
            .build()
            .unwrap()
            .run()
            .unwrap();
        assert_eq!(result.summary.succeeded(), 20, "workers = {}", workers);
        trees.push(tree(dest.path()));
    }

    assert_eq!(trees[0], trees[1]);
    assert_eq!(trees[1], trees[2]);
}

#[test]
fn dry_run_reports_without_writing() {
    let src = TempDir::new().unwrap();
    let dest = TempDir::new().unwrap();
    card(&src);

    let result = pipeline(src.path(), dest.path())
        .dry_run(true)
        .dry_run_delay(false)
        .build()
        .unwrap()
        .run()
        .unwrap();

    assert!(result.summary.dry_run);
    assert_eq!(result.summary.succeeded(), 3);
    assert!(tree(dest.path()).is_empty());
}

#[test]
fn missing_source_is_a_scan_error() {
    let dest = TempDir::new().unwrap();

    let result = pipeline(Path::new("/nonexistent/card"), dest.path())
        .build()
        .unwrap()
        .run();

    assert!(matches!(result, Err(ReplicatorError::Scan(_))));
}
