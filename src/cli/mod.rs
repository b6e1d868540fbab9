//! # CLI Module
//!
//! Command-line interface for the photo replicator.
//!
//! ## Usage
//! ```bash
//! # Copy every JPEG from a card into ~/Pictures/YYYY/MM
//! photo-replicate --src /media/card/DCIM --dest ~/Pictures
//!
//! # Raw files too, eight workers, remove copies that fail verification
//! photo-replicate --src ./in --dest ./out --both --workers 8 --cleanup
//!
//! # See what would happen, as JSON
//! photo-replicate --src ./in --dest ./out --dry-run --output json
//! ```

use clap::{ArgAction, Parser, ValueEnum};
use console::{style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use photo_replicator::core::hasher::DigestAlgorithm;
use photo_replicator::core::manifest::{CollisionPolicy, MetadataPolicy, SkipReason};
use photo_replicator::core::pipeline::{Pipeline, PipelineResult};
use photo_replicator::core::progress::format_duration;
use photo_replicator::core::scanner::FileSelection;
use photo_replicator::error::Result;
use photo_replicator::events::{Event, EventChannel, ManifestEvent, ReplicateEvent, ScanEvent};
use std::path::PathBuf;
use std::thread;
use std::time::Duration;
use tracing::error;

/// Photo Replicator - copy photos into a capture-date tree and verify them
#[derive(Parser, Debug)]
#[command(name = "photo-replicate")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Source directory
    #[arg(long = "src")]
    src: PathBuf,

    /// Destination root; photos land in DEST/YYYY/MM
    #[arg(long = "dest")]
    dest: PathBuf,

    /// Only pick up file names containing this
    #[arg(long)]
    include: Option<String>,

    /// Skip file names containing this
    #[arg(long)]
    exclude: Option<String>,

    /// JPEG files only (default)
    #[arg(long, group = "kind")]
    jpg: bool,

    /// Camera raw files only
    #[arg(long, group = "kind")]
    raw: bool,

    /// JPEG and camera raw files
    #[arg(long, group = "kind")]
    both: bool,

    /// Remove destination files that fail to copy or verify
    #[arg(long)]
    cleanup: bool,

    /// Number of copy workers
    #[arg(long, default_value_t = 3)]
    workers: usize,

    /// Interval between progress lines
    #[arg(long, default_value = "1s", value_parser = humantime::parse_duration)]
    tick: Duration,

    /// Interval between rate recalculations
    #[arg(long, default_value = "1s", value_parser = humantime::parse_duration)]
    update: Duration,

    /// Add a random 0-2s delay per file in dry runs
    #[arg(long, action = ArgAction::Set, default_value_t = true)]
    add_delay: bool,

    /// Overwrite destination files that already exist
    #[arg(long)]
    overwrite: bool,

    /// Plan and report without copying anything
    #[arg(long)]
    dry_run: bool,

    /// Skip photos without a capture time instead of aborting
    #[arg(long)]
    skip_missing_metadata: bool,

    /// Abort when two photos map to the same destination
    #[arg(long)]
    fail_on_collision: bool,

    /// Digest used to verify copies
    #[arg(long, default_value = "md5")]
    digest: Digest,

    /// Leave copied files with the time of copying
    #[arg(long)]
    no_preserve_times: bool,

    /// Follow symbolic links while scanning
    #[arg(long)]
    follow_symlinks: bool,

    /// Include hidden files and directories
    #[arg(long)]
    include_hidden: bool,

    /// Output format for the final summary
    #[arg(short, long, default_value = "pretty")]
    output: OutputFormat,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Digest {
    /// MD5 (default)
    Md5,
    /// 128-bit xxh3, faster on large files
    Xxh3,
}

impl From<Digest> for DigestAlgorithm {
    fn from(digest: Digest) -> Self {
        match digest {
            Digest::Md5 => DigestAlgorithm::Md5,
            Digest::Xxh3 => DigestAlgorithm::Xxh3,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable output with colors
    Pretty,
    /// JSON output for scripting
    Json,
}

impl Cli {
    fn selection(&self) -> FileSelection {
        if self.both {
            FileSelection::Both
        } else if self.raw {
            FileSelection::Raw
        } else {
            FileSelection::Jpeg
        }
    }
}

/// Run the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    photo_replicator::init_tracing();

    let pipeline = Pipeline::builder()
        .source(&cli.src)
        .destination(&cli.dest)
        .selection(cli.selection())
        .include(cli.include.clone())
        .exclude(cli.exclude.clone())
        .follow_symlinks(cli.follow_symlinks)
        .include_hidden(cli.include_hidden)
        .on_missing_metadata(if cli.skip_missing_metadata {
            MetadataPolicy::Skip
        } else {
            MetadataPolicy::Abort
        })
        .on_collision(if cli.fail_on_collision {
            CollisionPolicy::Fail
        } else {
            CollisionPolicy::Disambiguate
        })
        .workers(cli.workers)
        .overwrite(cli.overwrite)
        .cleanup_on_error(cli.cleanup)
        .dry_run(cli.dry_run)
        .dry_run_delay(cli.add_delay)
        .preserve_times(!cli.no_preserve_times)
        .digest(cli.digest.into())
        .tick(cli.tick)
        .update(cli.update)
        .build()?;

    let term = Term::stderr();
    if matches!(cli.output, OutputFormat::Pretty) {
        term.write_line(&format!(
            "{} {}{}",
            style("Photo Replicator").bold().cyan(),
            style(concat!("v", env!("CARGO_PKG_VERSION"))).dim(),
            if cli.dry_run {
                style(" (dry run)").yellow().to_string()
            } else {
                String::new()
            }
        ))
        .ok();
    }

    let (sender, receiver) = EventChannel::new();

    // Spinner while the manifest is built; replication reports through the log.
    let spinner = if matches!(cli.output, OutputFormat::Pretty) {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            pb.set_style(style);
        }
        pb.enable_steady_tick(Duration::from_millis(100));
        Some(pb)
    } else {
        None
    };

    let spinner_clone = spinner.clone();
    let event_thread = thread::spawn(move || {
        for event in receiver.iter() {
            let Some(ref pb) = spinner_clone else {
                continue;
            };
            match event {
                Event::Scan(ScanEvent::Started { root }) => {
                    pb.set_message(format!("scanning {}", root.display()));
                }
                Event::Manifest(ManifestEvent::Progress(p)) => {
                    pb.set_message(format!(
                        "planning {}/{} {}",
                        p.inspected,
                        p.total,
                        p.current_path
                            .file_name()
                            .unwrap_or_default()
                            .to_string_lossy()
                    ));
                }
                Event::Replicate(ReplicateEvent::Started { .. }) => pb.finish_and_clear(),
                _ => {}
            }
        }
    });

    let outcome = pipeline.run_with_events(&sender);

    drop(sender);
    event_thread.join().ok();
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    let result = outcome?;
    match cli.output {
        OutputFormat::Pretty => print_pretty_results(&Term::stdout(), &result),
        OutputFormat::Json => print_json_results(&result),
    }

    Ok(())
}

fn print_pretty_results(term: &Term, result: &PipelineResult) {
    let summary = &result.summary;

    term.write_line("").ok();
    let (mark, heading) = match (summary.has_failures(), summary.dry_run) {
        (true, _) => (style("!").yellow().bold(), "Replication finished with errors"),
        (false, true) => (style("✓").green().bold(), "Dry run complete"),
        (false, false) => (style("✓").green().bold(), "Replication complete"),
    };
    term.write_line(&format!("{} {}", mark, heading)).ok();
    term.write_line("").ok();

    term.write_line(&format!(
        "  {} files found, {} queued",
        style(result.candidates).cyan(),
        style(result.planned).cyan()
    ))
    .ok();
    term.write_line(&format!(
        "  {} copied ({}) in {}",
        style(summary.succeeded()).green(),
        format_bytes(summary.bytes_copied),
        format_duration(Duration::from_millis(result.duration_ms))
    ))
    .ok();
    if summary.failed > 0 {
        term.write_line(&format!("  {} failed", style(summary.failed).red()))
            .ok();
    }

    for reason in [
        SkipReason::DestinationExists,
        SkipReason::DuplicateContent,
        SkipReason::MissingMetadata,
    ] {
        let count = result.skipped_for(reason);
        if count > 0 {
            term.write_line(&format!(
                "  {} skipped: {}",
                style(count).yellow(),
                reason
            ))
            .ok();
        }
    }

    if !summary.failures.is_empty() {
        term.write_line("").ok();
        term.write_line(&format!("{}", style("Failures:").bold().underlined()))
            .ok();
        for failure in &summary.failures {
            term.write_line(&format!(
                "  {} {}",
                style(&failure.kind).red(),
                failure.message
            ))
            .ok();
        }
    }
}

fn print_json_results(result: &PipelineResult) {
    match serde_json::to_string_pretty(result) {
        Ok(json) => println!("{}", json),
        Err(e) => error!("failed to serialize summary: {}", e),
    }
}

fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}
