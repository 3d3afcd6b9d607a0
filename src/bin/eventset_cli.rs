use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use eventset::config::{AppConfig, SegmenterConfig};
use eventset::dataset::stats::EventStats;
use eventset::dataset::{self, BatchProgress, DatasetLayout, DatasetProcessor};
use eventset::segment::Policy;
use eventset::SpectralFeatureExtractor;
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(
    name = "eventset_cli",
    about = "Segment labeled audio-event recordings into a feature table"
)]
struct Cli {
    /// Optional JSON config overriding the default parameters
    #[arg(long)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Process a dataset into per-segment feature rows
    Process {
        /// Dataset root containing the descriptors and a sounds/ directory
        #[arg(long)]
        root: PathBuf,
        /// Exclusive upper recording index (recordings 1..wav_count)
        #[arg(long)]
        wav_count: u32,
        /// Noise levels per recording (1..=snr_range)
        #[arg(long)]
        snr_range: u32,
        /// Output table path, appended to if it exists
        #[arg(long)]
        output: PathBuf,
        /// Window classification policy (overrides the config file)
        #[arg(long)]
        policy: Option<PolicyArg>,
        /// Write the event statistics as JSON next to the textual report
        #[arg(long)]
        stats_json: Option<PathBuf>,
    },
    /// Extract one recording's whole events, gap-filled with background
    Events {
        /// Path to the recording's XML descriptor
        #[arg(long)]
        descriptor: PathBuf,
        /// Path to the recording's waveform
        #[arg(long)]
        waveform: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PolicyArg {
    Strict,
    Permissive,
}

impl From<PolicyArg> for Policy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Strict => Policy::Strict,
            PolicyArg::Permissive => Policy::Permissive,
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = cli
        .config
        .as_ref()
        .map(AppConfig::load_from_file)
        .unwrap_or_default();

    match cli.command {
        Commands::Process {
            root,
            wav_count,
            snr_range,
            output,
            policy,
            stats_json,
        } => run_process(config, root, wav_count, snr_range, output, policy, stats_json),
        Commands::Events {
            descriptor,
            waveform,
        } => run_events(config, descriptor, waveform),
    }
}

fn run_process(
    mut config: AppConfig,
    root: PathBuf,
    wav_count: u32,
    snr_range: u32,
    output: PathBuf,
    policy: Option<PolicyArg>,
    stats_json: Option<PathBuf>,
) -> Result<ExitCode> {
    if let Some(arg) = policy {
        let policy = Policy::from(arg);
        config.segmentation = SegmenterConfig::for_policy(policy);
    }

    let layout = DatasetLayout::new(root);
    let processor = DatasetProcessor::new(config, SpectralFeatureExtractor::new());

    let started = Instant::now();
    let report = processor.process(&layout, wav_count, snr_range, &output, &mut |progress| {
        render_progress(progress);
    })?;
    println!();

    println!("Elapsed time: {:.1}s", started.elapsed().as_secs_f64());
    println!(
        "Pairs processed: {}, skipped: {}, rows written: {}",
        report.pairs_processed, report.pairs_skipped, report.rows_written
    );
    println!();
    print!("{}", report.stats.summary());

    if let Some(path) = stats_json {
        let json = serde_json::to_string_pretty(&report.stats)?;
        std::fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
    }

    Ok(ExitCode::from(0))
}

fn run_events(config: AppConfig, descriptor: PathBuf, waveform: PathBuf) -> Result<ExitCode> {
    let mut stats = EventStats::new();
    let (events, recording) =
        dataset::load_recording_events(&descriptor, &waveform, &config, &mut stats)?;

    for event in &events {
        let summary = EventSummaryPayload {
            id: &event.id,
            target: event.label.class_index(),
            start_seconds: event.start_seconds,
            stop_seconds: event.stop_seconds,
            samples: event.samples.as_ref().map(Vec::len).unwrap_or(0),
            background: &event.background,
        };
        println!("{}", serde_json::to_string(&summary)?);
    }

    eprintln!(
        "Extracted {} events from {:.1}s of audio at {} Hz",
        events.len(),
        recording.duration_seconds(),
        recording.sample_rate
    );
    eprint!("{}", stats.summary());

    Ok(ExitCode::from(0))
}

/// Render a textual progress bar on stdout, rewriting the same line
fn render_progress(progress: BatchProgress) {
    const BAR_LENGTH: usize = 100;

    let fraction = progress.fraction().clamp(0.0, 1.0);
    let filled = (BAR_LENGTH as f64 * fraction).round() as usize;
    let status = if fraction >= 1.0 { " Done" } else { "" };

    print!(
        "\rPercent: [{}{}] {}%{}",
        "#".repeat(filled),
        "-".repeat(BAR_LENGTH - filled),
        (fraction * 100.0).round() as u32,
        status
    );
    let _ = std::io::stdout().flush();
}

#[derive(Serialize)]
struct EventSummaryPayload<'a> {
    id: &'a str,
    target: &'a str,
    start_seconds: f64,
    stop_seconds: f64,
    samples: usize,
    background: &'a str,
}
