// Dataset driver - batch conversion of recordings into feature rows
//
// Iterates recordings × noise levels, resolves the descriptor and
// waveform paths for each pair, runs the sliding-window segmentation,
// reduces each segment's feature matrix to median/MAD pairs, and appends
// one row per segment to the output table. A failing recording is logged
// and skipped; rows already written stay on disk.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::audio::{self, Recording};
use crate::config::AppConfig;
use crate::error::log_recording_error;
use crate::features::stats::{median, median_absolute_deviation};
use crate::features::{FeatureExtractor, FEATURE_CHANNELS};
use crate::metadata::{self, CatalogEvent, SegmentedFrame};
use crate::segment::{background, Segmenter};

pub mod stats;
pub mod table;

use self::stats::EventStats;
use self::table::{FeatureRow, TableWriter};

/// Directory layout of the source dataset
///
/// Recording `i` keeps its descriptor at `<root>/<i:05>.xml` and its
/// waveforms at `<root>/sounds/<i:05>_<snr>.wav`, one file per noise
/// level.
pub struct DatasetLayout {
    root: PathBuf,
}

impl DatasetLayout {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn descriptor_path(&self, recording: u32) -> PathBuf {
        self.root.join(format!("{:05}.xml", recording))
    }

    pub fn waveform_path(&self, recording: u32, snr: u32) -> PathBuf {
        self.root
            .join("sounds")
            .join(format!("{:05}_{}.wav", recording, snr))
    }
}

/// Suffix identifying one (recording, noise level) waveform in output ids
///
/// The last 8 characters of the waveform's file stem, e.g. `00001_1`.
pub fn recording_suffix(path: &Path) -> String {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();
    let chars: Vec<char> = stem.chars().collect();
    let start = chars.len().saturating_sub(8);
    chars[start..].iter().collect()
}

/// Progress through the batch, one tick per (recording, noise level) pair
#[derive(Debug, Clone, Copy)]
pub struct BatchProgress {
    pub completed: usize,
    pub total: usize,
}

impl BatchProgress {
    /// Fraction of the batch finished, in [0, 1]
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        self.completed as f64 / self.total as f64
    }
}

/// Outcome of one batch run
#[derive(Debug, Default)]
pub struct BatchReport {
    /// (recording, noise level) pairs fully processed
    pub pairs_processed: usize,
    /// Pairs skipped after a metadata or audio failure
    pub pairs_skipped: usize,
    /// Rows appended to the output table
    pub rows_written: u64,
    /// Catalog event statistics accumulated while parsing
    pub stats: EventStats,
}

/// Batch driver tying segmentation, feature extraction and output together
pub struct DatasetProcessor<E: FeatureExtractor> {
    config: AppConfig,
    extractor: E,
}

impl<E: FeatureExtractor> DatasetProcessor<E> {
    pub fn new(config: AppConfig, extractor: E) -> Self {
        Self { config, extractor }
    }

    /// Process recordings `1..wav_count` at noise levels `1..=snr_range`
    ///
    /// # Arguments
    /// * `layout` - Source dataset layout
    /// * `wav_count` - Exclusive upper recording index
    /// * `snr_range` - Number of noise levels per recording
    /// * `output` - Output table path (opened in append mode)
    /// * `progress` - Invoked once per pair with the batch fraction
    pub fn process(
        &self,
        layout: &DatasetLayout,
        wav_count: u32,
        snr_range: u32,
        output: &Path,
        progress: &mut dyn FnMut(BatchProgress),
    ) -> Result<BatchReport> {
        let mut writer = TableWriter::open(output)
            .with_context(|| format!("opening output table {}", output.display()))?;

        let mut report = BatchReport::default();
        let total = wav_count.saturating_sub(1) as usize * snr_range as usize;
        let mut completed = 0usize;

        for recording_index in 1..wav_count {
            for snr in 1..=snr_range {
                match self.process_pair(layout, recording_index, snr, &mut writer, &mut report.stats)
                {
                    Ok(rows) => {
                        report.pairs_processed += 1;
                        tracing::debug!(
                            "[Dataset] Recording {:05} snr {}: {} rows",
                            recording_index,
                            snr,
                            rows
                        );
                    }
                    Err(err) => {
                        report.pairs_skipped += 1;
                        log_recording_error(
                            err.as_ref(),
                            &format!("{:05} (snr {})", recording_index, snr),
                        );
                    }
                }

                completed += 1;
                progress(BatchProgress { completed, total });
            }
        }

        report.rows_written = writer.rows_written();
        tracing::info!(
            "[Dataset] Batch done: {} pairs processed, {} skipped, {} rows",
            report.pairs_processed,
            report.pairs_skipped,
            report.rows_written
        );

        Ok(report)
    }

    /// Process one (recording, noise level) pair
    fn process_pair(
        &self,
        layout: &DatasetLayout,
        recording_index: u32,
        snr: u32,
        writer: &mut TableWriter<std::io::BufWriter<std::fs::File>>,
        stats: &mut EventStats,
    ) -> Result<usize> {
        let descriptor_path = layout.descriptor_path(recording_index);
        let waveform_path = layout.waveform_path(recording_index, snr);

        let descriptor = std::fs::read_to_string(&descriptor_path)
            .with_context(|| format!("reading {}", descriptor_path.display()))?;
        let metadata = metadata::parse_descriptor(&descriptor)
            .with_context(|| format!("parsing {}", descriptor_path.display()))?;
        let recording = audio::decode_wav(&waveform_path)
            .with_context(|| format!("decoding {}", waveform_path.display()))?;

        for event in &metadata.events {
            stats.record(event.label, event.duration());
        }

        let suffix = recording_suffix(&waveform_path);
        let segmenter = Segmenter::new(recording.sample_rate, &self.config.segmentation);
        let frames = segmenter.segment(
            &recording,
            &metadata.events,
            &format!("other{}", suffix),
            &metadata.background,
        );

        let rows = frames.len();
        for frame in frames {
            let row = self.reduce_frame(&frame, recording.sample_rate, snr);
            writer.append(&row).with_context(|| {
                format!("appending row for recording {:05}", recording_index)
            })?;
        }

        Ok(rows)
    }

    /// Reduce one segment's feature matrix to a table row
    fn reduce_frame(&self, frame: &SegmentedFrame, sample_rate: u32, snr: u32) -> FeatureRow {
        let window = ((self.config.features.window_seconds * sample_rate as f64).round()
            as usize)
            .max(2);
        let step =
            ((self.config.features.step_seconds * sample_rate as f64).round() as usize).max(1);

        let matrix = self
            .extractor
            .extract(&frame.samples, sample_rate, window, step);
        let sub_frame_count = matrix.first().map(Vec::len).unwrap_or(0);

        let mut statistics = Vec::with_capacity(FEATURE_CHANNELS * 2);
        for channel in 0..FEATURE_CHANNELS {
            let row = matrix.get(channel).map(Vec::as_slice).unwrap_or(&[]);
            statistics.push(median(row));
            statistics.push(median_absolute_deviation(row));
        }

        FeatureRow {
            statistics,
            target: frame.label.class_index(),
            sub_frame_count,
            snr,
            id: frame.id.clone(),
            background: frame.background.clone(),
        }
    }
}

/// Whole-event extraction for one recording pair
///
/// Diagnostic path: loads the descriptor and waveform, extracts the raw
/// samples of every catalog event, and fills the gaps with synthetic
/// background events. Event statistics for everything extracted are
/// recorded into `stats`.
pub fn load_recording_events(
    descriptor_path: &Path,
    waveform_path: &Path,
    config: &AppConfig,
    stats: &mut EventStats,
) -> Result<(Vec<CatalogEvent>, Recording)> {
    let descriptor = std::fs::read_to_string(descriptor_path)
        .with_context(|| format!("reading {}", descriptor_path.display()))?;
    let metadata = metadata::parse_descriptor(&descriptor)
        .with_context(|| format!("parsing {}", descriptor_path.display()))?;
    let recording = audio::decode_wav(waveform_path)
        .with_context(|| format!("decoding {}", waveform_path.display()))?;

    let suffix = recording_suffix(waveform_path);
    let events = background::extract_events(metadata, &recording, &suffix, &config.background);

    for event in &events {
        stats.record(event.label, event.duration());
    }

    Ok((events, recording))
}
