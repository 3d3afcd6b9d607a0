// Output table - append-only CSV of per-segment feature rows
//
// One row per segment: a leading running index, 42 summary statistics
// (median and median absolute deviation for each of the 21 feature
// channels), then target class, sub-frame count, noise level, event id
// and background tag. The file is opened in append mode so repeated runs
// accumulate rows; the header is written at every open and the index
// restarts at zero, which callers needing idempotent re-runs must
// deduplicate externally.

use std::fs::OpenOptions;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::features::FEATURE_CHANNELS;

/// Feature channel names, in matrix row order
pub const CHANNEL_NAMES: [&str; FEATURE_CHANNELS] = [
    "Zero_Crossing_Rate",
    "Energy",
    "Entropy_of_Energy",
    "Spectral_Centroid",
    "Spectral_Spread",
    "Spectral_Entropy",
    "Spectral_Flux",
    "Spectral_Rolloff",
    "MFCCs1",
    "MFCCs2",
    "MFCCs3",
    "MFCCs4",
    "MFCCs5",
    "MFCCs6",
    "MFCCs7",
    "MFCCs8",
    "MFCCs9",
    "MFCCs10",
    "MFCCs11",
    "MFCCs12",
    "MFCCs13",
];

/// All column labels after the unnamed leading index column
pub fn column_labels() -> Vec<String> {
    let mut labels = Vec::with_capacity(FEATURE_CHANNELS * 2 + 5);
    for name in CHANNEL_NAMES {
        labels.push(format!("{}_median", name));
        labels.push(format!("{}_median_absolute_deviation", name));
    }
    for extra in ["target", "frame", "snr", "id", "background"] {
        labels.push(extra.to_string());
    }
    labels
}

/// One output row, before the index column is attached
#[derive(Debug, Clone)]
pub struct FeatureRow {
    /// Median/MAD pairs, one pair per feature channel (42 values)
    pub statistics: Vec<f32>,
    /// Numeric class string for the segment's label
    pub target: &'static str,
    /// Sub-frames the feature extractor produced for this segment
    pub sub_frame_count: usize,
    /// Noise level index of the processed waveform
    pub snr: u32,
    pub id: String,
    pub background: String,
}

/// Append-only CSV writer with a running row index
pub struct TableWriter<W: Write> {
    writer: W,
    next_index: u64,
}

impl TableWriter<BufWriter<std::fs::File>> {
    /// Open (or create) the output file and write the header row
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path.as_ref())?;
        Self::from_writer(BufWriter::new(file))
    }
}

impl<W: Write> TableWriter<W> {
    /// Wrap an arbitrary writer; writes the header immediately
    pub fn from_writer(mut writer: W) -> io::Result<Self> {
        writeln!(writer, ",{}", column_labels().join(","))?;
        writer.flush()?;
        Ok(Self {
            writer,
            next_index: 0,
        })
    }

    /// Rows appended since this writer was opened
    pub fn rows_written(&self) -> u64 {
        self.next_index
    }

    /// Append one row; the row is flushed before returning so interrupted
    /// runs keep every completed row.
    pub fn append(&mut self, row: &FeatureRow) -> io::Result<()> {
        let mut line = String::with_capacity(512);
        line.push_str(&self.next_index.to_string());
        for value in &row.statistics {
            line.push(',');
            line.push_str(&value.to_string());
        }
        line.push(',');
        line.push_str(row.target);
        line.push(',');
        line.push_str(&row.sub_frame_count.to_string());
        line.push(',');
        line.push_str(&row.snr.to_string());
        line.push(',');
        line.push_str(&row.id);
        line.push(',');
        line.push_str(&row.background);

        writeln!(self.writer, "{}", line)?;
        self.writer.flush()?;
        self.next_index += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_row(id: &str) -> FeatureRow {
        FeatureRow {
            statistics: vec![0.5; FEATURE_CHANNELS * 2],
            target: "0",
            sub_frame_count: 3,
            snr: 1,
            id: id.to_string(),
            background: "rain+crowd".to_string(),
        }
    }

    #[test]
    fn test_column_label_count_and_order() {
        let labels = column_labels();
        assert_eq!(labels.len(), 47);
        assert_eq!(labels[0], "Zero_Crossing_Rate_median");
        assert_eq!(labels[1], "Zero_Crossing_Rate_median_absolute_deviation");
        assert_eq!(labels[16], "MFCCs1_median");
        assert_eq!(labels[41], "MFCCs13_median_absolute_deviation");
        assert_eq!(&labels[42..], ["target", "frame", "snr", "id", "background"]);
    }

    #[test]
    fn test_header_and_row_field_counts_match() {
        let mut writer = TableWriter::from_writer(Vec::new()).unwrap();
        writer.append(&sample_row("glass")).unwrap();

        let output = String::from_utf8(writer.writer).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 2);

        // Header leads with an empty cell for the index column
        assert!(lines[0].starts_with(",Zero_Crossing_Rate_median,"));
        let header_fields = lines[0].split(',').count();
        let row_fields = lines[1].split(',').count();
        assert_eq!(header_fields, 48);
        assert_eq!(row_fields, 48);
    }

    #[test]
    fn test_index_column_strictly_increasing_from_zero() {
        let mut writer = TableWriter::from_writer(Vec::new()).unwrap();
        for i in 0..4 {
            writer.append(&sample_row(&format!("id{}", i))).unwrap();
        }
        assert_eq!(writer.rows_written(), 4);

        let output = String::from_utf8(writer.writer).unwrap();
        let indices: Vec<u64> = output
            .lines()
            .skip(1)
            .map(|line| line.split(',').next().unwrap().parse().unwrap())
            .collect();
        assert_eq!(indices, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_reopening_appends_instead_of_overwriting() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");

        {
            let mut writer = TableWriter::open(&path).unwrap();
            writer.append(&sample_row("first")).unwrap();
        }
        {
            let mut writer = TableWriter::open(&path).unwrap();
            writer.append(&sample_row("second")).unwrap();
        }

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        // Two headers and two rows: re-runs accumulate, with a fresh
        // header and restarted index each open
        assert_eq!(lines.len(), 4);
        assert!(lines[1].contains("first"));
        assert!(lines[3].contains("second"));
    }

    #[test]
    fn test_row_carries_trailing_metadata_columns() {
        let mut writer = TableWriter::from_writer(Vec::new()).unwrap();
        let mut row = sample_row("gunshots");
        row.target = "1";
        row.snr = 4;
        writer.append(&row).unwrap();

        let output = String::from_utf8(writer.writer).unwrap();
        let fields: Vec<&str> = output.lines().nth(1).unwrap().split(',').collect();
        assert_eq!(fields[43], "1"); // target
        assert_eq!(fields[44], "3"); // sub-frame count
        assert_eq!(fields[45], "4"); // snr
        assert_eq!(fields[46], "gunshots");
        assert_eq!(fields[47], "rain+crowd");
    }
}
