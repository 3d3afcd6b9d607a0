// Short-time feature extraction for segment classification
//
// Each fixed-length segment is diced into overlapping sub-frames and every
// sub-frame is reduced to 21 feature channels: zero-crossing rate, energy,
// entropy of energy, spectral centroid, spread, entropy, flux and rolloff,
// plus 13 mel-frequency cepstral coefficients. The result is a channel ×
// sub-frame matrix the dataset driver then reduces to per-channel medians.
//
// The extractor sits behind a trait so the driver can be fed by any
// routine with the same frame/sub-frame contract; the built-in
// implementation is the rustfft-based one below.

use rustfft::{num_complex::Complex, FftPlanner};
use std::sync::{Arc, Mutex};

pub mod mfcc;
pub mod stats;

use mfcc::MelFilterBank;

/// Number of feature channels every extractor must produce
pub const FEATURE_CHANNELS: usize = 21;

/// Number of cepstral coefficients among the channels
const MFCC_COUNT: usize = 13;

/// Triangular filters in the mel bank feeding the cepstral channels
const MEL_FILTERS: usize = 40;

/// Blocks used by the two entropy channels
const ENTROPY_BLOCKS: usize = 10;

/// Spectral rolloff threshold (85% of spectral energy)
const ROLLOFF_THRESHOLD: f32 = 0.85;

/// Guard against division by zero in normalized quantities
const EPS: f32 = 1e-10;

/// Per-sub-frame feature matrix producer
///
/// `extract` dices `frame` into sub-frames of `window` samples advancing
/// by `step`, and returns one row per feature channel with one value per
/// sub-frame. Rows beyond [`FEATURE_CHANNELS`] are ignored by callers.
pub trait FeatureExtractor {
    fn extract(&self, frame: &[f32], sample_rate: u32, window: usize, step: usize)
        -> Vec<Vec<f32>>;
}

/// Built-in rustfft-based implementation of the 21 feature channels
pub struct SpectralFeatureExtractor {
    fft_planner: Arc<Mutex<FftPlanner<f32>>>,
}

impl SpectralFeatureExtractor {
    pub fn new() -> Self {
        Self {
            fft_planner: Arc::new(Mutex::new(FftPlanner::new())),
        }
    }

    /// Compute magnitude spectrum of one Hann-windowed sub-frame
    ///
    /// # Returns
    /// Magnitude spectrum (size = window / 2 + 1)
    fn compute_magnitude_spectrum(&self, sub_frame: &[f32], hann: &[f32]) -> Vec<f32> {
        let mut buffer: Vec<Complex<f32>> = sub_frame
            .iter()
            .zip(hann.iter())
            .map(|(sample, window_val)| Complex::new(sample * window_val, 0.0))
            .collect();

        let mut planner = self.fft_planner.lock().unwrap();
        let fft = planner.plan_fft_forward(buffer.len());
        fft.process(&mut buffer);

        buffer[..sub_frame.len() / 2 + 1]
            .iter()
            .map(|c| c.norm())
            .collect()
    }
}

impl Default for SpectralFeatureExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FeatureExtractor for SpectralFeatureExtractor {
    fn extract(
        &self,
        frame: &[f32],
        sample_rate: u32,
        window: usize,
        step: usize,
    ) -> Vec<Vec<f32>> {
        let window = window.max(2);
        let step = step.max(1);

        let mut matrix: Vec<Vec<f32>> = vec![Vec::new(); FEATURE_CHANNELS];
        if frame.len() < window {
            return matrix;
        }

        // Pre-compute Hann window to reduce spectral leakage
        let hann: Vec<f32> = (0..window)
            .map(|i| {
                0.5 * (1.0
                    - ((2.0 * std::f32::consts::PI * i as f32) / (window as f32 - 1.0)).cos())
            })
            .collect();
        let mel_bank = MelFilterBank::new(sample_rate, window, MEL_FILTERS);

        let mut prev_normalized: Option<Vec<f32>> = None;
        let mut pos = 0usize;

        while pos + window <= frame.len() {
            let sub_frame = &frame[pos..pos + window];
            let spectrum = self.compute_magnitude_spectrum(sub_frame, &hann);

            matrix[0].push(zero_crossing_rate(sub_frame));
            matrix[1].push(energy(sub_frame));
            matrix[2].push(energy_entropy(sub_frame));

            let centroid = spectral_centroid(&spectrum, sample_rate, window);
            matrix[3].push(centroid);
            matrix[4].push(spectral_spread(&spectrum, sample_rate, window, centroid));
            matrix[5].push(spectral_entropy(&spectrum));

            let normalized = normalize_spectrum(&spectrum);
            matrix[6].push(match prev_normalized {
                Some(ref prev) => spectral_flux(&normalized, prev),
                None => 0.0,
            });
            matrix[7].push(spectral_rolloff(&spectrum, sample_rate, window));

            let cepstral = mfcc::mfcc(&spectrum, &mel_bank, MFCC_COUNT);
            for (channel, value) in cepstral.into_iter().enumerate() {
                matrix[8 + channel].push(value);
            }

            prev_normalized = Some(normalized);
            pos += step;
        }

        matrix
    }
}

/// Zero-crossing rate: fraction of adjacent sample pairs changing sign
fn zero_crossing_rate(sub_frame: &[f32]) -> f32 {
    if sub_frame.len() < 2 {
        return 0.0;
    }

    let mut crossings = 0;
    for i in 1..sub_frame.len() {
        if (sub_frame[i] >= 0.0) != (sub_frame[i - 1] >= 0.0) {
            crossings += 1;
        }
    }

    crossings as f32 / (sub_frame.len() - 1) as f32
}

/// Mean signal power
fn energy(sub_frame: &[f32]) -> f32 {
    if sub_frame.is_empty() {
        return 0.0;
    }
    sub_frame.iter().map(|&x| x * x).sum::<f32>() / sub_frame.len() as f32
}

/// Entropy of the energy distribution across fixed time blocks
///
/// Low for a single burst, high for energy spread evenly over the
/// sub-frame.
fn energy_entropy(sub_frame: &[f32]) -> f32 {
    let total: f32 = sub_frame.iter().map(|&x| x * x).sum();
    if total < EPS {
        return 0.0;
    }

    let block_len = (sub_frame.len() / ENTROPY_BLOCKS).max(1);
    let mut entropy = 0.0;
    for block in sub_frame.chunks(block_len) {
        let share = block.iter().map(|&x| x * x).sum::<f32>() / total;
        if share > EPS {
            entropy -= share * share.log2();
        }
    }
    entropy
}

/// Spectral centroid in Hz (weighted mean frequency)
fn spectral_centroid(spectrum: &[f32], sample_rate: u32, window: usize) -> f32 {
    let bin_width = sample_rate as f32 / window as f32;

    let weighted_sum: f32 = spectrum
        .iter()
        .enumerate()
        .map(|(i, &mag)| i as f32 * bin_width * mag)
        .sum();
    let magnitude_sum: f32 = spectrum.iter().sum();

    if magnitude_sum > EPS {
        weighted_sum / magnitude_sum
    } else {
        0.0
    }
}

/// Spectral spread in Hz: magnitude-weighted deviation around the centroid
fn spectral_spread(spectrum: &[f32], sample_rate: u32, window: usize, centroid: f32) -> f32 {
    let bin_width = sample_rate as f32 / window as f32;
    let magnitude_sum: f32 = spectrum.iter().sum();
    if magnitude_sum < EPS {
        return 0.0;
    }

    let variance: f32 = spectrum
        .iter()
        .enumerate()
        .map(|(i, &mag)| {
            let freq = i as f32 * bin_width;
            (freq - centroid) * (freq - centroid) * mag
        })
        .sum::<f32>()
        / magnitude_sum;

    variance.sqrt()
}

/// Entropy of the spectral energy distribution across fixed bands
fn spectral_entropy(spectrum: &[f32]) -> f32 {
    let total: f32 = spectrum.iter().map(|&m| m * m).sum();
    if total < EPS {
        return 0.0;
    }

    let block_len = (spectrum.len() / ENTROPY_BLOCKS).max(1);
    let mut entropy = 0.0;
    for block in spectrum.chunks(block_len) {
        let share = block.iter().map(|&m| m * m).sum::<f32>() / total;
        if share > EPS {
            entropy -= share * share.log2();
        }
    }
    entropy
}

/// Scale a spectrum to unit sum for flux comparison
fn normalize_spectrum(spectrum: &[f32]) -> Vec<f32> {
    let sum: f32 = spectrum.iter().sum();
    if sum < EPS {
        return vec![0.0; spectrum.len()];
    }
    spectrum.iter().map(|&m| m / sum).collect()
}

/// Spectral flux: squared change between consecutive normalized spectra
fn spectral_flux(current: &[f32], previous: &[f32]) -> f32 {
    current
        .iter()
        .zip(previous.iter())
        .map(|(c, p)| (c - p) * (c - p))
        .sum()
}

/// Spectral rolloff in Hz: frequency below which 85% of energy lies
fn spectral_rolloff(spectrum: &[f32], sample_rate: u32, window: usize) -> f32 {
    let total_energy: f32 = spectrum.iter().map(|&m| m * m).sum();
    if total_energy < EPS {
        return 0.0;
    }

    let threshold = ROLLOFF_THRESHOLD * total_energy;
    let bin_width = sample_rate as f32 / window as f32;

    let mut cumulative = 0.0;
    for (i, &mag) in spectrum.iter().enumerate() {
        cumulative += mag * mag;
        if cumulative >= threshold {
            return i as f32 * bin_width;
        }
    }

    (spectrum.len() - 1) as f32 * bin_width
}
