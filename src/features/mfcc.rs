// Mel filterbank and cepstral coefficients
//
// Supports the MFCC channels of the spectral feature extractor: a bank of
// triangular filters spaced evenly on the mel scale is applied to a
// magnitude spectrum, and an orthonormal DCT-II of the log filter
// energies yields the cepstral coefficients.

/// Floor applied before taking logs of filter energies
const ENERGY_EPS: f32 = 1e-10;

/// Convert a frequency in Hz to the mel scale
fn hz_to_mel(hz: f32) -> f32 {
    2595.0 * (1.0 + hz / 700.0).log10()
}

/// Convert a mel-scale value back to Hz
fn mel_to_hz(mel: f32) -> f32 {
    700.0 * (10f32.powf(mel / 2595.0) - 1.0)
}

/// Bank of triangular mel-spaced filters over FFT magnitude bins
pub struct MelFilterBank {
    /// One weight row per filter, each covering `fft_size / 2 + 1` bins
    weights: Vec<Vec<f32>>,
}

impl MelFilterBank {
    /// Build a filterbank for the given FFT geometry
    ///
    /// # Arguments
    /// * `sample_rate` - Audio sample rate in Hz
    /// * `fft_size` - FFT length the spectra were computed with
    /// * `num_filters` - Number of triangular filters
    pub fn new(sample_rate: u32, fft_size: usize, num_filters: usize) -> Self {
        let num_bins = fft_size / 2 + 1;
        let nyquist = sample_rate as f32 / 2.0;

        // Filter edge frequencies, evenly spaced on the mel scale
        let mel_max = hz_to_mel(nyquist);
        let edges: Vec<f32> = (0..num_filters + 2)
            .map(|i| mel_to_hz(mel_max * i as f32 / (num_filters + 1) as f32))
            .collect();

        let bin_width = sample_rate as f32 / fft_size as f32;
        let mut weights = Vec::with_capacity(num_filters);

        for filter in 0..num_filters {
            let (lower, center, upper) = (edges[filter], edges[filter + 1], edges[filter + 2]);
            let mut row = vec![0.0f32; num_bins];

            for (bin, weight) in row.iter_mut().enumerate() {
                let freq = bin as f32 * bin_width;
                if freq > lower && freq < center {
                    *weight = (freq - lower) / (center - lower);
                } else if freq >= center && freq < upper {
                    *weight = (upper - freq) / (upper - center);
                }
            }

            weights.push(row);
        }

        Self { weights }
    }

    pub fn num_filters(&self) -> usize {
        self.weights.len()
    }

    /// Apply the bank to a magnitude spectrum, yielding filter energies
    pub fn apply(&self, spectrum: &[f32]) -> Vec<f32> {
        self.weights
            .iter()
            .map(|row| {
                row.iter()
                    .zip(spectrum.iter())
                    .map(|(w, m)| w * m)
                    .sum::<f32>()
            })
            .collect()
    }
}

/// Orthonormal DCT-II of the input, truncated to `count` coefficients
pub fn dct_coefficients(values: &[f32], count: usize) -> Vec<f32> {
    let n = values.len();
    if n == 0 {
        return vec![0.0; count];
    }

    let scale = (2.0 / n as f32).sqrt();
    (0..count)
        .map(|k| {
            let sum: f32 = values
                .iter()
                .enumerate()
                .map(|(i, &x)| {
                    x * (std::f32::consts::PI * k as f32 * (i as f32 + 0.5) / n as f32).cos()
                })
                .sum();
            if k == 0 {
                sum * scale / std::f32::consts::SQRT_2
            } else {
                sum * scale
            }
        })
        .collect()
}

/// Cepstral coefficients of a magnitude spectrum
///
/// # Arguments
/// * `spectrum` - Magnitude spectrum (`fft_size / 2 + 1` bins)
/// * `bank` - Filterbank matching the spectrum's FFT geometry
/// * `count` - Number of coefficients to keep
pub fn mfcc(spectrum: &[f32], bank: &MelFilterBank, count: usize) -> Vec<f32> {
    let log_energies: Vec<f32> = bank
        .apply(spectrum)
        .into_iter()
        .map(|e| e.max(ENERGY_EPS).ln())
        .collect();

    dct_coefficients(&log_energies, count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mel_scale_roundtrip() {
        for hz in [100.0, 440.0, 4000.0, 11025.0] {
            let back = mel_to_hz(hz_to_mel(hz));
            assert!(
                (back - hz).abs() < 0.5,
                "roundtrip of {} Hz drifted to {}",
                hz,
                back
            );
        }
    }

    #[test]
    fn test_filterbank_shape() {
        let bank = MelFilterBank::new(8000, 1024, 40);
        assert_eq!(bank.num_filters(), 40);
        assert_eq!(bank.weights[0].len(), 513);
    }

    #[test]
    fn test_filterbank_weights_bounded() {
        let bank = MelFilterBank::new(8000, 1024, 40);
        for row in &bank.weights {
            for &w in row {
                assert!((0.0..=1.0).contains(&w), "weight {} out of range", w);
            }
            // Every triangle covers at least one bin at this geometry
            assert!(row.iter().any(|&w| w > 0.0));
        }
    }

    #[test]
    fn test_filter_energies_non_negative() {
        let bank = MelFilterBank::new(8000, 256, 20);
        let spectrum = vec![1.0f32; 129];
        let energies = bank.apply(&spectrum);
        assert_eq!(energies.len(), 20);
        assert!(energies.iter().all(|&e| e >= 0.0));
    }

    #[test]
    fn test_dct_of_constant_has_single_component() {
        let values = vec![1.0f32; 16];
        let coeffs = dct_coefficients(&values, 8);

        assert!(coeffs[0] > 0.0, "DC coefficient should be positive");
        for (k, &c) in coeffs.iter().enumerate().skip(1) {
            assert!(
                c.abs() < 1e-4,
                "coefficient {} of a constant signal should vanish, got {}",
                k,
                c
            );
        }
    }

    #[test]
    fn test_mfcc_count() {
        let bank = MelFilterBank::new(8000, 256, 40);
        let spectrum = vec![0.5f32; 129];
        let coeffs = mfcc(&spectrum, &bank, 13);
        assert_eq!(coeffs.len(), 13);
        assert!(coeffs.iter().all(|c| c.is_finite()));
    }
}
