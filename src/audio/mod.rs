// Audio decoding - WAV input for the preprocessing pipeline
//
// Decodes a waveform file into a 1-D f32 sample sequence plus its sample
// rate. Only 16-bit and 32-bit integer PCM are accepted; anything else is
// an unsupported format the caller skips. Multi-channel input is averaged
// per sample frame so downstream code always sees a mono sequence.

use std::path::Path;

use crate::error::AudioError;

/// Decoded audio for one recording
#[derive(Debug, Clone)]
pub struct Recording {
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Mono samples normalized to [-1.0, 1.0)
    pub samples: Vec<f32>,
}

impl Recording {
    /// Recording length in seconds
    pub fn duration_seconds(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Decode a WAV file into a mono sample sequence
///
/// # Arguments
/// * `path` - Path to the waveform file
///
/// # Returns
/// * `Ok(Recording)` - Sample rate and normalized mono samples
/// * `Err(AudioError)` - I/O failure or unsupported sample encoding
pub fn decode_wav<P: AsRef<Path>>(path: P) -> Result<Recording, AudioError> {
    let mut reader = hound::WavReader::open(path.as_ref())?;
    let spec = reader.spec();

    let interleaved: Vec<f32> = match (spec.sample_format, spec.bits_per_sample) {
        (hound::SampleFormat::Int, 16) => reader
            .samples::<i16>()
            .map(|sample| sample.map(|value| value as f32 / 32768.0))
            .collect::<Result<_, _>>()?,
        (hound::SampleFormat::Int, 32) => reader
            .samples::<i32>()
            .map(|sample| sample.map(|value| value as f32 / 2147483648.0))
            .collect::<Result<_, _>>()?,
        (format, bits) => {
            return Err(AudioError::UnsupportedFormat {
                details: format!(
                    "{:?} {}-bit in {} (expected 16- or 32-bit integer PCM)",
                    format,
                    bits,
                    path.as_ref().display()
                ),
            });
        }
    };

    let samples = flatten_channels(interleaved, spec.channels);

    Ok(Recording {
        sample_rate: spec.sample_rate,
        samples,
    })
}

/// Collapse interleaved channels into one mono sequence
///
/// Single-channel input is returned as-is; multi-channel frames are
/// averaged.
fn flatten_channels(interleaved: Vec<f32>, channels: u16) -> Vec<f32> {
    if channels <= 1 {
        return interleaved;
    }

    let channels = channels as usize;
    let frame_count = interleaved.len() / channels;
    let mut mono = Vec::with_capacity(frame_count);

    for frame_idx in 0..frame_count {
        let frame = &interleaved[frame_idx * channels..(frame_idx + 1) * channels];
        mono.push(frame.iter().sum::<f32>() / channels as f32);
    }

    mono
}
