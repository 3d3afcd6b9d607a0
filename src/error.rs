// Error types for dataset preprocessing
//
// This module defines custom error types for metadata parsing and audio
// decoding. Failures are scoped to a single recording: the dataset driver
// logs them and moves on to the next recording rather than aborting the
// whole batch.

use log::error;
use std::fmt;

/// Log a per-recording failure together with the recording it belongs to
///
/// Used by the dataset driver when a recording is skipped. Output rows
/// already written for other recordings are unaffected.
pub fn log_recording_error(err: &dyn std::error::Error, recording: &str) {
    error!("Skipping recording {}: {}", recording, err);
}

/// Metadata descriptor errors
///
/// These cover the XML event descriptors shipped with each recording.
/// Any of them is fatal for that recording only.
#[derive(Debug, Clone, PartialEq)]
pub enum MetadataError {
    /// The descriptor is not well-formed XML
    Xml { reason: String },

    /// A required element or its text content is absent
    MissingField { element: &'static str },

    /// A time value did not parse as a non-negative number
    BadTime { element: &'static str, value: String },

    /// An event ends before it starts
    InvertedSpan { index: usize },

    /// Events are not in chronological order by start time
    Unordered { index: usize },
}

impl fmt::Display for MetadataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataError::Xml { reason } => {
                write!(f, "malformed descriptor XML: {}", reason)
            }
            MetadataError::MissingField { element } => {
                write!(f, "descriptor is missing required element <{}>", element)
            }
            MetadataError::BadTime { element, value } => {
                write!(
                    f,
                    "<{}> value {:?} is not a non-negative number",
                    element, value
                )
            }
            MetadataError::InvertedSpan { index } => {
                write!(f, "event #{} ends before it starts", index)
            }
            MetadataError::Unordered { index } => {
                write!(
                    f,
                    "event #{} starts before its predecessor; events must be chronological",
                    index
                )
            }
        }
    }
}

impl std::error::Error for MetadataError {}

impl From<roxmltree::Error> for MetadataError {
    fn from(err: roxmltree::Error) -> Self {
        MetadataError::Xml {
            reason: err.to_string(),
        }
    }
}

/// Audio decoding errors
///
/// The decoder supports 16-bit and 32-bit integer PCM WAV input only.
#[derive(Debug)]
pub enum AudioError {
    /// File could not be opened or read
    Io { details: String },

    /// WAV container parsed but the sample encoding is unsupported
    UnsupportedFormat { details: String },
}

impl fmt::Display for AudioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AudioError::Io { details } => write!(f, "audio read failed: {}", details),
            AudioError::UnsupportedFormat { details } => {
                write!(f, "unsupported audio format: {}", details)
            }
        }
    }
}

impl std::error::Error for AudioError {}

impl From<std::io::Error> for AudioError {
    fn from(err: std::io::Error) -> Self {
        AudioError::Io {
            details: err.to_string(),
        }
    }
}

impl From<hound::Error> for AudioError {
    fn from(err: hound::Error) -> Self {
        match err {
            hound::Error::IoError(io) => AudioError::Io {
                details: io.to_string(),
            },
            other => AudioError::UnsupportedFormat {
                details: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_error_display() {
        let err = MetadataError::MissingField {
            element: "CLASS_NAME",
        };
        assert!(err.to_string().contains("CLASS_NAME"));

        let err = MetadataError::BadTime {
            element: "STARTSECOND",
            value: "-1.5".to_string(),
        };
        assert!(err.to_string().contains("STARTSECOND"));
        assert!(err.to_string().contains("-1.5"));

        let err = MetadataError::Unordered { index: 3 };
        assert!(err.to_string().contains("#3"));
    }

    #[test]
    fn test_audio_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let audio_err: AudioError = io_err.into();

        match audio_err {
            AudioError::Io { details } => assert!(details.contains("no such file")),
            other => panic!("Expected Io variant, got {:?}", other),
        }
    }

    #[test]
    fn test_error_propagation() {
        fn may_fail() -> Result<(), MetadataError> {
            Err(MetadataError::Unordered { index: 1 })
        }

        fn caller() -> Result<(), MetadataError> {
            may_fail()?;
            Ok(())
        }

        assert!(caller().is_err());
    }
}
