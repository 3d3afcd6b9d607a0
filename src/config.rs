//! Configuration management for the preprocessing pipeline
//!
//! This module provides runtime configuration loading from JSON files,
//! enabling parameter sweeps without recompilation. Window geometry,
//! tolerance, background synthesis spacing, and the feature sub-frame
//! grid can all be adjusted via the config file.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::segment::Policy;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub segmentation: SegmenterConfig,
    pub background: BackgroundConfig,
    pub features: SubFrameConfig,
}

/// Sliding-window segmentation parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmenterConfig {
    /// Window length in seconds
    pub frame_size_seconds: f64,
    /// Advance between consecutive windows in seconds
    pub step_seconds: f64,
    /// Required overlap fraction on each window edge for a positive label
    pub tolerance: f64,
    /// Branch predicate table used to classify each window
    pub policy: Policy,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self::strict()
    }
}

impl SegmenterConfig {
    /// Three-way partition: background / positive / dropped, tolerance 0.2
    pub fn strict() -> Self {
        Self {
            frame_size_seconds: 0.300,
            step_seconds: 0.150,
            tolerance: Policy::Strict.default_tolerance(),
            policy: Policy::Strict,
        }
    }

    /// Two-way partition: every window is labeled, tolerance 0
    pub fn permissive() -> Self {
        Self {
            frame_size_seconds: 0.300,
            step_seconds: 0.150,
            tolerance: Policy::Permissive.default_tolerance(),
            policy: Policy::Permissive,
        }
    }

    /// Construct the default configuration for a policy
    pub fn for_policy(policy: Policy) -> Self {
        match policy {
            Policy::Strict => Self::strict(),
            Policy::Permissive => Self::permissive(),
        }
    }
}

/// Background event synthesis parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackgroundConfig {
    /// Guard distance kept between a synthetic interval and its neighbors, seconds
    pub inter_event_distance: f64,
    /// Minimum length of a synthetic interval, seconds; shorter gaps are skipped
    pub min_event_duration: f64,
}

impl Default for BackgroundConfig {
    fn default() -> Self {
        Self {
            inter_event_distance: 0.5,
            min_event_duration: 0.5,
        }
    }
}

/// Sub-frame grid handed to the feature extractor for each segment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubFrameConfig {
    /// Sub-frame window in seconds
    pub window_seconds: f64,
    /// Sub-frame step in seconds (50% overlap by default)
    pub step_seconds: f64,
}

impl Default for SubFrameConfig {
    fn default() -> Self {
        Self {
            window_seconds: 0.150,
            step_seconds: 0.075,
        }
    }
}

impl Default for AppConfig {
    /// Default configuration values (fallback if config file not found)
    fn default() -> Self {
        Self {
            segmentation: SegmenterConfig::default(),
            background: BackgroundConfig::default(),
            features: SubFrameConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from JSON file
    ///
    /// # Arguments
    /// * `path` - Path to JSON config file
    ///
    /// # Returns
    /// The loaded configuration; if the file doesn't exist or the JSON is
    /// invalid, the default configuration is returned and a warning logged.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    log::info!("[Config] Loaded configuration from {:?}", path.as_ref());
                    config
                }
                Err(err) => {
                    log::warn!(
                        "[Config] Failed to parse JSON from {:?}: {}. Using defaults.",
                        path.as_ref(),
                        err
                    );
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!(
                    "[Config] Failed to read config file {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.segmentation.frame_size_seconds, 0.300);
        assert_eq!(config.segmentation.step_seconds, 0.150);
        assert_eq!(config.segmentation.tolerance, 0.2);
        assert_eq!(config.segmentation.policy, Policy::Strict);
        assert_eq!(config.background.inter_event_distance, 0.5);
        assert_eq!(config.features.window_seconds, 0.150);
    }

    #[test]
    fn test_permissive_defaults() {
        let config = SegmenterConfig::permissive();
        assert_eq!(config.tolerance, 0.0);
        assert_eq!(config.policy, Policy::Permissive);
        // Window geometry is shared between policies
        assert_eq!(config.frame_size_seconds, 0.300);
        assert_eq!(config.step_seconds, 0.150);
    }

    #[test]
    fn test_json_roundtrip() {
        let config = AppConfig::default();
        let json = serde_json::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = serde_json::from_str(&json).unwrap();

        assert_eq!(
            parsed.segmentation.tolerance,
            config.segmentation.tolerance
        );
        assert_eq!(parsed.segmentation.policy, config.segmentation.policy);
        assert_eq!(
            parsed.background.min_event_duration,
            config.background.min_event_duration
        );
    }

    #[test]
    fn test_load_missing_file_falls_back_to_default() {
        let config = AppConfig::load_from_file("does/not/exist.json");
        assert_eq!(config.segmentation.frame_size_seconds, 0.300);
    }
}
