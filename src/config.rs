//! Configuration management for dynamic parameter tuning
//!
//! This module provides runtime configuration loading from JSON files,
//! enabling fast iteration without recompilation. Key parameters for
//! onset detection, lane distribution and judgement can be adjusted
//! via the config file for rapid experimentation.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::schedule::Lane;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub analyzer: AnalyzerConfig,
    pub distributor: DistributorConfig,
    pub judgement: JudgementConfig,
}

/// A frequency band used for spectral-centroid lane assignment
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FrequencyBand {
    /// Inclusive lower bound in Hz
    pub min: f32,
    /// Exclusive upper bound in Hz
    pub max: f32,
}

impl FrequencyBand {
    /// Whether a centroid frequency falls inside this band.
    pub fn contains(&self, freq: f32) -> bool {
        freq >= self.min && freq < self.max
    }
}

/// Onset detection and feature extraction parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// Frame-to-frame energy increase required for an energy onset
    pub energy_threshold: f32,
    /// Frame-to-frame RMS increase required for an RMS onset
    pub rms_threshold: f32,
    /// Refractory window in seconds: at most one onset per this interval
    pub min_time_between_beats: f64,
    /// Analysis window size in samples
    pub frame_size: usize,
    /// Hop size for overlapping windows
    pub hop_size: usize,
    /// Centroid-to-lane frequency bands, one per lane
    pub frequency_bands: [FrequencyBand; 4],
    /// Minimum spacing in seconds between kept notes in the same lane
    pub min_note_spacing: f64,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            energy_threshold: 0.15,
            rms_threshold: 0.1,
            min_time_between_beats: 0.2,
            frame_size: 1024,
            hop_size: 512,
            // Bass, low-mid, high-mid, treble
            frequency_bands: [
                FrequencyBand {
                    min: 20.0,
                    max: 250.0,
                },
                FrequencyBand {
                    min: 250.0,
                    max: 1000.0,
                },
                FrequencyBand {
                    min: 1000.0,
                    max: 4000.0,
                },
                FrequencyBand {
                    min: 4000.0,
                    max: 20000.0,
                },
            ],
            min_note_spacing: 0.2,
        }
    }
}

/// Lane distribution parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistributorConfig {
    /// Target share of notes per lane; entries sum to 1.0 within rounding
    pub target_distribution: [f64; 4],
    /// Maximum consecutive notes kept in the same lane during initial
    /// assignment
    pub max_consecutive_same_lane: u32,
    /// Notes per pattern-synthesis chunk
    pub pattern_length: usize,
    /// Lane-to-lane transition weights, indexed [from][to]
    pub transition_weights: [[f64; 4]; 4],
    /// Maximum gap in seconds between beats of a burst
    pub burst_threshold: f64,
    /// Lane cycle assigned to burst members
    pub burst_lane_pattern: [Lane; 4],
    /// Seed for the deterministic lane-assignment generator
    pub seed: u64,
}

impl Default for DistributorConfig {
    fn default() -> Self {
        Self {
            target_distribution: [0.28, 0.26, 0.24, 0.22],
            max_consecutive_same_lane: 3,
            pattern_length: 8,
            transition_weights: [
                [0.2, 0.4, 0.3, 0.1],
                [0.3, 0.2, 0.4, 0.1],
                [0.2, 0.3, 0.2, 0.3],
                [0.3, 0.2, 0.4, 0.1],
            ],
            burst_threshold: 0.3,
            burst_lane_pattern: [Lane::T1, Lane::T2, Lane::T3, Lane::T4],
            seed: 12345,
        }
    }
}

/// Judgement engine parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JudgementConfig {
    /// Outer gate in seconds: presses farther from a note are ignored
    pub hit_window: f64,
    /// Screen position of the hit line
    pub hit_line_offset: f64,
    /// Pixels per second of note travel at unit speed
    pub position_scale: f64,
    /// Position past which a note counts as missed
    pub miss_threshold: f64,
    /// Position past which a note is expired and compacted away
    pub miss_max_threshold: f64,
}

impl Default for JudgementConfig {
    fn default() -> Self {
        Self {
            hit_window: 0.3,
            hit_line_offset: 600.0,
            // 350 px/s at the base scroll speed of 2.8
            position_scale: 980.0,
            miss_threshold: 650.0,
            miss_max_threshold: 1000.0,
        }
    }
}

impl Default for AppConfig {
    /// Default configuration values (fallback if config file not found)
    fn default() -> Self {
        Self {
            analyzer: AnalyzerConfig::default(),
            distributor: DistributorConfig::default(),
            judgement: JudgementConfig::default(),
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
    /// * `AppConfig` - Loaded configuration, or defaults if the file is
    ///   missing or invalid
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    tracing::info!("[Config] Loaded configuration from {:?}", path.as_ref());
                    config
                }
                Err(err) => {
                    tracing::warn!(
                        "[Config] Failed to parse JSON from {:?}: {}. Using defaults.",
                        path.as_ref(),
                        err
                    );
                    Self::default()
                }
            },
            Err(err) => {
                tracing::warn!(
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
        assert_eq!(config.analyzer.energy_threshold, 0.15);
        assert_eq!(config.analyzer.frame_size, 1024);
        assert_eq!(config.analyzer.hop_size, 512);
        assert_eq!(config.distributor.seed, 12345);
        assert_eq!(config.judgement.hit_window, 0.3);
    }

    #[test]
    fn test_target_distribution_sums_to_one() {
        let config = DistributorConfig::default();
        let sum: f64 = config.target_distribution.iter().sum();
        assert!((sum - 1.0).abs() < 1e-9, "distribution sums to {}", sum);
    }

    #[test]
    fn test_frequency_bands_cover_spectrum_in_order() {
        let config = AnalyzerConfig::default();
        for pair in config.frequency_bands.windows(2) {
            assert_eq!(pair[0].max, pair[1].min, "bands must be contiguous");
        }
        assert!(config.frequency_bands[0].contains(100.0));
        assert!(!config.frequency_bands[0].contains(250.0));
        assert!(config.frequency_bands[3].contains(5000.0));
    }

    #[test]
    fn test_json_roundtrip() {
        let config = AppConfig::default();
        let json = serde_json::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = serde_json::from_str(&json).unwrap();

        assert_eq!(
            parsed.analyzer.energy_threshold,
            config.analyzer.energy_threshold
        );
        assert_eq!(parsed.distributor.seed, config.distributor.seed);
        assert_eq!(
            parsed.judgement.miss_threshold,
            config.judgement.miss_threshold
        );
    }
}
