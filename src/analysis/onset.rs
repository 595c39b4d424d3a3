// OnsetDetector - energy/RMS onset detection with adaptive thresholding
//
// This module detects note candidates by analyzing frame-to-frame energy
// and RMS changes against an adaptive threshold derived from recent
// history, then assigns each onset to one of the four lanes from its
// spectral content.
//
// Per-frame algorithm:
// 1. Extract the feature vector for the frame
// 2. Push energy into a 43-frame sliding history; avgEnergy = mean
// 3. adaptiveThreshold = avgEnergy * 1.5
// 4. energy onset: delta > energy_threshold AND energy > adaptiveThreshold
// 5. RMS onset: delta > rms_threshold
// 6. Fire iff (energy onset OR RMS onset) AND the refractory window
//    since the last onset has elapsed (hard debounce)
// 7. Lane: percussive override -> centroid band -> ZCR bucket

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::analysis::features::{FeatureExtractor, FrameFeatures};
use crate::config::AnalyzerConfig;
use crate::schedule::Lane;

/// Sliding energy history length used for adaptive thresholding
const ENERGY_HISTORY_FRAMES: usize = 43;

/// Multiplier applied to the history mean to form the adaptive threshold
const ADAPTIVE_THRESHOLD_RATIO: f32 = 1.5;

/// Energy floor for the percussive (bass-lane) override
const PERCUSSIVE_ENERGY_FLOOR: f32 = 0.7;

/// Flatness ceiling for the percussive (bass-lane) override
const PERCUSSIVE_FLATNESS_CEIL: f32 = 0.2;

/// A detected onset: a candidate note with its assigned lane
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OnsetEvent {
    /// Onset time in seconds from track start
    pub time: f64,
    /// Lane chosen from the onset's spectral content
    pub lane: Lane,
}

/// OnsetDetector advances one frame per hop over the track
pub struct OnsetDetector {
    config: AnalyzerConfig,
    extractor: FeatureExtractor,
    energy_history: VecDeque<f32>,
    prev_energy: f32,
    prev_rms: f32,
    last_onset_time: f64,
}

impl OnsetDetector {
    /// Create a new OnsetDetector
    ///
    /// # Arguments
    /// * `sample_rate` - Audio sample rate in Hz
    /// * `config` - Analyzer parameters (thresholds, frame geometry, bands)
    pub fn new(sample_rate: u32, config: AnalyzerConfig) -> Self {
        let extractor = FeatureExtractor::new(sample_rate, config.frame_size);
        Self {
            // The first frame must be eligible, so the refractory window
            // starts already elapsed
            last_onset_time: -config.min_time_between_beats,
            config,
            extractor,
            energy_history: VecDeque::with_capacity(ENERGY_HISTORY_FRAMES + 1),
            prev_energy: 0.0,
            prev_rms: 0.0,
        }
    }

    /// Process one analysis frame
    ///
    /// # Arguments
    /// * `frame` - `frame_size` samples starting at the frame's position
    /// * `frame_time` - Frame start time in seconds
    ///
    /// # Returns
    /// * `Some(OnsetEvent)` - when an onset fires on this frame
    /// * `None` - otherwise
    pub fn process_frame(&mut self, frame: &[f32], frame_time: f64) -> Option<OnsetEvent> {
        let features = self.extractor.extract(frame);

        self.energy_history.push_back(features.energy);
        if self.energy_history.len() > ENERGY_HISTORY_FRAMES {
            self.energy_history.pop_front();
        }
        let avg_energy: f32 =
            self.energy_history.iter().sum::<f32>() / self.energy_history.len() as f32;
        let adaptive_threshold = avg_energy * ADAPTIVE_THRESHOLD_RATIO;

        let energy_delta = features.energy - self.prev_energy;
        let rms_delta = features.rms - self.prev_rms;
        self.prev_energy = features.energy;
        self.prev_rms = features.rms;

        let energy_onset =
            energy_delta > self.config.energy_threshold && features.energy > adaptive_threshold;
        let rms_onset = rms_delta > self.config.rms_threshold;

        // Hard debounce: at most one onset per refractory window
        let refractory_elapsed =
            frame_time - self.last_onset_time >= self.config.min_time_between_beats;

        if (energy_onset || rms_onset) && refractory_elapsed {
            self.last_onset_time = frame_time;
            let lane = self.pick_lane(&features);
            tracing::debug!(
                "[OnsetDetector] Onset at {:.3}s -> {} (energy {:.3}, rms {:.3}, centroid {:.0} Hz)",
                frame_time,
                lane.key(),
                features.energy,
                features.rms,
                features.centroid
            );
            Some(OnsetEvent {
                time: frame_time,
                lane,
            })
        } else {
            None
        }
    }

    /// Number of frames whose features fell back to the time-domain path.
    pub fn degraded_frames(&self) -> u64 {
        self.extractor.degraded_frames()
    }

    /// Assign a lane from the onset's spectral content.
    ///
    /// Precedence: the percussive override (high energy, low flatness)
    /// forces the bass lane; otherwise the centroid is mapped into the
    /// configured frequency bands (lane 2 when outside all bands); when
    /// the centroid is unavailable the ZCR bucket decides.
    fn pick_lane(&self, features: &FrameFeatures) -> Lane {
        if features.energy > PERCUSSIVE_ENERGY_FLOOR
            && features.flatness < PERCUSSIVE_FLATNESS_CEIL
        {
            return Lane::T1;
        }

        if features.centroid.is_finite() {
            for (i, band) in self.config.frequency_bands.iter().enumerate() {
                if band.contains(features.centroid) {
                    return Lane::from_index(i).unwrap_or(Lane::T2);
                }
            }
            Lane::T2
        } else {
            match features.zcr {
                z if z < 0.2 => Lane::T1,
                z if z < 0.4 => Lane::T2,
                z if z < 0.6 => Lane::T3,
                _ => Lane::T4,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector() -> OnsetDetector {
        OnsetDetector::new(44100, AnalyzerConfig::default())
    }

    fn loud_frame(amplitude: f32) -> Vec<f32> {
        // Alternating square keeps energy == amplitude with real spectrum
        (0..1024)
            .map(|i| if (i / 64) % 2 == 0 { amplitude } else { -amplitude })
            .collect()
    }

    #[test]
    fn test_onset_fires_on_energy_jump() {
        let mut det = detector();
        let silence = vec![0.0f32; 1024];

        assert!(det.process_frame(&silence, 0.0).is_none());
        let onset = det.process_frame(&loud_frame(0.9), 0.5);
        assert!(onset.is_some(), "energy jump from silence should fire");
        assert_eq!(onset.unwrap().time, 0.5);
    }

    #[test]
    fn test_refractory_window_debounces() {
        let mut det = detector();
        let silence = vec![0.0f32; 1024];
        let loud = loud_frame(0.9);

        det.process_frame(&silence, 0.0);
        let first = det.process_frame(&loud, 0.5);
        assert!(first.is_some());

        // Second spike inside the refractory window: suppressed
        det.process_frame(&silence, 0.55);
        let second = det.process_frame(&loud, 0.6);
        assert!(
            second.is_none(),
            "onset inside min_time_between_beats must be debounced"
        );

        // After the window elapses a new onset may fire
        det.process_frame(&silence, 0.65);
        let third = det.process_frame(&loud, 0.75);
        assert!(third.is_some());
    }

    #[test]
    fn test_no_onsets_in_silence() {
        let mut det = detector();
        let silence = vec![0.0f32; 1024];
        for i in 0..50 {
            assert!(det.process_frame(&silence, i as f64 * 0.0116).is_none());
        }
    }

    #[test]
    fn test_percussive_override_forces_bass_lane() {
        let det = detector();
        let features = FrameFeatures {
            energy: 0.8,
            rms: 0.8,
            zcr: 0.1,
            centroid: 5000.0, // treble band, but the override wins
            flatness: 0.1,
        };
        assert_eq!(det.pick_lane(&features), Lane::T1);
    }

    #[test]
    fn test_centroid_band_assignment() {
        let det = detector();
        let base = FrameFeatures {
            energy: 0.3,
            rms: 0.3,
            zcr: 0.3,
            centroid: 0.0,
            flatness: 0.5,
        };

        let cases = [
            (100.0, Lane::T1),
            (500.0, Lane::T2),
            (2500.0, Lane::T3),
            (9000.0, Lane::T4),
            // Outside every band: default lane
            (25000.0, Lane::T2),
        ];
        for (centroid, expected) in cases {
            let features = FrameFeatures { centroid, ..base };
            assert_eq!(
                det.pick_lane(&features),
                expected,
                "centroid {} Hz",
                centroid
            );
        }
    }

    #[test]
    fn test_zcr_bucket_when_centroid_unavailable() {
        let det = detector();
        let base = FrameFeatures {
            energy: 0.3,
            rms: 0.3,
            zcr: 0.0,
            centroid: f32::NAN,
            flatness: 0.5,
        };

        let cases = [
            (0.1, Lane::T1),
            (0.3, Lane::T2),
            (0.5, Lane::T3),
            (0.8, Lane::T4),
        ];
        for (zcr, expected) in cases {
            let features = FrameFeatures { zcr, ..base };
            assert_eq!(det.pick_lane(&features), expected, "zcr {}", zcr);
        }
    }
}
