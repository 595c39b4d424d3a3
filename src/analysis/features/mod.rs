// FeatureExtractor - per-frame DSP feature extraction
//
// This module extracts the small feature vector the onset detector runs
// on: energy, RMS, zero-crossing rate, spectral centroid and spectral
// flatness, one vector per analysis frame.
//
// Module organization:
// - types: Data structures (FrameFeatures struct)
// - fft: FFT computation with windowing
// - spectral: Frequency-domain features (centroid, flatness)
// - temporal: Time-domain features (energy, rms, zcr)
// - mod.rs: Coordinator (FeatureExtractor) with graceful degradation
//
// Extraction must never fail: when the spectrum degenerates (silent
// frame), the coordinator substitutes a fallback vector built from the
// time-domain features plus fixed neutral spectral values. The analysis
// pipeline degrades gracefully per-frame instead of aborting.

pub mod fft;
pub mod spectral;
pub mod temporal;
mod types;

pub use types::FrameFeatures;

use fft::FftProcessor;
use spectral::SpectralFeatures;
use temporal::TemporalFeatures;

use crate::error::{AnalysisError, ErrorCode};

/// FeatureExtractor coordinates the per-frame extraction pipeline
pub struct FeatureExtractor {
    fft_processor: FftProcessor,
    spectral_features: SpectralFeatures,
    temporal_features: TemporalFeatures,
    frames_extracted: usize,
    degraded_frames: u64,
}

impl FeatureExtractor {
    /// Create a new FeatureExtractor
    ///
    /// # Arguments
    /// * `sample_rate` - Audio sample rate in Hz
    /// * `frame_size` - Analysis frame size in samples
    pub fn new(sample_rate: u32, frame_size: usize) -> Self {
        Self {
            fft_processor: FftProcessor::new(frame_size),
            spectral_features: SpectralFeatures::new(sample_rate, frame_size),
            temporal_features: TemporalFeatures::new(),
            frames_extracted: 0,
            degraded_frames: 0,
        }
    }

    /// Extract the feature vector for one frame
    ///
    /// Time-domain features are always computed directly. Spectral
    /// features come from the FFT path; when that path degenerates the
    /// fallback vector is substituted and the degradation is logged,
    /// never propagated.
    ///
    /// # Arguments
    /// * `frame` - Audio frame (frame_size samples; shorter frames are
    ///   zero-padded by the FFT path)
    pub fn extract(&mut self, frame: &[f32]) -> FrameFeatures {
        let frame_index = self.frames_extracted;
        self.frames_extracted += 1;

        let energy = self.temporal_features.compute_energy(frame);
        let rms = self.temporal_features.compute_rms(frame);

        match self.try_spectral(frame, frame_index) {
            Ok((centroid, flatness)) => FrameFeatures {
                energy,
                rms,
                zcr: self.temporal_features.compute_zcr(frame),
                centroid,
                flatness,
            },
            Err(err) => {
                self.degraded_frames += 1;
                tracing::debug!(
                    "[FeatureExtractor] {} - using fallback vector",
                    err.message()
                );
                FrameFeatures::fallback(energy, rms)
            }
        }
    }

    /// Number of frames that fell back to time-domain features.
    pub fn degraded_frames(&self) -> u64 {
        self.degraded_frames
    }

    fn try_spectral(
        &self,
        frame: &[f32],
        frame_index: usize,
    ) -> Result<(f32, f32), AnalysisError> {
        let spectrum = self.fft_processor.compute_magnitude_spectrum(frame);

        if !self.spectral_features.has_usable_mass(&spectrum) {
            return Err(AnalysisError::ExtractionDegraded { frame: frame_index });
        }

        let centroid = self.spectral_features.compute_centroid(&spectrum);
        let flatness = self.spectral_features.compute_flatness(&spectrum);

        if !centroid.is_finite() || !flatness.is_finite() {
            return Err(AnalysisError::ExtractionDegraded { frame: frame_index });
        }

        Ok((centroid, flatness))
    }
}
