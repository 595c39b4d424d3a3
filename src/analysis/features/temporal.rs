// Temporal module - time-domain feature extraction
//
// This module computes features directly from time-domain audio frames:
// mean-absolute energy, RMS amplitude and zero-crossing rate. These are
// the features the onset detector thresholds against, so they must be
// cheap and defined for every frame including silence.

/// Temporal feature computation functions
pub struct TemporalFeatures;

impl TemporalFeatures {
    pub fn new() -> Self {
        Self
    }

    /// Compute mean absolute amplitude
    ///
    /// Formula: energy = (1/N) × Σ|x[n]|
    ///
    /// Bounded to [0, 1] for normalized input, which keeps the fixed
    /// onset thresholds meaningful across tracks.
    ///
    /// # Arguments
    /// * `frame` - Time-domain audio frame
    ///
    /// # Returns
    /// Mean absolute amplitude (0.0 for an empty frame)
    pub fn compute_energy(&self, frame: &[f32]) -> f32 {
        if frame.is_empty() {
            return 0.0;
        }
        frame.iter().map(|&x| x.abs()).sum::<f32>() / frame.len() as f32
    }

    /// Compute root-mean-square amplitude
    ///
    /// Formula: rms = sqrt((1/N) × Σ x[n]²)
    ///
    /// # Arguments
    /// * `frame` - Time-domain audio frame
    ///
    /// # Returns
    /// RMS amplitude (0.0 for an empty frame)
    pub fn compute_rms(&self, frame: &[f32]) -> f32 {
        if frame.is_empty() {
            return 0.0;
        }
        let sum_squares: f32 = frame.iter().map(|&x| x * x).sum();
        (sum_squares / frame.len() as f32).sqrt()
    }

    /// Compute zero-crossing rate (ZCR)
    ///
    /// Formula: ZCR = crossings / (N - 1)
    ///
    /// ZCR measures how often the signal changes sign. High ZCR indicates
    /// high-frequency or noise-like content, low ZCR low-frequency or
    /// tonal content.
    ///
    /// # Arguments
    /// * `frame` - Time-domain audio frame
    ///
    /// # Returns
    /// Zero-crossing rate (0.0 to 1.0)
    pub fn compute_zcr(&self, frame: &[f32]) -> f32 {
        if frame.len() < 2 {
            return 0.0;
        }

        let mut crossings = 0;
        for i in 1..frame.len() {
            if (frame[i] >= 0.0 && frame[i - 1] < 0.0) || (frame[i] < 0.0 && frame[i - 1] >= 0.0) {
                crossings += 1;
            }
        }

        crossings as f32 / (frame.len() - 1) as f32
    }
}

impl Default for TemporalFeatures {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_energy_of_constant_signal() {
        let temporal = TemporalFeatures::new();
        let frame = vec![0.5f32; 256];
        assert!((temporal.compute_energy(&frame) - 0.5).abs() < 1e-6);
        assert!((temporal.compute_rms(&frame) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_energy_of_silence() {
        let temporal = TemporalFeatures::new();
        let frame = vec![0.0f32; 256];
        assert_eq!(temporal.compute_energy(&frame), 0.0);
        assert_eq!(temporal.compute_rms(&frame), 0.0);
        assert_eq!(temporal.compute_zcr(&frame), 0.0);
    }

    #[test]
    fn test_zcr_of_alternating_signal() {
        let temporal = TemporalFeatures::new();
        // Sign flips on every sample: maximum crossing rate
        let frame: Vec<f32> = (0..256).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }).collect();
        let zcr = temporal.compute_zcr(&frame);
        assert!(zcr > 0.99, "expected ZCR near 1.0, got {}", zcr);
    }

    #[test]
    fn test_zcr_of_low_frequency_sine() {
        let temporal = TemporalFeatures::new();
        let sample_rate = 44100.0f32;
        let frame: Vec<f32> = (0..1024)
            .map(|i| (2.0 * std::f32::consts::PI * 100.0 * i as f32 / sample_rate).sin())
            .collect();
        let zcr = temporal.compute_zcr(&frame);
        assert!(zcr < 0.1, "expected low ZCR for 100 Hz sine, got {}", zcr);
    }
}
