// Spectral module - frequency-domain feature extraction
//
// This module computes spectral features from magnitude spectra. Lane
// assignment relies on the centroid (which frequency band an onset
// lives in) and on flatness (percussive vs. tonal content).

/// Magnitude mass below which a spectrum is considered degenerate
const SILENCE_EPSILON: f32 = 1e-10;

/// Spectral feature computation functions
pub struct SpectralFeatures {
    sample_rate: u32,
    fft_size: usize,
}

impl SpectralFeatures {
    /// Create a new spectral features processor
    ///
    /// # Arguments
    /// * `sample_rate` - Audio sample rate in Hz
    /// * `fft_size` - FFT window size
    pub fn new(sample_rate: u32, fft_size: usize) -> Self {
        Self {
            sample_rate,
            fft_size,
        }
    }

    /// Whether the spectrum carries enough mass to support spectral
    /// features. Silent frames fail this check and take the fallback
    /// feature vector instead.
    pub fn has_usable_mass(&self, spectrum: &[f32]) -> bool {
        let magnitude_sum: f32 = spectrum.iter().sum();
        magnitude_sum.is_finite() && magnitude_sum > SILENCE_EPSILON
    }

    /// Compute spectral centroid (weighted mean frequency)
    ///
    /// Formula: centroid = Σ(f_i × |X[i]|) / Σ|X[i]|
    ///
    /// # Arguments
    /// * `spectrum` - Magnitude spectrum
    ///
    /// # Returns
    /// Spectral centroid in Hz (0.0 for a degenerate spectrum)
    pub fn compute_centroid(&self, spectrum: &[f32]) -> f32 {
        let freq_bin_width = self.sample_rate as f32 / self.fft_size as f32;

        let weighted_sum: f32 = spectrum
            .iter()
            .enumerate()
            .map(|(i, &mag)| i as f32 * freq_bin_width * mag)
            .sum();

        let magnitude_sum: f32 = spectrum.iter().sum();

        if magnitude_sum > SILENCE_EPSILON {
            weighted_sum / magnitude_sum
        } else {
            0.0
        }
    }

    /// Compute spectral flatness (tonality measure)
    ///
    /// Formula: flatness = geometric_mean(|X[i]|) / arithmetic_mean(|X[i]|)
    ///
    /// Returns a value between 0 (tonal) and 1 (noise-like), also known
    /// as the Wiener entropy.
    ///
    /// # Arguments
    /// * `spectrum` - Magnitude spectrum
    ///
    /// # Returns
    /// Spectral flatness (0.0 to 1.0)
    pub fn compute_flatness(&self, spectrum: &[f32]) -> f32 {
        if spectrum.is_empty() {
            return 0.0;
        }

        // Near-zero bins are excluded so the geometric mean stays defined
        let non_zero: Vec<f32> = spectrum
            .iter()
            .filter(|&&mag| mag > SILENCE_EPSILON)
            .copied()
            .collect();

        if non_zero.is_empty() {
            return 0.0;
        }

        let log_sum: f32 = non_zero.iter().map(|&mag| mag.ln()).sum();
        let geometric_mean = (log_sum / non_zero.len() as f32).exp();
        let arithmetic_mean: f32 = non_zero.iter().sum::<f32>() / non_zero.len() as f32;

        if arithmetic_mean > SILENCE_EPSILON {
            (geometric_mean / arithmetic_mean).min(1.0)
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::features::fft::FftProcessor;

    fn sine_spectrum(freq: f32, sample_rate: u32, fft_size: usize) -> Vec<f32> {
        let processor = FftProcessor::new(fft_size);
        let frame: Vec<f32> = (0..fft_size)
            .map(|i| (2.0 * std::f32::consts::PI * freq * i as f32 / sample_rate as f32).sin())
            .collect();
        processor.compute_magnitude_spectrum(&frame)
    }

    #[test]
    fn test_centroid_tracks_sine_frequency() {
        let spectral = SpectralFeatures::new(44100, 1024);

        let low = spectral.compute_centroid(&sine_spectrum(150.0, 44100, 1024));
        let high = spectral.compute_centroid(&sine_spectrum(6000.0, 44100, 1024));

        assert!(low < 1000.0, "150 Hz sine centroid was {} Hz", low);
        assert!(high > 3000.0, "6 kHz sine centroid was {} Hz", high);
    }

    #[test]
    fn test_flatness_separates_tone_from_noise() {
        use rand::Rng;

        let spectral = SpectralFeatures::new(44100, 1024);
        let processor = FftProcessor::new(1024);

        let tone = sine_spectrum(1000.0, 44100, 1024);
        let mut rng = rand::thread_rng();
        let noise_frame: Vec<f32> = (0..1024).map(|_| rng.gen_range(-1.0..1.0)).collect();
        let noise = processor.compute_magnitude_spectrum(&noise_frame);

        let tone_flatness = spectral.compute_flatness(&tone);
        let noise_flatness = spectral.compute_flatness(&noise);

        assert!(
            tone_flatness < 0.2,
            "sine flatness should be low, got {}",
            tone_flatness
        );
        assert!(
            noise_flatness > 0.4,
            "noise flatness should be high, got {}",
            noise_flatness
        );
    }

    #[test]
    fn test_degenerate_spectrum_detected() {
        let spectral = SpectralFeatures::new(44100, 1024);
        let silence = vec![0.0f32; 513];
        assert!(!spectral.has_usable_mass(&silence));
        assert_eq!(spectral.compute_centroid(&silence), 0.0);
        assert_eq!(spectral.compute_flatness(&silence), 0.0);
    }
}
