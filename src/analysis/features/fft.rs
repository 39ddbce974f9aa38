// FFT module - centered short-time Fourier transform
//
// Frames are centered on multiples of the hop size: the signal is padded with
// n_fft/2 zeros on both sides before framing, so a waveform of `len` samples
// always yields `1 + len / hop_length` frames.

use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

/// STFT processor producing power spectra
pub struct StftProcessor {
    fft: Arc<dyn Fft<f32>>,
    n_fft: usize,
    hop_length: usize,
    /// Periodic Hann window (pre-computed)
    window: Vec<f32>,
}

impl StftProcessor {
    /// Create a new STFT processor
    ///
    /// # Arguments
    /// * `n_fft` - FFT window size (2048 for the shipped model)
    /// * `hop_length` - Frame advance in samples (512 for the shipped model)
    pub fn new(n_fft: usize, hop_length: usize) -> Self {
        let fft = FftPlanner::new().plan_fft_forward(n_fft);

        let window = (0..n_fft)
            .map(|i| {
                0.5 - 0.5 * ((2.0 * std::f64::consts::PI * i as f64) / n_fft as f64).cos()
            })
            .map(|w| w as f32)
            .collect();

        Self {
            fft,
            n_fft,
            hop_length,
            window,
        }
    }

    pub fn n_fft(&self) -> usize {
        self.n_fft
    }

    /// Number of positive-frequency bins per frame
    pub fn bin_count(&self) -> usize {
        self.n_fft / 2 + 1
    }

    /// Number of frames produced for a signal of `len` samples
    pub fn frame_count(&self, len: usize) -> usize {
        1 + len / self.hop_length
    }

    /// Compute the power spectrogram `|X|^2`
    ///
    /// # Returns
    /// One row per frame, each of size `n_fft / 2 + 1`
    pub fn power_spectrogram(&self, audio: &[f32]) -> Vec<Vec<f32>> {
        let frames = self.frame_count(audio.len());
        let pad = self.n_fft / 2;
        let mut buffer = vec![Complex::new(0.0f32, 0.0); self.n_fft];
        let mut scratch = vec![Complex::new(0.0f32, 0.0); self.fft.get_inplace_scratch_len()];
        let mut spectrogram = Vec::with_capacity(frames);

        for frame in 0..frames {
            let start = frame * self.hop_length;
            for (k, slot) in buffer.iter_mut().enumerate() {
                // Position in the unpadded signal
                let sample = (start + k)
                    .checked_sub(pad)
                    .and_then(|idx| audio.get(idx))
                    .copied()
                    .unwrap_or(0.0);
                *slot = Complex::new(sample * self.window[k], 0.0);
            }

            self.fft.process_with_scratch(&mut buffer, &mut scratch);

            spectrogram.push(
                buffer[..self.bin_count()]
                    .iter()
                    .map(|c| c.norm_sqr())
                    .collect(),
            );
        }

        spectrogram
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_count_matches_centered_framing() {
        let stft = StftProcessor::new(2048, 512);
        assert_eq!(stft.frame_count(66_150), 130);
        assert_eq!(stft.frame_count(1024), 3);
        assert_eq!(stft.frame_count(511), 1);
    }

    #[test]
    fn test_window_is_periodic_hann() {
        let stft = StftProcessor::new(8, 4);
        assert_eq!(stft.window[0], 0.0);
        assert!((stft.window[4] - 1.0).abs() < 1e-6);
        assert!((stft.window[2] - stft.window[6]).abs() < 1e-6);
    }

    #[test]
    fn test_sine_peaks_at_expected_bin() {
        let sample_rate = 22_050.0f32;
        let stft = StftProcessor::new(2048, 512);
        // Centered exactly on bin 100
        let freq = 100.0 * sample_rate / 2048.0;
        let signal: Vec<f32> = (0..8192)
            .map(|i| (2.0 * std::f32::consts::PI * freq * i as f32 / sample_rate).sin())
            .collect();

        let spectrogram = stft.power_spectrogram(&signal);
        let middle = &spectrogram[spectrogram.len() / 2];
        let peak_bin = middle
            .iter()
            .enumerate()
            .fold((0, f32::MIN), |best, (i, &p)| if p > best.1 { (i, p) } else { best })
            .0;

        assert_eq!(middle.len(), 1025);
        assert_eq!(peak_bin, 100);
    }

    #[test]
    fn test_silence_has_zero_power() {
        let stft = StftProcessor::new(512, 128);
        let spectrogram = stft.power_spectrogram(&[0.0; 1000]);
        assert_eq!(spectrogram.len(), stft.frame_count(1000));
        assert!(spectrogram.iter().flatten().all(|&p| p == 0.0));
    }
}
