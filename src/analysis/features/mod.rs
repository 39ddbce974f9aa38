// MfccExtractor - cepstral feature extraction for emotion classification
//
// This module turns a waveform into the fixed-width vector the classifier
// was trained on: the time-mean of each MFCC over the clip. The numerics
// follow the usual speech-research defaults so that vectors match the ones
// computed at training time.
//
// Module organization:
// - types: Data structures (FeatureVector, MfccMatrix)
// - fft: Centered STFT with periodic Hann window
// - mel: Slaney-scale mel filterbank
// - cepstrum: dB conversion and orthonormal DCT-II
// - mod.rs: Coordinator (MfccExtractor)
//
// Pipeline per clip:
// 1. Power spectrogram (n_fft 2048, hop 512, centered)
// 2. 128-band mel projection
// 3. 10*log10 with an 80 dB dynamic range floor
// 4. DCT-II, first 40 coefficients
// 5. Mean over frames
//
// References:
// - Davis, S. & Mermelstein, P. (1980). Comparison of parametric
//   representations for monosyllabic word recognition
// - Slaney, M. (1998). Auditory Toolbox, Technical Report #1998-010

mod cepstrum;
mod fft;
mod mel;
mod types;

pub use types::{FeatureVector, MfccMatrix};

use cepstrum::{power_to_db, Dct};
use fft::StftProcessor;
use mel::MelFilterbank;

use crate::audio::Waveform;
use crate::config::FeatureConfig;
use crate::error::PipelineError;

/// MfccExtractor coordinates the MFCC pipeline for one sample rate
///
/// All tables (FFT plan, window, filterbank, DCT basis) are built once in
/// `new` and only read afterwards, so one extractor can serve many threads.
pub struct MfccExtractor {
    sample_rate: u32,
    config: FeatureConfig,
    stft: StftProcessor,
    filterbank: MelFilterbank,
    dct: Dct,
}

impl MfccExtractor {
    /// Create a new MfccExtractor for the specified sample rate
    ///
    /// # Arguments
    /// * `sample_rate` - Audio sample rate in Hz (22050 for the shipped model)
    /// * `config` - Frame, filterbank and coefficient settings
    pub fn new(sample_rate: u32, config: &FeatureConfig) -> Self {
        let nyquist = sample_rate as f32 / 2.0;
        let fmax = config.fmax.unwrap_or(nyquist).min(nyquist);

        Self {
            sample_rate,
            config: config.clone(),
            stft: StftProcessor::new(config.n_fft, config.hop_length),
            filterbank: MelFilterbank::new(
                sample_rate,
                config.n_fft,
                config.n_mels,
                config.fmin,
                fmax,
            ),
            dct: Dct::new(config.n_mels, config.n_mfcc),
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Width of the vectors produced by `extract`
    pub fn n_mfcc(&self) -> usize {
        self.dct.n_out()
    }

    /// Shortest waveform accepted: half an analysis window
    pub fn min_samples(&self) -> usize {
        self.stft.n_fft() / 2
    }

    /// Compute the full coefficient matrix
    ///
    /// # Errors
    /// `InsufficientSamples` when `samples` is shorter than `min_samples()`
    pub fn mfcc(&self, samples: &[f32]) -> Result<MfccMatrix, PipelineError> {
        let required = self.min_samples().max(1);
        if samples.len() < required {
            return Err(PipelineError::InsufficientSamples {
                required,
                available: samples.len(),
            });
        }

        let mut mel_frames: Vec<Vec<f32>> = self
            .stft
            .power_spectrogram(samples)
            .iter()
            .map(|power| self.filterbank.apply(power))
            .collect();

        power_to_db(&mut mel_frames, self.config.top_db);

        let frames = mel_frames.len();
        let mut coefficients = vec![Vec::with_capacity(frames); self.n_mfcc()];
        for frame in &mel_frames {
            for (row, value) in coefficients.iter_mut().zip(self.dct.apply(frame)) {
                row.push(value);
            }
        }

        Ok(MfccMatrix {
            coefficients,
            frames,
        })
    }

    /// Extract the time-averaged feature vector of a waveform
    ///
    /// A waveform at a different rate than this extractor was built for is
    /// processed by a temporary extractor for its own rate, so the result only
    /// depends on the samples and their rate.
    pub fn extract(&self, waveform: &Waveform) -> Result<FeatureVector, PipelineError> {
        if waveform.sample_rate != self.sample_rate {
            let extractor = MfccExtractor::new(waveform.sample_rate, &self.config);
            return extractor.extract(waveform);
        }

        Ok(self.mfcc(&waveform.samples)?.time_mean())
    }
}
