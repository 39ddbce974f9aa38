// Waveform - decoded mono analysis window
//
// The waveform is the only per-request value handed back to hosts besides the
// label. Hosts that want to draw it use `peaks()` or export it with
// `write_wav()`; plotting itself happens outside this crate.

use std::path::Path;

use serde::Serialize;

/// Mono PCM samples at a known sample rate
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

/// Min/max envelope of one display bucket
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Peak {
    pub min: f32,
    pub max: f32,
}

impl Waveform {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds
    pub fn duration_secs(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f32 / self.sample_rate as f32
    }

    /// Reduce the waveform to `buckets` min/max pairs
    ///
    /// Returns fewer buckets when the waveform has fewer samples than
    /// requested, and an empty vector for an empty waveform.
    pub fn peaks(&self, buckets: usize) -> Vec<Peak> {
        if buckets == 0 || self.samples.is_empty() {
            return Vec::new();
        }

        let bucket_len = self.samples.len().div_ceil(buckets);
        self.samples
            .chunks(bucket_len)
            .map(|chunk| {
                let (min, max) = chunk
                    .iter()
                    .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &s| {
                        (lo.min(s), hi.max(s))
                    });
                Peak { min, max }
            })
            .collect()
    }

    /// Export as 16-bit mono PCM WAV
    pub fn write_wav<P: AsRef<Path>>(&self, path: P) -> Result<(), hound::Error> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec)?;
        for &sample in &self.samples {
            let clamped = sample.clamp(-1.0, 1.0);
            writer.write_sample((clamped * i16::MAX as f32).round() as i16)?;
        }
        writer.finalize()
    }
}
