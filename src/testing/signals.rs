//! Deterministic signal generators and in-memory WAV encoders.

use std::f32::consts::PI;
use std::io::Cursor;
use std::path::Path;

use rand::{rngs::StdRng, Rng, SeedableRng};

/// Pure sine wave
pub fn sine_wave(sample_rate: u32, frequency_hz: f32, amplitude: f32, len: usize) -> Vec<f32> {
    (0..len)
        .map(|i| amplitude * (2.0 * PI * frequency_hz * i as f32 / sample_rate as f32).sin())
        .collect()
}

/// Uniform white noise from a fixed seed
pub fn white_noise(seed: u64, amplitude: f32, len: usize) -> Vec<f32> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..len)
        .map(|_| rng.gen_range(-1.0f32..1.0) * amplitude)
        .collect()
}

/// Voice-like test signal: harmonic stack under a syllable envelope plus noise
///
/// A high, loud, noisy voice stands in for aroused speech (angry); a low,
/// soft, clean one for calm speech.
#[derive(Debug, Clone, Copy)]
pub struct VoiceSpec {
    pub fundamental_hz: f32,
    pub amplitude: f32,
    pub noise: f32,
    /// Syllables per second
    pub syllable_rate: f32,
    pub seed: u64,
}

impl VoiceSpec {
    pub fn angry() -> Self {
        Self {
            fundamental_hz: 260.0,
            amplitude: 0.7,
            noise: 0.25,
            syllable_rate: 5.0,
            seed: 11,
        }
    }

    pub fn calm() -> Self {
        Self {
            fundamental_hz: 110.0,
            amplitude: 0.08,
            noise: 0.005,
            syllable_rate: 2.0,
            seed: 23,
        }
    }

    pub fn render(&self, sample_rate: u32, len: usize) -> Vec<f32> {
        let noise = white_noise(self.seed, self.noise, len);
        (0..len)
            .map(|i| {
                let t = i as f32 / sample_rate as f32;
                let envelope = 0.55 + 0.45 * (2.0 * PI * self.syllable_rate * t).sin();
                let voiced: f32 = (1..=8)
                    .map(|h| {
                        let h = h as f32;
                        (2.0 * PI * self.fundamental_hz * h * t).sin() / h
                    })
                    .sum();
                (self.amplitude * envelope * voiced * 0.5 + noise[i]).clamp(-1.0, 1.0)
            })
            .collect()
    }
}

fn to_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * i16::MAX as f32).round() as i16
}

fn encode(channels: &[&[f32]], sample_rate: u32) -> Vec<u8> {
    let spec = hound::WavSpec {
        channels: channels.len() as u16,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let frames = channels.iter().map(|c| c.len()).min().unwrap_or(0);
    let mut bytes = Vec::new();
    {
        let mut writer = hound::WavWriter::new(Cursor::new(&mut bytes), spec)
            .expect("in-memory WAV header");
        for frame in 0..frames {
            for channel in channels {
                writer
                    .write_sample(to_i16(channel[frame]))
                    .expect("in-memory WAV sample");
            }
        }
        writer.finalize().expect("in-memory WAV finalize");
    }
    bytes
}

/// Encode mono samples as a 16-bit PCM WAV file image
pub fn encode_wav_i16(samples: &[f32], sample_rate: u32) -> Vec<u8> {
    encode(&[samples], sample_rate)
}

/// Encode a stereo pair as a 16-bit PCM WAV file image
pub fn encode_wav_stereo_i16(left: &[f32], right: &[f32], sample_rate: u32) -> Vec<u8> {
    encode(&[left, right], sample_rate)
}

/// Write mono samples to a 16-bit PCM WAV file
pub fn write_wav_i16<P: AsRef<Path>>(path: P, samples: &[f32], sample_rate: u32) -> std::io::Result<()> {
    std::fs::write(path, encode_wav_i16(samples, sample_rate))
}
