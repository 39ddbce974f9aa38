//! Configuration management for the prediction pipeline
//!
//! This module provides runtime configuration loading from JSON files.
//! The defaults reproduce the constants the shipped model was trained with
//! (22.05 kHz, 0.5 s offset, 3 s window, 40 MFCCs); the artifact paths and
//! server settings are the parts that normally change between deployments.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default config location for desktop/server deployments
pub const DEFAULT_CONFIG_PATH: &str = "assets/emotion_config.json";

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub audio: AudioConfig,
    pub features: FeatureConfig,
    pub artifacts: ArtifactPaths,
    pub server: ServerConfig,
}

/// Audio loading parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Sample rate every decoded window is resampled to
    pub target_sample_rate: u32,
    /// Start of the analysis window, in seconds into the source
    pub offset_secs: f32,
    /// Length of the analysis window in seconds
    pub duration_secs: f32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            target_sample_rate: 22_050,
            offset_secs: 0.5,
            duration_secs: 3.0,
        }
    }
}

/// MFCC extraction parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    /// Number of cepstral coefficients kept (model input width)
    pub n_mfcc: usize,
    /// FFT window size in samples
    pub n_fft: usize,
    /// Hop size between frames
    pub hop_length: usize,
    /// Number of mel bands
    pub n_mels: usize,
    /// Lowest filterbank frequency in Hz
    pub fmin: f32,
    /// Highest filterbank frequency in Hz (Nyquist when unset)
    pub fmax: Option<f32>,
    /// Dynamic range kept by the dB conversion
    pub top_db: Option<f32>,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            n_mfcc: 40,
            n_fft: 2048,
            hop_length: 512,
            n_mels: 128,
            fmin: 0.0,
            fmax: None,
            top_db: Some(80.0),
        }
    }
}

/// Locations of the persisted model artifacts
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactPaths {
    pub model: PathBuf,
    pub scaler: PathBuf,
    pub labels: PathBuf,
}

impl Default for ArtifactPaths {
    fn default() -> Self {
        Self {
            model: PathBuf::from("assets/model.json"),
            scaler: PathBuf::from("assets/scaler.json"),
            labels: PathBuf::from("assets/labels.json"),
        }
    }
}

/// HTTP host configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address for the prediction service
    pub addr: String,
    /// Upper bound for an uploaded audio body
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:8501".to_string(),
            max_body_bytes: 25 * 1024 * 1024,
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
    /// The parsed configuration, or the defaults if the file is missing or
    /// the JSON is invalid (a warning is logged in both cases)
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

    /// Load configuration from the default location
    pub fn load() -> Self {
        Self::load_from_file(DEFAULT_CONFIG_PATH)
    }

    /// Reject settings the pipeline cannot run with
    pub fn validate(&self) -> Result<(), String> {
        let audio = &self.audio;
        if audio.target_sample_rate == 0 {
            return Err("audio.target_sample_rate must be > 0".to_string());
        }
        if !audio.offset_secs.is_finite() || audio.offset_secs < 0.0 {
            return Err("audio.offset_secs must be a non-negative number".to_string());
        }
        if !audio.duration_secs.is_finite() || audio.duration_secs <= 0.0 {
            return Err("audio.duration_secs must be > 0".to_string());
        }

        let features = &self.features;
        if features.n_fft < 2 || features.hop_length == 0 {
            return Err("features.n_fft must be >= 2 and hop_length > 0".to_string());
        }
        if features.n_mels == 0 || features.n_mfcc == 0 {
            return Err("features.n_mels and n_mfcc must be > 0".to_string());
        }
        if features.n_mfcc > features.n_mels {
            return Err(format!(
                "features.n_mfcc ({}) cannot exceed n_mels ({})",
                features.n_mfcc, features.n_mels
            ));
        }
        let nyquist = audio.target_sample_rate as f32 / 2.0;
        let fmax = features.fmax.unwrap_or(nyquist);
        if features.fmin < 0.0 || fmax <= features.fmin || fmax > nyquist {
            return Err(format!(
                "features.fmin/fmax must satisfy 0 <= fmin < fmax <= {}",
                nyquist
            ));
        }
        if let Some(top_db) = features.top_db {
            if !(top_db >= 0.0) {
                return Err("features.top_db must be non-negative".to_string());
            }
        }

        Ok(())
    }
}
