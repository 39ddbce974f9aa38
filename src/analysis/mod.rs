// Analysis module - feature extraction and inference stages
//
// Pipeline: MfccExtractor → FeatureScaler → Network → LabelTable
//
// Each stage is a pure function of its input and the immutable state it was
// built with. Orchestration (and ownership of that state) lives in
// `crate::context::AppContext`.

pub mod classifier;
pub mod features;
pub mod labels;
pub mod scaler;

pub use classifier::{Distribution, Network};
pub use features::{FeatureVector, MfccExtractor};
pub use labels::{DecodedLabel, LabelTable};
pub use scaler::{FeatureScaler, ScalerParams};

use serde::Serialize;

use crate::audio::Waveform;

/// Probability of one class, labelled
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassProbability {
    pub label: String,
    pub probability: f32,
}

/// Result of one pass through the pipeline
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    /// Predicted emotion
    pub label: String,
    /// Index of the predicted class in the label table
    pub class_index: usize,
    /// Winning probability as a percentage (0-100)
    pub confidence: f32,
    /// Full distribution in label-table order
    pub probabilities: Vec<ClassProbability>,
    /// The analysed window, for visualisation by the host
    #[serde(skip)]
    pub waveform: Waveform,
}
