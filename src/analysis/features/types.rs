// Types module - Data structures for audio features

use serde::Serialize;

/// Time-averaged cepstral coefficients of one clip
///
/// The same type carries the standardized vector after scaling; its length
/// is the model's input width (40 for the shipped model).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FeatureVector(pub Vec<f32>);

impl FeatureVector {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<f32> {
        self.0
    }
}

impl From<Vec<f32>> for FeatureVector {
    fn from(values: Vec<f32>) -> Self {
        Self(values)
    }
}

/// Cepstral coefficient matrix before time averaging
///
/// `coefficients[c][t]` is coefficient `c` of frame `t`.
#[derive(Debug, Clone, PartialEq)]
pub struct MfccMatrix {
    pub coefficients: Vec<Vec<f32>>,
    pub frames: usize,
}

impl MfccMatrix {
    /// Average each coefficient row over all frames
    pub fn time_mean(&self) -> FeatureVector {
        let frames = self.frames.max(1) as f64;
        FeatureVector(
            self.coefficients
                .iter()
                .map(|row| (row.iter().map(|&v| f64::from(v)).sum::<f64>() / frames) as f32)
                .collect(),
        )
    }
}
