// FeatureScaler - persisted per-dimension standardization
//
// Parameters are fitted at training time; this side only applies them.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::analysis::features::FeatureVector;
use crate::error::{ArtifactError, PipelineError};

/// Persisted mean/scale pair, one entry per feature dimension
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalerParams {
    pub mean: Vec<f32>,
    pub scale: Vec<f32>,
}

/// Applies `(x - mean) / scale` per dimension
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureScaler {
    params: ScalerParams,
}

impl FeatureScaler {
    /// Build a scaler, rejecting parameters that could never be applied
    pub fn new(params: ScalerParams) -> Result<Self, ArtifactError> {
        if params.mean.is_empty() {
            return Err(ArtifactError::invalid("scaler", "mean vector is empty"));
        }
        if params.mean.len() != params.scale.len() {
            return Err(ArtifactError::invalid(
                "scaler",
                format!(
                    "mean has {} entries but scale has {}",
                    params.mean.len(),
                    params.scale.len()
                ),
            ));
        }
        if let Some(dim) = params.mean.iter().position(|m| !m.is_finite()) {
            return Err(ArtifactError::invalid(
                "scaler",
                format!("mean[{}] is not finite", dim),
            ));
        }
        if let Some(dim) = params
            .scale
            .iter()
            .position(|s| !s.is_finite() || *s == 0.0)
        {
            return Err(ArtifactError::invalid(
                "scaler",
                format!("scale[{}] must be finite and non-zero", dim),
            ));
        }

        Ok(Self { params })
    }

    /// Load scaler parameters from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ArtifactError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|err| ArtifactError::io(path, err))?;
        let params: ScalerParams =
            serde_json::from_str(&json).map_err(|err| ArtifactError::parse(path, err))?;
        Self::new(params)
    }

    /// Number of dimensions the scaler was fitted on
    pub fn dimensions(&self) -> usize {
        self.params.mean.len()
    }

    pub fn params(&self) -> &ScalerParams {
        &self.params
    }

    /// Standardize a feature vector
    pub fn transform(&self, features: &FeatureVector) -> Result<FeatureVector, PipelineError> {
        self.check_width(features)?;
        Ok(FeatureVector(
            features
                .as_slice()
                .iter()
                .zip(self.params.mean.iter().zip(&self.params.scale))
                .map(|(x, (mean, scale))| (x - mean) / scale)
                .collect(),
        ))
    }

    /// Undo `transform`
    pub fn inverse_transform(&self, scaled: &FeatureVector) -> Result<FeatureVector, PipelineError> {
        self.check_width(scaled)?;
        Ok(FeatureVector(
            scaled
                .as_slice()
                .iter()
                .zip(self.params.mean.iter().zip(&self.params.scale))
                .map(|(z, (mean, scale))| z * scale + mean)
                .collect(),
        ))
    }

    fn check_width(&self, features: &FeatureVector) -> Result<(), PipelineError> {
        if features.len() != self.dimensions() {
            return Err(PipelineError::ShapeMismatch {
                stage: "scaler",
                expected: self.dimensions(),
                actual: features.len(),
            });
        }
        Ok(())
    }
}
