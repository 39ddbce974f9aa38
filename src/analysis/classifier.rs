// Classifier - feed-forward emotion network
//
// This module evaluates the persisted dense network on a standardized feature
// vector. The network is exported from the training notebook as JSON and
// supports the layer kinds such a model is built from:
//
// - dense: kernel [in][out], bias [out], activation
// - batch_norm: inference-mode normalization with moving statistics
// - dropout: identity at inference time
//
// The last layer must be a softmax dense layer, so every prediction is a
// probability distribution over the trained classes.

use std::fs;
use std::path::Path;

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::analysis::features::FeatureVector;
use crate::error::{ArtifactError, PipelineError};

/// Activation applied after a dense layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    #[default]
    Linear,
    Relu,
    Sigmoid,
    Tanh,
    Softmax,
}

/// Persisted layer description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LayerSpec {
    Dense {
        kernel: Vec<Vec<f32>>,
        bias: Vec<f32>,
        #[serde(default)]
        activation: Activation,
    },
    BatchNorm {
        gamma: Vec<f32>,
        beta: Vec<f32>,
        moving_mean: Vec<f32>,
        moving_variance: Vec<f32>,
        #[serde(default = "default_epsilon")]
        epsilon: f32,
    },
    Dropout {
        #[serde(default)]
        rate: f32,
    },
}

fn default_epsilon() -> f32 {
    1e-3
}

/// Persisted model file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSpec {
    pub input_width: usize,
    pub layers: Vec<LayerSpec>,
}

/// Class probabilities in label-table order
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Distribution(pub Vec<f32>);

impl Distribution {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn probabilities(&self) -> &[f32] {
        &self.0
    }

    pub fn sum(&self) -> f32 {
        self.0.iter().sum()
    }

    /// Index and value of the largest probability
    ///
    /// Ties resolve to the lowest index. Returns `None` for an empty
    /// distribution.
    pub fn argmax(&self) -> Option<(usize, f32)> {
        self.0.iter().copied().enumerate().fold(None, |best, (i, p)| match best {
            Some((_, best_p)) if p <= best_p => best,
            _ => Some((i, p)),
        })
    }
}

enum Layer {
    Dense {
        kernel: Array2<f32>,
        bias: Array1<f32>,
        activation: Activation,
    },
    /// Batch norm folded into `x * scale + shift`
    BatchNorm {
        scale: Array1<f32>,
        shift: Array1<f32>,
    },
    Dropout,
}

impl Layer {
    fn forward(&self, input: Array1<f32>) -> Array1<f32> {
        match self {
            Layer::Dense {
                kernel,
                bias,
                activation,
            } => {
                let mut output = input.dot(kernel) + bias;
                apply_activation(&mut output, *activation);
                output
            }
            Layer::BatchNorm { scale, shift } => input * scale + shift,
            Layer::Dropout => input,
        }
    }
}

fn apply_activation(values: &mut Array1<f32>, activation: Activation) {
    match activation {
        Activation::Linear => {}
        Activation::Relu => values.mapv_inplace(|v| v.max(0.0)),
        Activation::Sigmoid => values.mapv_inplace(|v| 1.0 / (1.0 + (-v).exp())),
        Activation::Tanh => values.mapv_inplace(f32::tanh),
        Activation::Softmax => {
            let max = values.fold(f32::NEG_INFINITY, |acc, &v| acc.max(v));
            values.mapv_inplace(|v| (v - max).exp());
            let sum = values.sum();
            values.mapv_inplace(|v| v / sum);
        }
    }
}

fn check_finite(artifact_layer: usize, name: &str, values: &[f32]) -> Result<(), ArtifactError> {
    if values.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(ArtifactError::invalid(
            "model",
            format!("layer {} {} contains non-finite values", artifact_layer, name),
        ))
    }
}

fn check_len(layer: usize, name: &str, values: &[f32], width: usize) -> Result<(), ArtifactError> {
    if values.len() != width {
        return Err(ArtifactError::invalid(
            "model",
            format!(
                "layer {} {} has {} entries, expected {}",
                layer,
                name,
                values.len(),
                width
            ),
        ));
    }
    check_finite(layer, name, values)
}

/// Loaded feed-forward network
///
/// Immutable after construction; `predict` takes `&self` and may be called
/// from any number of threads.
pub struct Network {
    input_width: usize,
    output_width: usize,
    layers: Vec<Layer>,
    summary: Vec<String>,
}

impl Network {
    /// Validate a model description and build the network
    pub fn from_spec(spec: ModelSpec) -> Result<Self, ArtifactError> {
        if spec.input_width == 0 {
            return Err(ArtifactError::invalid("model", "input_width must be > 0"));
        }

        let mut width = spec.input_width;
        let mut layers = Vec::with_capacity(spec.layers.len());
        let mut summary = Vec::with_capacity(spec.layers.len());

        for (idx, layer) in spec.layers.into_iter().enumerate() {
            match layer {
                LayerSpec::Dense {
                    kernel,
                    bias,
                    activation,
                } => {
                    if kernel.len() != width {
                        return Err(ArtifactError::invalid(
                            "model",
                            format!(
                                "layer {} kernel has {} rows, expected {}",
                                idx,
                                kernel.len(),
                                width
                            ),
                        ));
                    }
                    let units = bias.len();
                    if units == 0 {
                        return Err(ArtifactError::invalid(
                            "model",
                            format!("layer {} has no units", idx),
                        ));
                    }
                    if let Some(row) = kernel.iter().position(|row| row.len() != units) {
                        return Err(ArtifactError::invalid(
                            "model",
                            format!(
                                "layer {} kernel row {} has {} columns, expected {}",
                                idx,
                                row,
                                kernel[row].len(),
                                units
                            ),
                        ));
                    }

                    let flat: Vec<f32> = kernel.into_iter().flatten().collect();
                    check_finite(idx, "kernel", &flat)?;
                    check_finite(idx, "bias", &bias)?;
                    let kernel = Array2::from_shape_vec((width, units), flat)
                        .map_err(|err| ArtifactError::invalid("model", err.to_string()))?;

                    summary.push(format!("dense {}->{} {:?}", width, units, activation));
                    layers.push(Layer::Dense {
                        kernel,
                        bias: Array1::from(bias),
                        activation,
                    });
                    width = units;
                }
                LayerSpec::BatchNorm {
                    gamma,
                    beta,
                    moving_mean,
                    moving_variance,
                    epsilon,
                } => {
                    check_len(idx, "gamma", &gamma, width)?;
                    check_len(idx, "beta", &beta, width)?;
                    check_len(idx, "moving_mean", &moving_mean, width)?;
                    check_len(idx, "moving_variance", &moving_variance, width)?;
                    if moving_variance.iter().any(|v| v + epsilon <= 0.0) {
                        return Err(ArtifactError::invalid(
                            "model",
                            format!("layer {} variance + epsilon must be positive", idx),
                        ));
                    }

                    let scale: Array1<f32> = gamma
                        .iter()
                        .zip(&moving_variance)
                        .map(|(g, var)| g / (var + epsilon).sqrt())
                        .collect();
                    let shift: Array1<f32> = beta
                        .iter()
                        .zip(&moving_mean)
                        .zip(scale.iter())
                        .map(|((b, mean), s)| b - mean * s)
                        .collect();

                    summary.push(format!("batch_norm {}", width));
                    layers.push(Layer::BatchNorm { scale, shift });
                }
                LayerSpec::Dropout { rate } => {
                    summary.push(format!("dropout {:.2}", rate));
                    layers.push(Layer::Dropout);
                }
            }
        }

        match layers.last() {
            Some(Layer::Dense {
                activation: Activation::Softmax,
                ..
            }) => {}
            _ => {
                return Err(ArtifactError::invalid(
                    "model",
                    "final layer must be a dense layer with softmax activation",
                ))
            }
        }

        Ok(Self {
            input_width: spec.input_width,
            output_width: width,
            layers,
            summary,
        })
    }

    /// Load and validate a JSON model file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ArtifactError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|err| ArtifactError::io(path, err))?;
        let spec: ModelSpec =
            serde_json::from_str(&json).map_err(|err| ArtifactError::parse(path, err))?;
        Self::from_spec(spec)
    }

    pub fn input_width(&self) -> usize {
        self.input_width
    }

    /// Number of classes (K)
    pub fn output_width(&self) -> usize {
        self.output_width
    }

    /// One line per layer, for diagnostics
    pub fn summary(&self) -> &[String] {
        &self.summary
    }

    /// Run the network on a standardized feature vector
    ///
    /// # Errors
    /// `ShapeMismatch` when the vector width differs from `input_width()`
    pub fn predict(&self, features: &FeatureVector) -> Result<Distribution, PipelineError> {
        if features.len() != self.input_width {
            return Err(PipelineError::ShapeMismatch {
                stage: "classifier",
                expected: self.input_width,
                actual: features.len(),
            });
        }

        let output = self
            .layers
            .iter()
            .fold(Array1::from(features.as_slice().to_vec()), |x, layer| {
                layer.forward(x)
            });

        Ok(Distribution(output.to_vec()))
    }
}

#[cfg(test)]
#[path = "classifier_tests.rs"]
mod tests;
