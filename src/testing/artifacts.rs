//! Fixture model artifacts for tests and demos.
//!
//! Real artifacts come out of the training notebook; these builders produce
//! small, fully deterministic stand-ins with the same file formats.

use std::fs;
use std::io;
use std::path::Path;

use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::analysis::classifier::{Activation, LayerSpec, ModelSpec};
use crate::analysis::features::FeatureVector;
use crate::analysis::scaler::ScalerParams;
use crate::config::ArtifactPaths;

/// Scaler that leaves vectors unchanged
pub fn identity_scaler(width: usize) -> ScalerParams {
    ScalerParams {
        mean: vec![0.0; width],
        scale: vec![1.0; width],
    }
}

/// Randomly initialised `input -> hidden (relu) -> classes (softmax)` network
pub fn random_model(input_width: usize, hidden: usize, classes: usize, seed: u64) -> ModelSpec {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut dense = |inputs: usize, units: usize, activation| {
        let limit = (6.0 / (inputs + units) as f32).sqrt();
        LayerSpec::Dense {
            kernel: (0..inputs)
                .map(|_| (0..units).map(|_| rng.gen_range(-limit..limit)).collect())
                .collect(),
            bias: vec![0.0; units],
            activation,
        }
    };

    ModelSpec {
        input_width,
        layers: vec![
            dense(input_width, hidden, Activation::Relu),
            LayerSpec::Dropout { rate: 0.2 },
            dense(hidden, classes, Activation::Softmax),
        ],
    }
}

/// Fit a two-class linear softmax separating two reference vectors
///
/// The scaler centres on the midpoint of the two references; the single
/// dense layer projects onto the direction between them. Vectors closer to
/// `positive` get class 0, vectors closer to `negative` class 1.
pub fn fit_two_class(positive: &FeatureVector, negative: &FeatureVector) -> (ModelSpec, ScalerParams) {
    let width = positive.len().min(negative.len());
    let a = &positive.as_slice()[..width];
    let b = &negative.as_slice()[..width];

    let mean: Vec<f32> = a.iter().zip(b).map(|(x, y)| (x + y) / 2.0).collect();
    let scale: Vec<f32> = a
        .iter()
        .zip(b)
        .map(|(x, y)| ((x - y).abs() / 2.0).max(1.0))
        .collect();

    let direction: Vec<f32> = a
        .iter()
        .zip(&mean)
        .zip(&scale)
        .map(|((x, m), s)| (x - m) / s)
        .collect();
    let norm = direction.iter().map(|d| d * d).sum::<f32>().sqrt().max(f32::EPSILON);

    let kernel = direction
        .iter()
        .map(|d| vec![d / norm, -d / norm])
        .collect();

    (
        ModelSpec {
            input_width: width,
            layers: vec![LayerSpec::Dense {
                kernel,
                bias: vec![0.0, 0.0],
                activation: Activation::Softmax,
            }],
        },
        ScalerParams { mean, scale },
    )
}

/// Write the three artifact files into `dir` and return their paths
pub fn write_artifacts(
    dir: &Path,
    model: &ModelSpec,
    scaler: &ScalerParams,
    labels: &[&str],
) -> io::Result<ArtifactPaths> {
    let paths = ArtifactPaths {
        model: dir.join("model.json"),
        scaler: dir.join("scaler.json"),
        labels: dir.join("labels.json"),
    };

    fs::write(&paths.model, serde_json::to_string_pretty(model)?)?;
    fs::write(&paths.scaler, serde_json::to_string_pretty(scaler)?)?;
    fs::write(&paths.labels, serde_json::to_string_pretty(labels)?)?;

    Ok(paths)
}
