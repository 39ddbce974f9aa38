// Label decoding - class index to emotion name

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::analysis::classifier::Distribution;
use crate::error::{ArtifactError, PipelineError};

/// On-disk label table: a plain list in class order, or an index map
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LabelFile {
    List(Vec<String>),
    Indexed(BTreeMap<String, String>),
}

/// Immutable index -> label mapping
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct LabelTable {
    labels: Vec<String>,
}

/// Winning class of one prediction
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecodedLabel {
    pub class_index: usize,
    pub label: String,
    /// Winning probability as a percentage (0-100)
    pub confidence: f32,
}

impl LabelTable {
    pub fn new(labels: Vec<String>) -> Result<Self, ArtifactError> {
        if labels.is_empty() {
            return Err(ArtifactError::invalid("label table", "no labels"));
        }
        if let Some(idx) = labels.iter().position(|l| l.trim().is_empty()) {
            return Err(ArtifactError::invalid(
                "label table",
                format!("label {} is blank", idx),
            ));
        }
        Ok(Self { labels })
    }

    /// Load a label table from JSON
    ///
    /// Accepts `["angry", "calm", ...]` or `{"0": "angry", "1": "calm", ...}`;
    /// the index form must cover 0..K-1 without gaps.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ArtifactError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|err| ArtifactError::io(path, err))?;
        let file: LabelFile =
            serde_json::from_str(&json).map_err(|err| ArtifactError::parse(path, err))?;

        match file {
            LabelFile::List(labels) => Self::new(labels),
            LabelFile::Indexed(map) => {
                let mut indexed = Vec::with_capacity(map.len());
                for (key, label) in map {
                    let index = key.trim().parse::<usize>().map_err(|_| {
                        ArtifactError::invalid(
                            "label table",
                            format!("key {:?} is not a class index", key),
                        )
                    })?;
                    indexed.push((index, label));
                }
                indexed.sort_by_key(|(index, _)| *index);

                if let Some(pos) = indexed.iter().enumerate().position(|(i, (idx, _))| i != *idx) {
                    return Err(ArtifactError::invalid(
                        "label table",
                        format!("class index {} is missing", pos),
                    ));
                }

                Self::new(indexed.into_iter().map(|(_, label)| label).collect())
            }
        }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Pick the most probable class and look up its label
    ///
    /// # Errors
    /// `UnknownIndex` when the winning index is outside the table, which
    /// means the model and label table were not exported together.
    pub fn decode(&self, distribution: &Distribution) -> Result<DecodedLabel, PipelineError> {
        let (class_index, probability) =
            distribution
                .argmax()
                .ok_or(PipelineError::ShapeMismatch {
                    stage: "label decoder",
                    expected: self.len(),
                    actual: 0,
                })?;

        let label = self.get(class_index).ok_or(PipelineError::UnknownIndex {
            index: class_index,
            classes: self.len(),
        })?;

        Ok(DecodedLabel {
            class_index,
            label: label.to_string(),
            confidence: probability * 100.0,
        })
    }
}
