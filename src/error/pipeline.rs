// Pipeline error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Pipeline error code constants
///
/// Single source of truth for the codes reported by the CLI and the HTTP
/// service.
///
/// Error code range: 1001-1005
pub struct PipelineErrorCodes {}

impl PipelineErrorCodes {
    /// Input is not a parseable/supported audio container
    pub const DECODE: i32 = 1001;

    /// Decoded analysis window contains no samples
    pub const EMPTY_AUDIO: i32 = 1002;

    /// Waveform too short for a single analysis frame
    pub const INSUFFICIENT_SAMPLES: i32 = 1003;

    /// Vector width does not match the loaded artifact
    pub const SHAPE_MISMATCH: i32 = 1004;

    /// Predicted class index has no label
    pub const UNKNOWN_INDEX: i32 = 1005;
}

/// Who can fix a failed prediction
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The uploaded file is at fault; the user can retry with another file
    Input,
    /// Model, scaler and label table disagree; an operator must redeploy
    ArtifactMismatch,
}

/// Log a pipeline error with structured context
///
/// Emits a single line with the error code, its kind and the message.
/// The pipeline itself never logs; hosts call this when reporting a failure.
pub fn log_pipeline_error(err: &PipelineError, context: &str) {
    error!(
        "Pipeline error in {}: code={}, kind={:?}, message={}",
        context,
        err.code(),
        err.kind(),
        err.message()
    );
}

/// Per-request pipeline errors
///
/// None of these are retried: the input or the artifact pairing is the
/// cause, not a transient condition.
///
/// Error code range: 1001-1005
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineError {
    /// Input could not be decoded as audio
    Decode { reason: String },

    /// Analysis window starts beyond the end of the source
    EmptyAudio { offset_secs: f32, source_secs: f32 },

    /// Waveform shorter than the minimum analysis length
    InsufficientSamples { required: usize, available: usize },

    /// Vector width does not match the width a stage was loaded with
    ShapeMismatch {
        stage: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Argmax index missing from the label table
    UnknownIndex { index: usize, classes: usize },
}

impl PipelineError {
    /// Classify the failure as user-correctable or operator-facing
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::Decode { .. }
            | PipelineError::EmptyAudio { .. }
            | PipelineError::InsufficientSamples { .. } => ErrorKind::Input,
            PipelineError::ShapeMismatch { .. } | PipelineError::UnknownIndex { .. } => {
                ErrorKind::ArtifactMismatch
            }
        }
    }

    /// Convenience for `kind() == ErrorKind::Input`
    pub fn is_input_error(&self) -> bool {
        self.kind() == ErrorKind::Input
    }
}

impl ErrorCode for PipelineError {
    fn code(&self) -> i32 {
        match self {
            PipelineError::Decode { .. } => PipelineErrorCodes::DECODE,
            PipelineError::EmptyAudio { .. } => PipelineErrorCodes::EMPTY_AUDIO,
            PipelineError::InsufficientSamples { .. } => PipelineErrorCodes::INSUFFICIENT_SAMPLES,
            PipelineError::ShapeMismatch { .. } => PipelineErrorCodes::SHAPE_MISMATCH,
            PipelineError::UnknownIndex { .. } => PipelineErrorCodes::UNKNOWN_INDEX,
        }
    }

    fn message(&self) -> String {
        match self {
            PipelineError::Decode { reason } => {
                format!("Unable to decode audio: {}", reason)
            }
            PipelineError::EmptyAudio {
                offset_secs,
                source_secs,
            } => format!(
                "No audio after offset {:.2}s (source is {:.2}s long)",
                offset_secs, source_secs
            ),
            PipelineError::InsufficientSamples {
                required,
                available,
            } => format!(
                "Audio too short for feature extraction: need {} samples, got {}",
                required, available
            ),
            PipelineError::ShapeMismatch {
                stage,
                expected,
                actual,
            } => format!(
                "Shape mismatch in {}: expected width {}, got {}",
                stage, expected, actual
            ),
            PipelineError::UnknownIndex { index, classes } => format!(
                "Class index {} has no label (label table has {} entries)",
                index, classes
            ),
        }
    }
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PipelineError (code {}): {}", self.code(), self.message())
    }
}

impl std::error::Error for PipelineError {}
