// Error types for the emotion classifier
//
// This module defines the error taxonomy for the prediction pipeline and for
// artifact loading, providing structured error handling with numeric error
// codes suitable for CLI exit codes and HTTP payloads.

mod artifact;
mod pipeline;

pub use artifact::{log_artifact_error, ArtifactError, ArtifactErrorCodes};
pub use pipeline::{log_pipeline_error, ErrorKind, PipelineError, PipelineErrorCodes};

/// Error codes for structured error reporting
///
/// This trait provides a standard way to get error codes and messages
/// from custom error types, enabling consistent error handling across
/// the CLI and HTTP surfaces.
pub trait ErrorCode {
    /// Get the numeric error code
    fn code(&self) -> i32;

    /// Get the human-readable error message
    fn message(&self) -> String;
}
