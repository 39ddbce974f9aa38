// Artifact error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;
use std::path::{Path, PathBuf};

/// Artifact error code constants
///
/// Error code range: 2001-2004
pub struct ArtifactErrorCodes {}

impl ArtifactErrorCodes {
    /// Artifact file could not be read
    pub const IO: i32 = 2001;

    /// Artifact file is not valid JSON for its schema
    pub const PARSE: i32 = 2002;

    /// Artifact parsed but violates its own invariants
    pub const INVALID: i32 = 2003;

    /// Artifacts were not exported together
    pub const INCONSISTENT: i32 = 2004;
}

/// Log an artifact error with structured context
pub fn log_artifact_error(err: &ArtifactError, context: &str) {
    error!(
        "Artifact error in {}: code={}, component=AppContext, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Errors raised while loading the model, scaler or label table
///
/// All of these are fatal at process start.
///
/// Error code range: 2001-2004
#[derive(Debug, Clone, PartialEq)]
pub enum ArtifactError {
    /// File missing or unreadable
    Io { path: PathBuf, details: String },

    /// JSON did not match the expected schema
    Parse { path: PathBuf, details: String },

    /// Structurally valid but unusable contents
    Invalid {
        artifact: &'static str,
        reason: String,
    },

    /// Cross-artifact width disagreement
    Inconsistent { reason: String },
}

impl ArtifactError {
    pub(crate) fn io(path: &Path, err: impl fmt::Display) -> Self {
        ArtifactError::Io {
            path: path.to_path_buf(),
            details: err.to_string(),
        }
    }

    pub(crate) fn parse(path: &Path, err: impl fmt::Display) -> Self {
        ArtifactError::Parse {
            path: path.to_path_buf(),
            details: err.to_string(),
        }
    }

    pub(crate) fn invalid(artifact: &'static str, reason: impl Into<String>) -> Self {
        ArtifactError::Invalid {
            artifact,
            reason: reason.into(),
        }
    }
}

impl ErrorCode for ArtifactError {
    fn code(&self) -> i32 {
        match self {
            ArtifactError::Io { .. } => ArtifactErrorCodes::IO,
            ArtifactError::Parse { .. } => ArtifactErrorCodes::PARSE,
            ArtifactError::Invalid { .. } => ArtifactErrorCodes::INVALID,
            ArtifactError::Inconsistent { .. } => ArtifactErrorCodes::INCONSISTENT,
        }
    }

    fn message(&self) -> String {
        match self {
            ArtifactError::Io { path, details } => {
                format!("Failed to read {}: {}", path.display(), details)
            }
            ArtifactError::Parse { path, details } => {
                format!("Failed to parse {}: {}", path.display(), details)
            }
            ArtifactError::Invalid { artifact, reason } => {
                format!("Invalid {}: {}", artifact, reason)
            }
            ArtifactError::Inconsistent { reason } => {
                format!("Artifacts do not belong together: {}", reason)
            }
        }
    }
}

impl fmt::Display for ArtifactError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ArtifactError (code {}): {}", self.code(), self.message())
    }
}

impl std::error::Error for ArtifactError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_error_codes() {
        let path = Path::new("assets/model.json");
        assert_eq!(ArtifactError::io(path, "missing").code(), 2001);
        assert_eq!(ArtifactError::parse(path, "eof").code(), 2002);
        assert_eq!(ArtifactError::invalid("scaler", "zero scale").code(), 2003);
        assert_eq!(
            ArtifactError::Inconsistent {
                reason: "widths".into()
            }
            .code(),
            2004
        );
    }

    #[test]
    fn test_artifact_error_message_names_path() {
        let err = ArtifactError::io(Path::new("assets/labels.json"), "No such file");
        assert!(err.message().contains("assets/labels.json"));
        assert!(err.message().contains("No such file"));
    }
}
