// Emotion Classifier Core - speech emotion recognition pipeline
// Audio clip → MFCC summary → standardization → feed-forward network → label

// Module declarations
pub mod analysis;
pub mod audio;
pub mod config;
pub mod context;
pub mod error;
#[cfg(feature = "http")]
pub mod http;
pub mod testing;

// Re-exports for convenience
pub use analysis::Prediction;
pub use config::AppConfig;
pub use context::AppContext;
pub use error::{ArtifactError, ErrorCode, ErrorKind, PipelineError};

/// Initialize logging for host binaries
///
/// Installs a `tracing` fmt subscriber on stderr (stdout is reserved for JSON
/// reports). `log` records from the library are forwarded to it; `RUST_LOG`
/// overrides the default `info` level.
pub fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
