use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use emotion_classifier::config::{AppConfig, DEFAULT_CONFIG_PATH};
use emotion_classifier::error::log_artifact_error;
use emotion_classifier::http::{run_http_server, HttpState};
use emotion_classifier::AppContext;

#[derive(Parser, Debug)]
#[command(
    name = "emotion_server",
    about = "Serve speech emotion predictions over HTTP"
)]
struct Args {
    /// JSON configuration file
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
    /// Bind address, overriding server.addr from the configuration
    #[arg(long)]
    addr: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    emotion_classifier::init_logging();
    let args = Args::parse();

    let config = AppConfig::load_from_file(&args.config);
    let addr: SocketAddr = args
        .addr
        .as_deref()
        .unwrap_or(&config.server.addr)
        .parse()
        .context("parsing bind address")?;

    // Artifact problems are fatal: refuse to serve with a broken pipeline.
    let context = AppContext::load(config).map_err(|err| {
        log_artifact_error(&err, "startup");
        anyhow::Error::new(err).context("loading model artifacts")
    })?;

    let state = HttpState::new(Arc::new(context));
    tokio::select! {
        result = run_http_server(state, addr) => result,
        _ = tokio::signal::ctrl_c() => {
            log::info!("[Http] Shutdown requested");
            Ok(())
        }
    }
}
