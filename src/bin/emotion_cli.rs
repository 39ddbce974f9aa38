use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use emotion_classifier::analysis::{ClassProbability, MfccExtractor};
use emotion_classifier::audio::{AudioLoader, Peak};
use emotion_classifier::config::{AppConfig, DEFAULT_CONFIG_PATH};
use emotion_classifier::error::{log_artifact_error, log_pipeline_error};
use emotion_classifier::{AppContext, ErrorCode, ErrorKind, PipelineError};
use serde::Serialize;

const EXIT_INPUT_ERROR: u8 = 2;
const EXIT_ARTIFACT_MISMATCH: u8 = 3;

#[derive(Parser, Debug)]
#[command(
    name = "emotion_cli",
    about = "Classify the emotion expressed in a recorded speech clip"
)]
struct Cli {
    /// JSON configuration file (defaults to assets/emotion_config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Override the model artifact path
    #[arg(long, global = true)]
    model: Option<PathBuf>,
    /// Override the scaler artifact path
    #[arg(long, global = true)]
    scaler: Option<PathBuf>,
    /// Override the label table path
    #[arg(long, global = true)]
    labels: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Classify a clip and print a JSON report
    Predict {
        #[arg(long)]
        input: PathBuf,
        /// Write the report here instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
        /// Save the analysed window as a 16-bit WAV
        #[arg(long)]
        waveform_out: Option<PathBuf>,
        /// Number of waveform envelope buckets to include in the report
        #[arg(long, default_value_t = 0)]
        peaks: usize,
    },
    /// Print the unscaled MFCC summary of a clip
    Features {
        #[arg(long)]
        input: PathBuf,
    },
    /// Summarise the loaded artifacts
    Inspect,
}

fn main() -> ExitCode {
    emotion_classifier::init_logging();
    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = resolve_config(&cli);

    match cli.command {
        Commands::Predict {
            input,
            output,
            waveform_out,
            peaks,
        } => run_predict(config, &input, output, waveform_out, peaks),
        Commands::Features { input } => run_features(&config, &input),
        Commands::Inspect => run_inspect(config),
    }
}

fn resolve_config(cli: &Cli) -> AppConfig {
    let mut config = AppConfig::load_from_file(
        cli.config
            .as_deref()
            .unwrap_or_else(|| Path::new(DEFAULT_CONFIG_PATH)),
    );
    if let Some(model) = &cli.model {
        config.artifacts.model = model.clone();
    }
    if let Some(scaler) = &cli.scaler {
        config.artifacts.scaler = scaler.clone();
    }
    if let Some(labels) = &cli.labels {
        config.artifacts.labels = labels.clone();
    }
    config
}

fn load_context(config: AppConfig) -> Result<AppContext> {
    AppContext::load(config).map_err(|err| {
        log_artifact_error(&err, "startup");
        anyhow::Error::new(err).context("loading model artifacts")
    })
}

fn run_predict(
    config: AppConfig,
    input: &Path,
    output_path: Option<PathBuf>,
    waveform_out: Option<PathBuf>,
    peaks: usize,
) -> Result<ExitCode> {
    let context = load_context(config)?;
    let prediction = match context.predict_path(input) {
        Ok(prediction) => prediction,
        Err(err) => return Ok(report_pipeline_error(&err, input)),
    };
    tracing::debug!(
        "[Predict] {} -> {} ({:.1}%)",
        input.display(),
        prediction.label,
        prediction.confidence
    );

    if let Some(path) = &waveform_out {
        prediction
            .waveform
            .write_wav(path)
            .with_context(|| format!("writing {}", path.display()))?;
    }

    let report = PredictionReport {
        input: input.display().to_string(),
        label: &prediction.label,
        class_index: prediction.class_index,
        confidence: prediction.confidence,
        probabilities: &prediction.probabilities,
        sample_rate: prediction.waveform.sample_rate,
        duration_secs: prediction.waveform.duration_secs(),
        peaks: if peaks > 0 {
            prediction.waveform.peaks(peaks)
        } else {
            Vec::new()
        },
    };
    let json = serde_json::to_string_pretty(&report)?;

    if let Some(path) = output_path {
        fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
    } else {
        println!("{json}");
    }

    Ok(ExitCode::from(0))
}

fn run_features(config: &AppConfig, input: &Path) -> Result<ExitCode> {
    config
        .validate()
        .map_err(|reason| anyhow::anyhow!("invalid configuration: {reason}"))?;

    let loader = AudioLoader::new(&config.audio);
    let extractor = MfccExtractor::new(loader.target_sample_rate(), &config.features);
    let features = match loader
        .load_path(input)
        .and_then(|waveform| extractor.extract(&waveform))
    {
        Ok(features) => features,
        Err(err) => return Ok(report_pipeline_error(&err, input)),
    };

    let report = FeatureReport {
        input: input.display().to_string(),
        sample_rate: extractor.sample_rate(),
        coefficients: features.as_slice(),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(ExitCode::from(0))
}

fn run_inspect(config: AppConfig) -> Result<ExitCode> {
    let context = load_context(config)?;
    let artifacts = &context.config().artifacts;
    let report = InspectReport {
        model: artifacts.model.display().to_string(),
        scaler: artifacts.scaler.display().to_string(),
        labels_path: artifacts.labels.display().to_string(),
        input_width: context.network().input_width(),
        output_width: context.network().output_width(),
        layers: context.network().summary(),
        labels: context.labels().labels(),
        sample_rate: context.config().audio.target_sample_rate,
        n_mfcc: context.config().features.n_mfcc,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(ExitCode::from(0))
}

fn report_pipeline_error(err: &PipelineError, input: &Path) -> ExitCode {
    log_pipeline_error(err, &input.display().to_string());

    let payload = serde_json::json!({
        "error": err.message(),
        "code": err.code(),
        "kind": err.kind(),
        "input": input.display().to_string(),
    });
    eprintln!("{payload}");

    match err.kind() {
        ErrorKind::Input => ExitCode::from(EXIT_INPUT_ERROR),
        ErrorKind::ArtifactMismatch => ExitCode::from(EXIT_ARTIFACT_MISMATCH),
    }
}

#[derive(Serialize)]
struct PredictionReport<'a> {
    input: String,
    label: &'a str,
    class_index: usize,
    confidence: f32,
    probabilities: &'a [ClassProbability],
    sample_rate: u32,
    duration_secs: f32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    peaks: Vec<Peak>,
}

#[derive(Serialize)]
struct FeatureReport<'a> {
    input: String,
    sample_rate: u32,
    coefficients: &'a [f32],
}

#[derive(Serialize)]
struct InspectReport<'a> {
    model: String,
    scaler: String,
    labels_path: String,
    input_width: usize,
    output_width: usize,
    layers: &'a [String],
    labels: &'a [String],
    sample_rate: u32,
    n_mfcc: usize,
}
