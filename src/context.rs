// AppContext: Dependency Injection Container
// Holds the loaded artifacts and runs the prediction pipeline

use std::path::Path;

use log::info;

use crate::analysis::{
    ClassProbability, FeatureScaler, FeatureVector, LabelTable, MfccExtractor, Network, Prediction,
};
use crate::audio::{AudioLoader, Waveform};
use crate::config::AppConfig;
use crate::error::{ArtifactError, PipelineError};

/// AppContext: everything a request needs, loaded once per process
///
/// Consolidates the process-lifetime state into a single value that hosts
/// construct at startup and share by reference (or `Arc`):
/// - Audio loader settings (offset, duration, target rate)
/// - MFCC tables for the target rate
/// - Feature scaler, network and label table
///
/// Nothing is mutated after construction, so the context is `Send + Sync`
/// and `predict_*` can run concurrently without locks. There is no reload
/// path: a new deployment means a new process.
pub struct AppContext {
    config: AppConfig,
    loader: AudioLoader,
    extractor: MfccExtractor,
    scaler: FeatureScaler,
    network: Network,
    labels: LabelTable,
}

impl AppContext {
    /// Load all artifacts named by `config`
    ///
    /// Fails if any artifact is missing, unparseable or invalid, or if the
    /// three artifacts disagree about vector widths. Callers treat any error
    /// here as fatal.
    pub fn load(config: AppConfig) -> Result<Self, ArtifactError> {
        let paths = config.artifacts.clone();

        let network = Network::load(&paths.model)?;
        info!(
            "[Artifacts] Loaded model {:?}: {} -> {} ({} layers)",
            paths.model,
            network.input_width(),
            network.output_width(),
            network.summary().len()
        );

        let scaler = FeatureScaler::load(&paths.scaler)?;
        info!(
            "[Artifacts] Loaded scaler {:?}: {} dimensions",
            paths.scaler,
            scaler.dimensions()
        );

        let labels = LabelTable::load(&paths.labels)?;
        info!(
            "[Artifacts] Loaded label table {:?}: {:?}",
            paths.labels,
            labels.labels()
        );

        Self::from_parts(config, scaler, network, labels)
    }

    /// Assemble a context from already-loaded artifacts
    pub fn from_parts(
        config: AppConfig,
        scaler: FeatureScaler,
        network: Network,
        labels: LabelTable,
    ) -> Result<Self, ArtifactError> {
        config
            .validate()
            .map_err(|reason| ArtifactError::invalid("config", reason))?;

        let loader = AudioLoader::new(&config.audio);
        let extractor = MfccExtractor::new(loader.target_sample_rate(), &config.features);

        check_consistency(&extractor, &scaler, &network, &labels)?;

        Ok(Self {
            config,
            loader,
            extractor,
            scaler,
            network,
            labels,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    pub fn scaler(&self) -> &FeatureScaler {
        &self.scaler
    }

    pub fn labels(&self) -> &LabelTable {
        &self.labels
    }

    /// Decode the analysis window of a file
    pub fn load_waveform(&self, path: &Path) -> Result<Waveform, PipelineError> {
        self.loader.load_path(path)
    }

    /// Unscaled feature vector of a waveform
    pub fn extract_features(&self, waveform: &Waveform) -> Result<FeatureVector, PipelineError> {
        self.extractor.extract(waveform)
    }

    /// Run extraction, scaling, inference and decoding on a waveform
    pub fn predict_waveform(&self, waveform: Waveform) -> Result<Prediction, PipelineError> {
        let features = self.extractor.extract(&waveform)?;
        let scaled = self.scaler.transform(&features)?;
        let distribution = self.network.predict(&scaled)?;
        let decoded = self.labels.decode(&distribution)?;

        let probabilities = self
            .labels
            .labels()
            .iter()
            .zip(distribution.probabilities())
            .map(|(label, &probability)| ClassProbability {
                label: label.clone(),
                probability,
            })
            .collect();

        Ok(Prediction {
            label: decoded.label,
            class_index: decoded.class_index,
            confidence: decoded.confidence,
            probabilities,
            waveform,
        })
    }

    /// Full pipeline on a file
    pub fn predict_path(&self, path: &Path) -> Result<Prediction, PipelineError> {
        let waveform = self.loader.load_path(path)?;
        self.predict_waveform(waveform)
    }

    /// Full pipeline on an in-memory clip
    ///
    /// `extension` is an optional container hint such as `"wav"`.
    pub fn predict_bytes(&self, data: &[u8], extension: Option<&str>) -> Result<Prediction, PipelineError> {
        let waveform = self.loader.load_bytes(data, extension)?;
        self.predict_waveform(waveform)
    }
}

fn check_consistency(
    extractor: &MfccExtractor,
    scaler: &FeatureScaler,
    network: &Network,
    labels: &LabelTable,
) -> Result<(), ArtifactError> {
    if scaler.dimensions() != extractor.n_mfcc() {
        return Err(ArtifactError::Inconsistent {
            reason: format!(
                "scaler has {} dimensions but the extractor produces {} coefficients",
                scaler.dimensions(),
                extractor.n_mfcc()
            ),
        });
    }
    if network.input_width() != scaler.dimensions() {
        return Err(ArtifactError::Inconsistent {
            reason: format!(
                "model input width {} does not match scaler width {}",
                network.input_width(),
                scaler.dimensions()
            ),
        });
    }
    if network.output_width() != labels.len() {
        return Err(ArtifactError::Inconsistent {
            reason: format!(
                "model has {} outputs but the label table has {} labels",
                network.output_width(),
                labels.len()
            ),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::testing::artifacts::{identity_scaler, random_model, write_artifacts};
    use crate::testing::signals::{encode_wav_i16, white_noise, VoiceSpec};
    use std::sync::Arc;

    const LABELS: [&str; 7] = ["angry", "disgust", "fear", "happy", "neutral", "ps", "sad"];

    fn labels() -> LabelTable {
        LabelTable::new(LABELS.iter().map(|s| s.to_string()).collect()).unwrap()
    }

    fn context() -> AppContext {
        AppContext::from_parts(
            AppConfig::default(),
            FeatureScaler::new(identity_scaler(40)).unwrap(),
            Network::from_spec(random_model(40, 32, 7, 99)).unwrap(),
            labels(),
        )
        .unwrap()
    }

    fn clip(seconds: f32) -> Vec<u8> {
        let len = (22_050.0 * seconds) as usize;
        encode_wav_i16(&VoiceSpec::angry().render(22_050, len), 22_050)
    }

    #[test]
    fn test_context_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<AppContext>();
    }

    #[test]
    fn test_prediction_fields() {
        let prediction = context().predict_bytes(&clip(4.0), Some("wav")).unwrap();

        assert!(LABELS.contains(&prediction.label.as_str()));
        assert_eq!(prediction.label, LABELS[prediction.class_index]);
        assert!(prediction.confidence > 0.0 && prediction.confidence <= 100.0);
        assert_eq!(prediction.probabilities.len(), 7);
        let total: f32 = prediction.probabilities.iter().map(|p| p.probability).sum();
        assert!((total - 1.0).abs() < 1e-5);
        assert_eq!(prediction.waveform.len(), 22_050 * 3);
    }

    #[test]
    fn test_pipeline_is_idempotent() {
        let context = context();
        let bytes = clip(4.0);
        let first = context.predict_bytes(&bytes, Some("wav")).unwrap();
        let second = context.predict_bytes(&bytes, Some("wav")).unwrap();

        assert_eq!(first.label, second.label);
        assert_eq!(first.confidence.to_bits(), second.confidence.to_bits());
        assert_eq!(first, second);
    }

    #[test]
    fn test_concurrent_predictions_agree() {
        let context = Arc::new(context());
        let bytes = Arc::new(encode_wav_i16(&white_noise(3, 0.4, 22_050 * 4), 22_050));
        let expected = context.predict_bytes(&bytes, None).unwrap();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let context = Arc::clone(&context);
                let bytes = Arc::clone(&bytes);
                std::thread::spawn(move || context.predict_bytes(&bytes, None).unwrap())
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    }

    #[test]
    fn test_input_errors_are_typed() {
        let context = context();

        let err = context.predict_bytes(b"", None).unwrap_err();
        assert!(matches!(err, PipelineError::Decode { .. }));
        assert_eq!(err.kind(), ErrorKind::Input);

        let err = context.predict_bytes(b"RIFF nonsense", None).unwrap_err();
        assert!(matches!(err, PipelineError::Decode { .. }));

        let err = context.predict_bytes(&clip(0.1), Some("wav")).unwrap_err();
        assert!(matches!(err, PipelineError::EmptyAudio { .. }));

        // 0.52 s: 441 samples after the offset, under half an FFT window
        let err = context.predict_bytes(&clip(0.52), Some("wav")).unwrap_err();
        assert!(matches!(err, PipelineError::InsufficientSamples { .. }));
    }

    #[test]
    fn test_skewed_artifacts_are_rejected() {
        let err = AppContext::from_parts(
            AppConfig::default(),
            FeatureScaler::new(identity_scaler(40)).unwrap(),
            Network::from_spec(random_model(40, 8, 5, 1)).unwrap(),
            labels(),
        )
        .err()
        .expect("label count mismatch must fail");
        assert!(matches!(err, ArtifactError::Inconsistent { .. }));

        let err = AppContext::from_parts(
            AppConfig::default(),
            FeatureScaler::new(identity_scaler(13)).unwrap(),
            Network::from_spec(random_model(13, 8, 7, 1)).unwrap(),
            labels(),
        )
        .err()
        .expect("scaler width mismatch must fail");
        assert!(matches!(err, ArtifactError::Inconsistent { .. }));
    }

    #[test]
    fn test_load_from_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig::default();
        config.artifacts =
            write_artifacts(dir.path(), &random_model(40, 16, 7, 5), &identity_scaler(40), &LABELS)
                .unwrap();

        let context = AppContext::load(config.clone()).unwrap();
        assert_eq!(context.labels().len(), 7);
        assert_eq!(context.network().input_width(), 40);

        std::fs::remove_file(&config.artifacts.scaler).unwrap();
        assert!(matches!(
            AppContext::load(config),
            Err(ArtifactError::Io { .. })
        ));
    }
}
