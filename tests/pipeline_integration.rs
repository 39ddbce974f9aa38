// Pipeline Integration Tests
//
// Drive the public API the way a host does: artifacts on disk, a config that
// points at them, and clips written as real files.

use std::path::Path;

use emotion_classifier::audio::Waveform;
use emotion_classifier::config::AppConfig;
use emotion_classifier::testing::artifacts::{
    fit_two_class, identity_scaler, random_model, write_artifacts,
};
use emotion_classifier::testing::signals::{sine_wave, write_wav_i16, VoiceSpec};
use emotion_classifier::{AppContext, ArtifactError, ErrorKind, PipelineError};

const LABELS: [&str; 7] = ["angry", "disgust", "fear", "happy", "neutral", "ps", "sad"];

fn context_in(dir: &Path) -> AppContext {
    let mut config = AppConfig::default();
    config.artifacts = write_artifacts(
        dir,
        &random_model(40, 32, LABELS.len(), 99),
        &identity_scaler(40),
        &LABELS,
    )
    .expect("write artifacts");
    AppContext::load(config).expect("load context")
}

#[test]
fn predicts_from_file_at_native_rate() {
    let dir = tempfile::tempdir().unwrap();
    let context = context_in(dir.path());
    let clip = dir.path().join("clip.wav");
    write_wav_i16(&clip, &sine_wave(22_050, 180.0, 0.5, 22_050 * 4), 22_050).unwrap();

    let prediction = context.predict_path(&clip).expect("prediction");

    assert!(LABELS.contains(&prediction.label.as_str()));
    assert_eq!(prediction.probabilities.len(), LABELS.len());
    let total: f32 = prediction.probabilities.iter().map(|p| p.probability).sum();
    assert!((total - 1.0).abs() < 1e-4, "sum {}", total);
    assert!(prediction.confidence > 0.0 && prediction.confidence <= 100.0);

    // 3 s window at 22.05 kHz
    assert_eq!(prediction.waveform.len(), 66_150);
    assert_eq!(prediction.waveform.sample_rate, 22_050);
}

#[test]
fn resamples_other_rates_to_the_target() {
    let dir = tempfile::tempdir().unwrap();
    let context = context_in(dir.path());
    let clip = dir.path().join("clip_44k.wav");
    write_wav_i16(&clip, &sine_wave(44_100, 180.0, 0.5, 44_100 * 4), 44_100).unwrap();

    let waveform = context.load_waveform(&clip).expect("waveform");
    assert_eq!(waveform.sample_rate, 22_050);
    assert_eq!(waveform.len(), 66_150);

    let features = context.extract_features(&waveform).expect("features");
    assert_eq!(features.len(), 40);
    assert!(features.as_slice().iter().all(|c| c.is_finite()));
}

#[test]
fn short_source_gives_a_shorter_window() {
    let dir = tempfile::tempdir().unwrap();
    let context = context_in(dir.path());
    let clip = dir.path().join("short.wav");
    write_wav_i16(&clip, &sine_wave(22_050, 180.0, 0.5, 22_050 * 2), 22_050).unwrap();

    let prediction = context.predict_path(&clip).expect("prediction");
    // 2 s source minus the 0.5 s offset
    assert_eq!(prediction.waveform.len(), 33_075);
}

#[test]
fn waveform_round_trips_through_wav_export() {
    let dir = tempfile::tempdir().unwrap();
    let context = context_in(dir.path());
    let clip = dir.path().join("clip.wav");
    write_wav_i16(&clip, &sine_wave(22_050, 300.0, 0.4, 22_050 * 4), 22_050).unwrap();

    let first = context.predict_path(&clip).unwrap();
    let exported = dir.path().join("window.wav");
    first.waveform.write_wav(&exported).unwrap();

    // The exported window has no offset of its own, so reading it back with
    // a zero offset reproduces the same audio (up to 16-bit quantisation).
    let mut config = context.config().clone();
    config.audio.offset_secs = 0.0;
    let reloaded: Waveform = emotion_classifier::audio::AudioLoader::new(&config.audio)
        .load_path(&exported)
        .unwrap();
    assert_eq!(reloaded.len(), first.waveform.len());
    let max_diff = reloaded
        .samples
        .iter()
        .zip(&first.waveform.samples)
        .map(|(a, b)| (a - b).abs())
        .fold(0.0f32, f32::max);
    assert!(max_diff < 1e-3, "max diff {}", max_diff);
}

#[test]
fn fitted_model_separates_angry_from_calm_files() {
    let dir = tempfile::tempdir().unwrap();
    let context = context_in(dir.path());

    let angry_path = dir.path().join("angry.wav");
    let calm_path = dir.path().join("calm.wav");
    write_wav_i16(&angry_path, &VoiceSpec::angry().render(22_050, 22_050 * 4), 22_050).unwrap();
    write_wav_i16(&calm_path, &VoiceSpec::calm().render(22_050, 22_050 * 4), 22_050).unwrap();

    let angry = context.extract_features(&context.load_waveform(&angry_path).unwrap()).unwrap();
    let calm = context.extract_features(&context.load_waveform(&calm_path).unwrap()).unwrap();
    let (model, scaler) = fit_two_class(&angry, &calm);

    let fitted_dir = dir.path().join("fitted");
    std::fs::create_dir(&fitted_dir).unwrap();
    let mut config = AppConfig::default();
    config.artifacts = write_artifacts(&fitted_dir, &model, &scaler, &["angry", "calm"]).unwrap();
    let fitted = AppContext::load(config).unwrap();

    let take = dir.path().join("angry_take.wav");
    let voice = VoiceSpec {
        seed: 4242,
        ..VoiceSpec::angry()
    };
    write_wav_i16(&take, &voice.render(22_050, (22_050.0 * 3.5) as usize), 22_050).unwrap();

    let prediction = fitted.predict_path(&take).unwrap();
    assert_eq!(prediction.label, "angry");
    assert!(prediction.confidence > 50.0);
}

#[test]
fn missing_and_unreadable_inputs_are_input_errors() {
    let dir = tempfile::tempdir().unwrap();
    let context = context_in(dir.path());

    let err = context
        .predict_path(&dir.path().join("does_not_exist.wav"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Input);

    let junk = dir.path().join("junk.wav");
    std::fs::write(&junk, b"this is not a wav file").unwrap();
    let err = context.predict_path(&junk).unwrap_err();
    assert!(matches!(err, PipelineError::Decode { .. }));
}

#[test]
fn mismatched_label_file_fails_at_startup() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = AppConfig::default();
    config.artifacts = write_artifacts(
        dir.path(),
        &random_model(40, 16, 7, 3),
        &identity_scaler(40),
        &["angry", "calm"],
    )
    .unwrap();

    assert!(matches!(
        AppContext::load(config),
        Err(ArtifactError::Inconsistent { .. })
    ));
}
