// The prediction path leaves logging to its hosts: running a prediction on a
// shared context must not emit a single record.
//
// Kept in its own test binary because it installs the global logger.

use std::sync::Mutex;

use emotion_classifier::analysis::{FeatureScaler, LabelTable, Network};
use emotion_classifier::config::AppConfig;
use emotion_classifier::testing::artifacts::{identity_scaler, random_model};
use emotion_classifier::testing::signals::{encode_wav_i16, VoiceSpec};
use emotion_classifier::AppContext;
use log::{LevelFilter, Log, Metadata, Record};

struct Recorder {
    records: Mutex<Vec<String>>,
}

impl Log for Recorder {
    fn enabled(&self, metadata: &Metadata) -> bool {
        // Decoder crates log on their own; only this crate's records count.
        metadata.target().starts_with("emotion_classifier")
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        if let Ok(mut records) = self.records.lock() {
            records.push(format!("{} {}: {}", record.level(), record.target(), record.args()));
        }
    }

    fn flush(&self) {}
}

static RECORDER: Recorder = Recorder {
    records: Mutex::new(Vec::new()),
};

#[test]
fn predictions_emit_no_log_records() {
    log::set_logger(&RECORDER).expect("install recorder");
    log::set_max_level(LevelFilter::Trace);

    let context = AppContext::from_parts(
        AppConfig::default(),
        FeatureScaler::new(identity_scaler(40)).unwrap(),
        Network::from_spec(random_model(40, 16, 3, 7)).unwrap(),
        LabelTable::new(vec!["angry".into(), "calm".into(), "sad".into()]).unwrap(),
    )
    .unwrap();
    RECORDER.records.lock().unwrap().clear();

    let wav = encode_wav_i16(&VoiceSpec::angry().render(22_050, 22_050 * 4), 22_050);
    context.predict_bytes(&wav, Some("wav")).unwrap();
    assert!(context.predict_bytes(b"", None).is_err());

    let records = RECORDER.records.lock().unwrap();
    assert!(records.is_empty(), "unexpected records: {:?}", *records);
}
