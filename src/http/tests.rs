use super::*;
use crate::analysis::{FeatureScaler, LabelTable, Network};
use crate::config::AppConfig;
use crate::context::AppContext;
use crate::testing::artifacts::{identity_scaler, random_model};
use crate::testing::signals::{encode_wav_i16, sine_wave};
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::response::Response;
use axum::Router;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

fn make_router() -> Router {
    let context = AppContext::from_parts(
        AppConfig::default(),
        FeatureScaler::new(identity_scaler(40)).unwrap(),
        Network::from_spec(random_model(40, 16, 3, 4)).unwrap(),
        LabelTable::new(vec!["angry".into(), "calm".into(), "sad".into()]).unwrap(),
    )
    .expect("test context");
    build_router(HttpState::new(Arc::new(context)))
}

async fn response_json(response: Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes");
    let json = serde_json::from_slice::<Value>(&bytes).expect("JSON body");
    (status, json)
}

fn post_predict(uri: &str, body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::from(body))
        .expect("predict request")
}

#[tokio::test]
async fn health_lists_labels() {
    let (status, json) = response_json(
        make_router()
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .expect("health request"),
            )
            .await
            .expect("health call"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["classes"], 3);
    assert_eq!(json["labels"][0], "angry");
}

#[tokio::test]
async fn predict_returns_label_and_peaks() {
    let wav = encode_wav_i16(&sine_wave(22_050, 220.0, 0.6, 22_050 * 4), 22_050);
    let (status, json) = response_json(
        make_router()
            .oneshot(post_predict("/predict?format=wav&peaks=50", wav))
            .await
            .expect("predict call"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let label = json["label"].as_str().expect("label string");
    assert!(["angry", "calm", "sad"].contains(&label));
    let confidence = json["confidence"].as_f64().expect("confidence");
    assert!(confidence > 0.0 && confidence <= 100.0);
    assert_eq!(json["probabilities"].as_array().map(Vec::len), Some(3));
    assert_eq!(json["peaks"].as_array().map(Vec::len), Some(50));
    assert_eq!(json["sample_rate"], 22_050);
}

#[tokio::test]
async fn predict_rejects_empty_body() {
    let (status, json) = response_json(
        make_router()
            .oneshot(post_predict("/predict", Vec::new()))
            .await
            .expect("predict call"),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap_or_default().contains("audio"));
}

#[tokio::test]
async fn predict_maps_bad_audio_to_unprocessable() {
    let (status, json) = response_json(
        make_router()
            .oneshot(post_predict("/predict", b"definitely not audio".to_vec()))
            .await
            .expect("predict call"),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["code"], 1001);
    assert_eq!(json["kind"], "input");
}

#[tokio::test]
async fn predict_maps_short_clip_to_empty_audio() {
    let wav = encode_wav_i16(&sine_wave(22_050, 220.0, 0.6, 2_205), 22_050);
    let (status, json) = response_json(
        make_router()
            .oneshot(post_predict("/predict", wav))
            .await
            .expect("predict call"),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["code"], 1002);
}
