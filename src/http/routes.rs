use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};

use crate::analysis::ClassProbability;
use crate::audio::Peak;
use crate::context::AppContext;
use crate::error::{log_pipeline_error, ErrorCode, ErrorKind, PipelineError};

const DEFAULT_PEAKS: usize = 200;

/// Shared application state for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub context: Arc<AppContext>,
}

impl HttpState {
    pub fn new(context: Arc<AppContext>) -> Self {
        Self { context }
    }
}

/// Query parameters accepted by `POST /predict`.
#[derive(Debug, Default, Deserialize)]
pub struct PredictQuery {
    /// Container hint such as `wav` or `mp3`
    pub format: Option<String>,
    /// Number of waveform envelope buckets to return
    pub peaks: Option<usize>,
}

/// HTTP error variants mapped to JSON responses.
#[derive(Debug)]
pub enum HttpServerError {
    BadRequest(&'static str),
    Pipeline(PipelineError),
    Internal(String),
}

impl IntoResponse for HttpServerError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Self::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                serde_json::json!({ "error": msg }),
            ),
            Self::Pipeline(err) => {
                let status = match err.kind() {
                    ErrorKind::Input => StatusCode::UNPROCESSABLE_ENTITY,
                    ErrorKind::ArtifactMismatch => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (
                    status,
                    serde_json::json!({
                        "error": err.message(),
                        "code": err.code(),
                        "kind": err.kind(),
                    }),
                )
            }
            Self::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                serde_json::json!({ "error": msg }),
            ),
        };

        (status, Json(body)).into_response()
    }
}

/// Health endpoint response payload.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub classes: usize,
    pub labels: Vec<String>,
}

/// Prediction endpoint response payload.
#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub label: String,
    pub confidence: f32,
    pub class_index: usize,
    pub probabilities: Vec<ClassProbability>,
    pub sample_rate: u32,
    pub duration_secs: f32,
    pub peaks: Vec<Peak>,
}

/// Build the Axum router with all handlers.
pub fn build_router(state: HttpState) -> Router {
    let body_limit = state.context.config().server.max_body_bytes;
    Router::new()
        .route("/health", get(health))
        .route("/predict", post(predict))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

/// Run the HTTP server loop.
pub async fn run_http_server(state: HttpState, addr: SocketAddr) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding prediction listener on {}", addr))?;
    log::info!("[Http] Serving predictions on {}", addr);
    let router = build_router(state);
    axum::serve(listener, router)
        .await
        .context("serving prediction router")?;
    Ok(())
}

pub async fn health(State(state): State<HttpState>) -> Json<HealthResponse> {
    let labels = state.context.labels().labels().to_vec();
    Json(HealthResponse {
        status: "ok",
        classes: labels.len(),
        labels,
    })
}

pub async fn predict(
    State(state): State<HttpState>,
    Query(query): Query<PredictQuery>,
    body: Bytes,
) -> Result<Json<PredictResponse>, HttpServerError> {
    if body.is_empty() {
        return Err(HttpServerError::BadRequest("request body must contain audio"));
    }

    let body_len = body.len();
    let context = Arc::clone(&state.context);
    let format = query.format.clone();

    // Decoding and inference block; keep them off the async workers.
    let prediction = tokio::task::spawn_blocking(move || {
        context.predict_bytes(&body, format.as_deref())
    })
    .await
    .map_err(|err| HttpServerError::Internal(format!("prediction task failed: {}", err)))?
    .map_err(|err| {
        log_pipeline_error(&err, "POST /predict");
        HttpServerError::Pipeline(err)
    })?;

    tracing::debug!(
        "[Http] POST /predict: {} bytes -> {} ({:.1}%)",
        body_len,
        prediction.label,
        prediction.confidence
    );

    let peaks = prediction
        .waveform
        .peaks(query.peaks.unwrap_or(DEFAULT_PEAKS));

    Ok(Json(PredictResponse {
        sample_rate: prediction.waveform.sample_rate,
        duration_secs: prediction.waveform.duration_secs(),
        label: prediction.label,
        confidence: prediction.confidence,
        class_index: prediction.class_index,
        probabilities: prediction.probabilities,
        peaks,
    }))
}
