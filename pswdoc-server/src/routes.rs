use axum::body::Bytes;
use axum::extract::rejection::{BytesRejection, JsonRejection, QueryRejection};
use axum::extract::{DefaultBodyLimit, Query, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, Method, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use pswdoc_core::report::ReportRequest;
use pswdoc_core::speech::speech_text;
use pswdoc_engine::outcome::ReportOutcome;
use pswdoc_engine::traits::{AudioClip, SpeechRequest};
use pswdoc_runtime::history::HistoryEntry;
use pswdoc_runtime::services::Services;
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};

use crate::error::ApiError;

pub const MAX_BODY_BYTES: usize = 25 * 1024 * 1024;

#[derive(Clone)]
struct AppState {
    services: Services,
}

pub fn build_router(services: Services) -> Router {
    let state = AppState { services };

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any)
        .allow_origin(Any);

    Router::new()
        .route("/api/health", get(health))
        .route("/api/models", get(models))
        .route("/api/generate-ai-report", post(generate_report))
        .route("/api/reports", get(reports))
        .route("/api/transcribe", post(transcribe))
        .route("/api/text-to-speech", post(text_to_speech))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(cors)
        .with_state(state)
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Health {
    pub status: String,
    pub version: String,
}

async fn health() -> Json<Health> {
    Json(Health {
        status: "ok".into(),
        version: env!("CARGO_PKG_VERSION").into(),
    })
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ModelList {
    pub configured: String,
    pub installed: Vec<String>,
}

async fn models(State(state): State<AppState>) -> Result<Json<ModelList>, ApiError> {
    let installed = state
        .services
        .ollama
        .list_models()
        .await
        .map_err(|e| ApiError::upstream("Ollama", e))?;

    Ok(Json(ModelList {
        configured: state.services.config.ollama.model.clone(),
        installed,
    }))
}

async fn generate_report(
    State(state): State<AppState>,
    payload: Result<Json<ReportRequest>, JsonRejection>,
) -> Result<Json<ReportOutcome>, ApiError> {
    let Json(request) = payload?;
    log::info!(
        "Generating DAR report ({} tasks, transcript={})",
        request.non_blank_tasks().len(),
        request.transcript.is_some()
    );

    let outcome = state
        .services
        .generator
        .generate_with_hook(&request, |stage| async move {
            log::debug!("report stage: {}", stage.label());
        })
        .await?;

    if let Some(history) = state.services.history.clone() {
        let entry = HistoryEntry::record(&request, &outcome);
        let saved = tokio::task::spawn_blocking(move || history.append(entry))
            .await
            .map_err(anyhow::Error::from)
            .and_then(|r| r);
        // The note is still returned; a history failure must not lose it.
        if let Err(e) = saved {
            log::warn!("failed to record report history: {e:#}");
        }
    }

    Ok(Json(outcome))
}

#[derive(Debug, Deserialize)]
struct ReportsParams {
    limit: Option<usize>,
}

async fn reports(
    State(state): State<AppState>,
    params: Result<Query<ReportsParams>, QueryRejection>,
) -> Result<Json<Vec<HistoryEntry>>, ApiError> {
    let Query(params) = params?;
    let Some(history) = state.services.history.clone() else {
        return Ok(Json(vec![]));
    };

    let limit = params.limit.unwrap_or(usize::MAX);
    let entries = tokio::task::spawn_blocking(move || history.recent(limit))
        .await
        .map_err(anyhow::Error::from)
        .and_then(|r| r)
        .map_err(|e| ApiError::Internal(format!("{e:#}")))?;
    Ok(Json(entries))
}

#[derive(Debug, Deserialize)]
struct TranscribeParams {
    language: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TranscribeResponse {
    pub text: String,
}

async fn transcribe(
    State(state): State<AppState>,
    params: Result<Query<TranscribeParams>, QueryRejection>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<TranscribeResponse>, ApiError> {
    let Query(params) = params?;
    let body = body?;
    if body.is_empty() {
        return Err(ApiError::BadRequest("audio body is empty".into()));
    }

    let mime_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("application/octet-stream")
        .to_string();
    log::info!("Transcribing {} bytes of {}", body.len(), mime_type);

    let clip = AudioClip {
        mime_type,
        bytes: body.to_vec(),
    };
    let transcript = state
        .services
        .stt
        .transcribe(&clip, params.language.as_deref())
        .await
        .map_err(|e| ApiError::upstream("Whisper", e))?;

    Ok(Json(TranscribeResponse {
        text: transcript.text,
    }))
}

async fn text_to_speech(
    State(state): State<AppState>,
    payload: Result<Json<SpeechRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(mut request) = payload?;
    request.text = speech_text(&request.text)?.to_string();

    let audio = state
        .services
        .tts
        .synthesize(&request)
        .await
        .map_err(|e| ApiError::upstream("XTTS", e))?;

    Ok((
        StatusCode::OK,
        [(CONTENT_TYPE, audio.content_type)],
        audio.bytes,
    ))
}
