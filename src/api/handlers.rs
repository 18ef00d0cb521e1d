use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;
use std::sync::Arc;

use super::AccentsResponse;
use crate::api::routes::AppState;
use crate::error::AppError;
use crate::handler::{self, HealthStatus, SpeechResponse};
use crate::tts::language::ACCENT_VOICES;

/// Body is read raw so that any payload, JSON or not, gets a structured error.
pub async fn run(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<SpeechResponse>, AppError> {
    let event: Value = serde_json::from_slice(&body)
        .map_err(|e| AppError::validation(format!("request body is not valid JSON: {}", e)))?;

    let response = tokio::task::spawn_blocking(move || handler::process(&state.tts, &event))
        .await
        .map_err(|e| AppError::TtsError(format!("synthesis task failed: {}", e)))??;

    tracing::info!("Successfully processed request");

    Ok(Json(response))
}

pub async fn health(State(state): State<Arc<AppState>>) -> Response {
    let status = tokio::task::spawn_blocking(move || handler::health_check(&state.tts))
        .await
        .unwrap_or_else(|e| HealthStatus::Unhealthy {
            error: format!("health check task failed: {}", e),
        });

    let code = if status.is_healthy() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (code, Json(status)).into_response()
}

pub async fn list_accents() -> Json<AccentsResponse> {
    Json(AccentsResponse {
        accents: ACCENT_VOICES,
    })
}
