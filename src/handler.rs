//! Entry points invoked once per event: `handle` for synthesis and
//! `health_check` for the startup/readiness probe.

use std::panic::{self, AssertUnwindSafe};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AppError, ErrorResponse};
use crate::request::{validate_input, DEFAULT_DEVICE, DEFAULT_LANGUAGE};
use crate::tts::TtsService;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeechResponse {
    pub audio: String,
    pub sample_rate: u32,
    pub format: String,
    pub duration: f64,
    pub text: String,
    pub speaker_id: i64,
    pub language: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HandlerOutput {
    Success(SpeechResponse),
    Error(ErrorResponse),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy { models_loaded: Vec<String> },
    Unhealthy { error: String },
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        matches!(self, Self::Healthy { .. })
    }
}

/// Validate, synthesize and encode one event.
pub fn process(tts: &TtsService, event: &Value) -> Result<SpeechResponse, AppError> {
    tracing::debug!("Received event: {}", event);

    let params = validate_input(event)?;
    tracing::info!("Validated parameters: {:?}", params);

    // A panic inside the engine must not take the worker down with it.
    let speech = panic::catch_unwind(AssertUnwindSafe(|| tts.speak(&params)))
        .map_err(|payload| AppError::TtsError(panic_message(payload.as_ref())))??;
    tracing::debug!("Resolved voice: {:?}", speech.voice);

    Ok(SpeechResponse {
        audio: speech.clip.to_base64(),
        sample_rate: speech.clip.sample_rate,
        format: "wav".to_string(),
        duration: speech.clip.duration(),
        text: params.text,
        speaker_id: params.speaker_id,
        language: params.language,
    })
}

/// Never fails: every error becomes an `{ "error": ... }` payload.
pub fn handle(tts: &TtsService, event: &Value) -> HandlerOutput {
    match process(tts, event) {
        Ok(response) => {
            tracing::info!("Successfully processed request");
            HandlerOutput::Success(response)
        }
        Err(e) => {
            let response = e.to_response();
            tracing::error!("{}", response.error);
            HandlerOutput::Error(response)
        }
    }
}

/// Load the default English engine and report what is cached.
pub fn health_check(tts: &TtsService) -> HealthStatus {
    match tts.engine(DEFAULT_LANGUAGE, DEFAULT_DEVICE) {
        Ok(_) => HealthStatus::Healthy {
            models_loaded: tts.engines().loaded_keys(),
        },
        Err(e) => HealthStatus::Unhealthy {
            error: e.to_string(),
        },
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    let detail = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown cause".to_string());
    format!("engine panicked: {detail}")
}
