use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Unsupported device: {0}")]
    UnsupportedDevice(String),

    #[error("TTS generation failed: {0}")]
    TtsError(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("WAV error: {0}")]
    WavError(#[from] hound::Error),
}

/// Error payload returned to the caller: `{ "error": "..." }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    pub fn to_response(&self) -> ErrorResponse {
        let error = match self {
            Self::Validation(msg) => format!("Validation error: {msg}"),
            other => format!("Internal error: {other}"),
        };
        ErrorResponse { error }
    }

    /// An equivalent error for each caller that shared one failed operation.
    pub fn replicate(&self) -> Self {
        match self {
            Self::Validation(msg) => Self::Validation(msg.clone()),
            Self::ModelNotFound(msg) => Self::ModelNotFound(msg.clone()),
            Self::UnsupportedDevice(msg) => Self::UnsupportedDevice(msg.clone()),
            Self::TtsError(msg) => Self::TtsError(msg.clone()),
            Self::Config(msg) => Self::Config(msg.clone()),
            Self::IoError(e) => Self::IoError(std::io::Error::new(e.kind(), e.to_string())),
            Self::JsonError(e) => Self::JsonError(<serde_json::Error as serde::de::Error>::custom(e)),
            Self::WavError(e) => Self::IoError(std::io::Error::other(format!("WAV error: {e}"))),
        }
    }

    fn status(&self) -> StatusCode {
        if self.is_validation() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = self.to_response();

        tracing::error!("Request failed: {} - {}", status.as_u16(), body.error);

        (status, Json(body)).into_response()
    }
}
