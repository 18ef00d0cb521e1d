use axum::{
    http::{header, Method},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers;
use crate::tts::TtsService;

pub struct AppState {
    pub tts: TtsService,
}

pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/run", post(handlers::run))
        .route("/runsync", post(handlers::run))
        .route("/health", get(handlers::health))
        .route("/accents", get(handlers::list_accents))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
