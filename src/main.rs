use std::process::ExitCode;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

mod api;
mod config;
mod error;
mod handler;
mod request;
mod tts;

use api::routes::{create_router, AppState};
use config::Config;
use error::AppError;
use tts::{PiperLoader, TtsService};

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), AppError> {
    let config = Config::from_env()?;

    tracing::info!("MeloTTS worker v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Models directory: {}", config.models_dir.display());
    tracing::info!("Staging directory: {}", config.staging_dir.display());

    let loader = PiperLoader::new(config.models_dir.clone(), config.espeak_bin.clone());
    let state = Arc::new(AppState {
        tts: TtsService::new(loader, config.staging_dir.clone()),
    });

    // `--test_input '<event json>'` handles a single event and exits
    if let Some(event) = test_input(std::env::args().skip(1))? {
        let output = {
            let state = Arc::clone(&state);
            tokio::task::spawn_blocking(move || handler::handle(&state.tts, &event))
                .await
                .map_err(|e| AppError::TtsError(format!("handler task failed: {}", e)))?
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    if config.skip_health_check {
        tracing::warn!("Skipping startup health check");
    } else {
        let health = {
            let state = Arc::clone(&state);
            tokio::task::spawn_blocking(move || handler::health_check(&state.tts))
                .await
                .map_err(|e| AppError::TtsError(format!("health check task failed: {}", e)))?
        };
        tracing::info!("Health check: {}", serde_json::to_string(&health)?);

        if !health.is_healthy() {
            return Err(AppError::TtsError("Failed health check, exiting".to_string()));
        }
    }

    let addr = config.addr()?;
    tracing::info!("Starting server on http://{}", addr);

    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn test_input(mut args: impl Iterator<Item = String>) -> Result<Option<serde_json::Value>, AppError> {
    while let Some(arg) = args.next() {
        let raw = match arg.strip_prefix("--test_input") {
            Some("") => args
                .next()
                .ok_or_else(|| AppError::Config("--test_input needs a JSON argument".to_string()))?,
            Some(rest) if rest.starts_with('=') => rest[1..].to_string(),
            _ => continue,
        };
        return Ok(Some(serde_json::from_str(&raw)?));
    }
    Ok(None)
}
