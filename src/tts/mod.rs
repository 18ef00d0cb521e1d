pub mod cache;
pub mod engine;
pub mod language;
pub mod model;
pub mod piper;
pub mod voice;
pub mod wav;

#[cfg(test)]
pub(crate) mod mock;

use std::path::PathBuf;
use std::sync::Arc;

use crate::error::AppError;
use crate::request::SynthesisParams;

pub use cache::EngineCache;
pub use engine::{EngineLoader, SynthesisEngine, SynthesisRequest};
pub use piper::PiperLoader;
pub use voice::VoiceSelection;
pub use wav::{EncodedClip, StagedAudio};

/// Result of one synthesis, ready to be put in a response.
#[derive(Debug, Clone)]
pub struct Speech {
    pub clip: EncodedClip,
    pub voice: VoiceSelection,
}

pub struct TtsService {
    engines: EngineCache,
    staging_dir: PathBuf,
}

impl TtsService {
    pub fn new(loader: impl EngineLoader + 'static, staging_dir: PathBuf) -> Self {
        Self {
            engines: EngineCache::new(loader),
            staging_dir,
        }
    }

    pub fn engines(&self) -> &EngineCache {
        &self.engines
    }

    pub fn engine(&self, language: &str, device: &str) -> Result<Arc<dyn SynthesisEngine>, AppError> {
        self.engines.get_or_load(language, device)
    }

    pub fn speak(&self, params: &SynthesisParams) -> Result<Speech, AppError> {
        // 1. Get or load engine
        let engine = self.engine(&params.language, &params.device)?;

        // 2. Pick the accent's speaker
        let voice = voice::resolve(&*engine, &params.language, params.speaker_id);

        tracing::info!(
            "Generating speech for text: {}...",
            params.text.chars().take(50).collect::<String>()
        );
        tracing::info!(
            "Using accent: {}, voice: {}, speaker_id: {}",
            params.language,
            voice.voice().unwrap_or("default"),
            voice.speaker()
        );

        // 3. Synthesize
        let audio = engine.synthesize(&SynthesisRequest {
            text: &params.text,
            speaker: voice.speaker(),
            speed: params.speed,
            sdp_ratio: params.sdp_ratio,
            noise_scale: params.noise_scale,
            noise_scale_w: params.noise_scale_w,
        })?;

        // 4. Stage as WAV and read back; the staging file goes away on every path
        let staged = StagedAudio::write(&self.staging_dir, &audio)?;
        let clip = staged.read()?;

        tracing::info!(
            "Successfully generated {} audio samples at {}Hz",
            clip.sample_count,
            clip.sample_rate
        );

        Ok(Speech { clip, voice })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::mock::{Behavior, MockLoader, SAMPLE_RATE};
    use super::*;
    use crate::request::validate_input;
    use serde_json::json;

    fn params(input: serde_json::Value) -> SynthesisParams {
        validate_input(&json!({ "input": input })).unwrap()
    }

    fn staging_is_empty(dir: &std::path::Path) -> bool {
        std::fs::read_dir(dir).unwrap().next().is_none()
    }

    #[test]
    fn test_speak_produces_clip_and_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let service = TtsService::new(MockLoader::new(), dir.path().to_path_buf());

        let speech = service.speak(&params(json!({ "text": "Hello" }))).unwrap();

        // 10ms per character in the mock
        assert_eq!(speech.clip.sample_count, 5 * SAMPLE_RATE / 100);
        assert_eq!(speech.clip.sample_rate, SAMPLE_RATE);
        assert!((speech.clip.duration() - 0.05).abs() < 1e-9);
        assert!(speech.clip.bytes.starts_with(b"RIFF"));
        assert!(staging_is_empty(dir.path()));
    }

    #[test]
    fn test_speak_uses_accent_speaker() {
        let dir = tempfile::tempdir().unwrap();
        let service = TtsService::new(MockLoader::new(), dir.path().to_path_buf());

        let speech = service
            .speak(&params(json!({ "text": "Hi", "language": "EN-IN", "speaker_id": 9 })))
            .unwrap();
        assert_eq!(speech.voice.voice(), Some("EN_INDIA"));

        let speech = service
            .speak(&params(json!({ "text": "Hi", "language": "EN-ZZ", "speaker_id": 9 })))
            .unwrap();
        assert_eq!(speech.voice, VoiceSelection::Fallback { speaker: 9 });
    }

    #[test]
    fn test_accents_reuse_one_engine() {
        let dir = tempfile::tempdir().unwrap();
        let loader = MockLoader::new();
        let constructions = loader.counter();
        let service = TtsService::new(loader, dir.path().to_path_buf());

        for language in ["EN-US", "EN-BR", "EN-AU", "EN"] {
            service
                .speak(&params(json!({ "text": "Hi", "language": language })))
                .unwrap();
        }

        assert_eq!(constructions.load(Ordering::SeqCst), 1);
        assert_eq!(service.engines().loaded_keys(), vec!["EN_auto"]);
    }

    #[test]
    fn test_synthesis_failure_propagates_and_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let service = TtsService::new(
            MockLoader::with_behavior(Behavior::Fail),
            dir.path().to_path_buf(),
        );

        let err = service.speak(&params(json!({ "text": "Hello" }))).unwrap_err();
        assert!(matches!(err, AppError::TtsError(_)));
        assert!(staging_is_empty(dir.path()));
    }

    #[test]
    fn test_load_failure_propagates() {
        let dir = tempfile::tempdir().unwrap();
        let service = TtsService::new(MockLoader::failing(1), dir.path().to_path_buf());

        let err = service.speak(&params(json!({ "text": "Hello" }))).unwrap_err();
        assert!(matches!(err, AppError::ModelNotFound(_)));
        assert!(service.engines().loaded_keys().is_empty());
    }

    #[test]
    fn test_staging_failure_propagates() {
        let service = TtsService::new(MockLoader::new(), PathBuf::from("/nonexistent/staging"));
        let err = service.speak(&params(json!({ "text": "Hello" }))).unwrap_err();
        assert!(matches!(err, AppError::IoError(_)));
    }
}
