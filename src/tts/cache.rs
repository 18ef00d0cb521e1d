use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use once_cell::sync::OnceCell;

use super::engine::{EngineLoader, SynthesisEngine};
use super::language::LanguageFamily;
use crate::error::AppError;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey {
    base_language: String,
    device: String,
}

impl CacheKey {
    pub fn new(language: &str, device: &str) -> Self {
        Self {
            base_language: LanguageFamily::classify(language).base_language().to_string(),
            device: device.to_string(),
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.base_language, self.device)
    }
}

type Attempt = Arc<OnceCell<Result<Arc<dyn SynthesisEngine>, AppError>>>;

/// Engines keyed by (base language, device), built lazily and kept for the
/// life of the cache.
///
/// Each key maps to one construction attempt. Concurrent callers for the same
/// key wait on that attempt and all see its outcome; callers for other keys
/// never touch it. A failed attempt is dropped from the map, so the next
/// request starts a fresh one and unknown keys leave nothing behind.
pub struct EngineCache {
    loader: Box<dyn EngineLoader>,
    attempts: RwLock<HashMap<CacheKey, Attempt>>,
}

impl EngineCache {
    pub fn new(loader: impl EngineLoader + 'static) -> Self {
        Self {
            loader: Box::new(loader),
            attempts: RwLock::new(HashMap::new()),
        }
    }

    pub fn get_or_load(&self, language: &str, device: &str) -> Result<Arc<dyn SynthesisEngine>, AppError> {
        let key = CacheKey::new(language, device);
        let attempt = self.attempt(&key);

        match attempt.get_or_init(|| self.construct(&key)) {
            Ok(engine) => Ok(Arc::clone(engine)),
            Err(e) => {
                self.forget(&key, &attempt);
                Err(e.replicate())
            }
        }
    }

    /// Keys with a fully constructed engine, sorted.
    pub fn loaded_keys(&self) -> Vec<String> {
        let attempts = self.attempts.read().unwrap_or_else(PoisonError::into_inner);
        let mut keys: Vec<&CacheKey> = attempts
            .iter()
            .filter(|(_, attempt)| matches!(attempt.get(), Some(Ok(_))))
            .map(|(key, _)| key)
            .collect();
        keys.sort();
        keys.into_iter().map(ToString::to_string).collect()
    }

    fn attempt(&self, key: &CacheKey) -> Attempt {
        {
            let attempts = self.attempts.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(attempt) = attempts.get(key) {
                return Arc::clone(attempt);
            }
        }

        let mut attempts = self.attempts.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(attempts.entry(key.clone()).or_default())
    }

    /// Drop a failed attempt, unless a newer one already replaced it.
    fn forget(&self, key: &CacheKey, failed: &Attempt) {
        let mut attempts = self.attempts.write().unwrap_or_else(PoisonError::into_inner);
        if attempts.get(key).is_some_and(|current| Arc::ptr_eq(current, failed)) {
            attempts.remove(key);
        }
    }

    #[cfg(test)]
    fn tracked_keys(&self) -> usize {
        self.attempts.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    fn construct(&self, key: &CacheKey) -> Result<Arc<dyn SynthesisEngine>, AppError> {
        tracing::info!(
            "Loading TTS model for base language: {}, device: {}",
            key.base_language,
            key.device
        );

        let engine = self
            .loader
            .load(&key.base_language, &key.device)
            .inspect_err(|e| tracing::error!("Failed to load model {}: {}", key, e))?;

        tracing::info!("Successfully loaded model: {}", key);

        match engine.speakers() {
            Some(speakers) => {
                let names: Vec<&str> = speakers.keys().map(String::as_str).collect();
                tracing::info!("Available speakers for {}: {:?}", key, names);
            }
            None => tracing::warn!("Model {} does not expose a speaker registry", key),
        }

        Ok(engine)
    }
}
