//! Test doubles for the engine and loader.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use super::engine::{EngineLoader, RawAudio, SynthesisEngine, SynthesisRequest};
use crate::error::AppError;

pub const SAMPLE_RATE: u32 = 16_000;

/// Registry shaped like the multi-accent English model.
pub fn english_speakers() -> BTreeMap<String, i64> {
    [("EN-US", 0), ("EN-BR", 1), ("EN_INDIA", 2), ("EN-AU", 3), ("EN-Default", 4)]
        .into_iter()
        .map(|(name, id)| (name.to_string(), id))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Behavior {
    Succeed,
    Fail,
    Panic,
}

pub struct MockEngine {
    pub speakers: Option<BTreeMap<String, i64>>,
    pub behavior: Behavior,
}

impl MockEngine {
    pub fn english() -> Self {
        Self {
            speakers: Some(english_speakers()),
            behavior: Behavior::Succeed,
        }
    }
}

impl SynthesisEngine for MockEngine {
    fn speakers(&self) -> Option<&BTreeMap<String, i64>> {
        self.speakers.as_ref()
    }

    fn synthesize(&self, request: &SynthesisRequest<'_>) -> Result<RawAudio, AppError> {
        match self.behavior {
            Behavior::Succeed => {
                // 10ms of audio per character
                let count = request.text.chars().count() * (SAMPLE_RATE as usize / 100);
                let samples = (0..count)
                    .map(|i| (i as f32 * 0.05).sin() * 0.5)
                    .collect();
                Ok(RawAudio {
                    samples,
                    sample_rate: SAMPLE_RATE,
                })
            }
            Behavior::Fail => Err(AppError::TtsError("mock synthesis failure".into())),
            Behavior::Panic => panic!("mock engine exploded"),
        }
    }
}

/// Counts load attempts and successful constructions; can be told to fail
/// the first N loads or to dawdle.
pub struct MockLoader {
    pub attempts: Arc<AtomicUsize>,
    pub constructions: Arc<AtomicUsize>,
    pub failures_left: AtomicUsize,
    pub delay: Duration,
    pub speakers: Option<BTreeMap<String, i64>>,
    pub behavior: Behavior,
}

impl MockLoader {
    pub fn new() -> Self {
        Self {
            attempts: Arc::new(AtomicUsize::new(0)),
            constructions: Arc::new(AtomicUsize::new(0)),
            failures_left: AtomicUsize::new(0),
            delay: Duration::ZERO,
            speakers: Some(english_speakers()),
            behavior: Behavior::Succeed,
        }
    }

    pub fn failing(times: usize) -> Self {
        Self {
            failures_left: AtomicUsize::new(times),
            ..Self::new()
        }
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::new()
        }
    }

    pub fn with_behavior(behavior: Behavior) -> Self {
        Self {
            behavior,
            ..Self::new()
        }
    }

    pub fn without_registry() -> Self {
        Self {
            speakers: None,
            ..Self::new()
        }
    }

    pub fn counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.constructions)
    }

    pub fn attempts(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.attempts)
    }
}

impl EngineLoader for MockLoader {
    fn load(&self, base_language: &str, device: &str) -> Result<Arc<dyn SynthesisEngine>, AppError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }

        let should_fail = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if should_fail {
            return Err(AppError::ModelNotFound(format!("{base_language} on {device}")));
        }

        self.constructions.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(MockEngine {
            speakers: self.speakers.clone(),
            behavior: self.behavior,
        }))
    }
}
