use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::AppError;

/// Parameters for a single synthesis call, after voice resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisRequest<'a> {
    pub text: &'a str,
    pub speaker: i64,
    pub speed: f32,
    pub sdp_ratio: f32,
    pub noise_scale: f32,
    pub noise_scale_w: f32,
}

/// Mono samples in [-1.0, 1.0].
#[derive(Debug, Clone, PartialEq)]
pub struct RawAudio {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

/// A loaded model bound to one base language and one device.
pub trait SynthesisEngine: Send + Sync {
    /// Voice name -> speaker index, if the engine can enumerate its voices.
    fn speakers(&self) -> Option<&BTreeMap<String, i64>>;

    fn synthesize(&self, request: &SynthesisRequest<'_>) -> Result<RawAudio, AppError>;
}

/// Builds engines on a cache miss.
pub trait EngineLoader: Send + Sync {
    fn load(&self, base_language: &str, device: &str) -> Result<Arc<dyn SynthesisEngine>, AppError>;
}
