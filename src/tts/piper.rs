use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::{Arc, Mutex};

use ort::execution_providers::CUDAExecutionProvider;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Value;

use super::engine::{EngineLoader, RawAudio, SynthesisEngine, SynthesisRequest};
use super::model::{ModelBundle, ModelConfig};
use crate::error::AppError;

/// Execution target parsed from the request's `device` hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Device {
    /// CUDA when the runtime can register it, CPU otherwise.
    Auto,
    Cpu,
    Cuda,
}

impl Device {
    pub fn parse(hint: &str) -> Result<Self, AppError> {
        match hint.to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "cpu" => Ok(Self::Cpu),
            "cuda" | "gpu" => Ok(Self::Cuda),
            _ => Err(AppError::UnsupportedDevice(hint.to_string())),
        }
    }
}

/// Loads VITS-style ONNX voices from a models directory.
pub struct PiperLoader {
    models_dir: PathBuf,
    espeak_bin: String,
}

impl PiperLoader {
    pub fn new(models_dir: PathBuf, espeak_bin: String) -> Self {
        Self {
            models_dir,
            espeak_bin,
        }
    }
}

impl EngineLoader for PiperLoader {
    fn load(&self, base_language: &str, device: &str) -> Result<Arc<dyn SynthesisEngine>, AppError> {
        let device = Device::parse(device)?;
        let bundle = ModelBundle::load(&self.models_dir, base_language)?;
        let engine = PiperEngine::new(bundle, device, self.espeak_bin.clone())?;
        Ok(Arc::new(engine))
    }
}

pub struct PiperEngine {
    session: Mutex<Session>,
    config: ModelConfig,
    speakers: Option<BTreeMap<String, i64>>,
    espeak_bin: String,
}

impl PiperEngine {
    pub fn new(bundle: ModelBundle, device: Device, espeak_bin: String) -> Result<Self, AppError> {
        let session = build_session(&bundle.model_path, device)?;

        let speakers = if bundle.config.speaker_id_map.is_empty() {
            None
        } else {
            Some(bundle.config.speaker_id_map.clone())
        };

        tracing::debug!(
            "Created {:?} session for {} ({} Hz, {} speakers)",
            device,
            bundle.base_language,
            bundle.config.audio.sample_rate,
            bundle.config.num_speakers
        );

        Ok(Self {
            session: Mutex::new(session),
            config: bundle.config,
            speakers,
            espeak_bin,
        })
    }

    fn infer(&self, phoneme_ids: &[i64], request: &SynthesisRequest<'_>) -> Result<Vec<f32>, AppError> {
        if phoneme_ids.is_empty() {
            return Ok(Vec::new());
        }

        let input_len = phoneme_ids.len();
        let length_scale = self.config.inference.clone().unwrap_or_default().length_scale;

        // input: [batch, sequence] = [1, phoneme_count]
        let input_value = Value::from_array((vec![1, input_len], phoneme_ids.to_vec()))
            .map_err(|e| AppError::TtsError(format!("Failed to create input tensor: {}", e)))?;

        let lengths_value = Value::from_array((vec![1], vec![input_len as i64]))
            .map_err(|e| AppError::TtsError(format!("Failed to create lengths tensor: {}", e)))?;

        // scales: [noise_scale, length_scale, noise_w]; faster speech means shorter phonemes
        let scales_value = Value::from_array((vec![3], vec![
            request.noise_scale,
            length_scale / request.speed,
            request.noise_scale_w,
        ]))
        .map_err(|e| AppError::TtsError(format!("Failed to create scales tensor: {}", e)))?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| AppError::TtsError("Inference session is poisoned".to_string()))?;

        let outputs = if self.config.is_multi_speaker() {
            let sid_value = Value::from_array((vec![1], vec![request.speaker]))
                .map_err(|e| AppError::TtsError(format!("Failed to create speaker tensor: {}", e)))?;
            session.run(ort::inputs![input_value, lengths_value, scales_value, sid_value])
        } else {
            session.run(ort::inputs![input_value, lengths_value, scales_value])
        }
        .map_err(|e| AppError::TtsError(format!("Inference failed: {}", e)))?;

        let output = outputs
            .get("output")
            .or_else(|| outputs.get("audio"))
            .ok_or_else(|| AppError::TtsError("Missing output tensor".to_string()))?;

        let output_view = output
            .try_extract_tensor::<f32>()
            .map_err(|e| AppError::TtsError(format!("Failed to extract output tensor: {}", e)))?;

        Ok(output_view.1.iter().copied().collect())
    }
}

impl SynthesisEngine for PiperEngine {
    fn speakers(&self) -> Option<&BTreeMap<String, i64>> {
        self.speakers.as_ref()
    }

    fn synthesize(&self, request: &SynthesisRequest<'_>) -> Result<RawAudio, AppError> {
        tracing::debug!(
            "sdp_ratio {} has no counterpart in this model and is ignored",
            request.sdp_ratio
        );

        let phonemes = phonemize(&self.espeak_bin, request.text, self.config.espeak_voice())?;
        let ids = phonemes_to_ids(&phonemes, &self.config.phoneme_id_map);
        let samples = self.infer(&ids, request)?;

        Ok(RawAudio {
            samples,
            sample_rate: self.config.audio.sample_rate,
        })
    }
}

fn build_session(model_path: &Path, device: Device) -> Result<Session, AppError> {
    let builder = Session::builder()
        .map_err(|e| AppError::TtsError(format!("Failed to create session builder: {}", e)))?
        .with_optimization_level(GraphOptimizationLevel::Level3)
        .map_err(|e| AppError::TtsError(format!("Failed to set optimization level: {}", e)))?
        .with_intra_threads(4)
        .map_err(|e| AppError::TtsError(format!("Failed to set threads: {}", e)))?;

    let builder = match device {
        Device::Cpu => builder,
        Device::Auto => builder
            .with_execution_providers([CUDAExecutionProvider::default().build()])
            .map_err(|e| AppError::TtsError(format!("Failed to register CUDA: {}", e)))?,
        Device::Cuda => builder
            .with_execution_providers([CUDAExecutionProvider::default().build().error_on_failure()])
            .map_err(|e| AppError::UnsupportedDevice(format!("cuda ({})", e)))?,
    };

    builder
        .commit_from_file(model_path)
        .map_err(|e| AppError::TtsError(format!("Failed to load model: {}", e)))
}

/// IPA transcription of `text` in the model's espeak voice.
pub fn phonemize(espeak_bin: &str, text: &str, voice: &str) -> Result<String, AppError> {
    if text.is_empty() {
        return Ok(String::new());
    }

    let output = Command::new(espeak_bin)
        .arg("--ipa")
        .arg("-q")
        .args(["-v", voice])
        .arg(text)
        .output()
        .map_err(|e| AppError::TtsError(format!("Could not start {espeak_bin}: {e}")))?;

    if !output.status.success() {
        return Err(AppError::TtsError(format!(
            "{espeak_bin} exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Map IPA output to model ids: BOS, each known symbol followed by the pad
/// id, then EOS. A map without `^`/`$` gets 0 for both markers.
pub fn phonemes_to_ids(phonemes: &str, id_map: &HashMap<String, Vec<i64>>) -> Vec<i64> {
    let marker = |symbol: &str| id_map.get(symbol).map_or_else(|| vec![0], Clone::clone);
    let pad = id_map.get("_").map(Vec::as_slice).unwrap_or_default();

    let mut ids = marker("^");
    let mut buf = [0u8; 4];
    for ch in phonemes.chars() {
        if let Some(mapped) = id_map.get(&*ch.encode_utf8(&mut buf)) {
            ids.extend_from_slice(mapped);
        }
        ids.extend_from_slice(pad);
    }
    ids.extend(marker("$"));

    ids
}
