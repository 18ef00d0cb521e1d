use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::path::{Path, PathBuf};

use crate::error::AppError;

#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    pub audio: AudioConfig,
    pub espeak: Option<EspeakConfig>,
    #[serde(default)]
    pub phoneme_id_map: HashMap<String, Vec<i64>>,
    #[serde(default)]
    pub inference: Option<InferenceConfig>,
    #[serde(default = "default_num_speakers")]
    pub num_speakers: u32,
    #[serde(default)]
    pub speaker_id_map: BTreeMap<String, i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AudioConfig {
    pub sample_rate: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EspeakConfig {
    pub voice: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InferenceConfig {
    #[serde(default = "default_length_scale")]
    pub length_scale: f32,
}

fn default_num_speakers() -> u32 {
    1
}

fn default_length_scale() -> f32 {
    1.0
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            length_scale: default_length_scale(),
        }
    }
}

impl ModelConfig {
    pub fn is_multi_speaker(&self) -> bool {
        self.num_speakers > 1 || !self.speaker_id_map.is_empty()
    }

    pub fn espeak_voice(&self) -> &str {
        self.espeak
            .as_ref()
            .map(|e| e.voice.as_str())
            .unwrap_or("en-us")
    }
}

/// An ONNX model and its JSON config, found as `<BASE>.onnx` and
/// `<BASE>.onnx.json` under the models directory.
#[derive(Debug)]
pub struct ModelBundle {
    pub base_language: String,
    pub config: ModelConfig,
    pub model_path: PathBuf,
}

impl ModelBundle {
    pub fn load(models_dir: &Path, base_language: &str) -> Result<Self, AppError> {
        // Only bare codes name a file; anything else could step outside models_dir.
        if !is_plain_code(base_language) {
            return Err(AppError::ModelNotFound(format!(
                "{:?} is not a model name",
                base_language
            )));
        }

        let model_path = models_dir.join(format!("{}.onnx", base_language));
        let config_path = models_dir.join(format!("{}.onnx.json", base_language));

        if !model_path.exists() {
            return Err(AppError::ModelNotFound(format!(
                "{} (expected {})",
                base_language,
                model_path.display()
            )));
        }

        if !config_path.exists() {
            return Err(AppError::ModelNotFound(format!(
                "{} (missing config file)",
                base_language
            )));
        }

        let config: ModelConfig = serde_json::from_reader(File::open(&config_path)?)?;

        Ok(Self {
            base_language: base_language.to_string(),
            config,
            model_path,
        })
    }
}

fn is_plain_code(code: &str) -> bool {
    !code.is_empty()
        && code
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}
