use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    // Core settings (can override CLI)
    pub mode: Option<String>,
    pub db_dir: Option<String>,
    pub seed_file: Option<String>,
    pub port: Option<u16>,
    pub metrics_port: Option<u16>,
    pub logging_level: Option<String>,

    // Feature configs
    pub nearby: Option<NearbyConfig>,
    pub model: Option<ModelConfig>,
    pub speech: Option<SpeechConfig>,
    pub voice: Option<VoiceConfig>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct NearbyConfig {
    pub radius_km: Option<f64>,
    pub candidate_limit: Option<usize>,
    pub max_tracks: Option<usize>,
    pub store_timeout_ms: Option<u64>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct ModelConfig {
    /// "vertex", "openai" or "local".
    pub provider: Option<String>,
    pub project_id: Option<String>,
    pub region: Option<String>,
    pub model: Option<String>,
    /// Vertex endpoint override, or the OpenAI-compatible base URL.
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub api_key_command: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct SpeechConfig {
    pub endpoint: Option<String>,
    pub project_id: Option<String>,
    pub api_key: Option<String>,
    pub api_key_command: Option<String>,
    pub language_code: Option<String>,
    pub alternative_language_codes: Option<Vec<String>>,
    pub model: Option<String>,
    pub timeout_secs: Option<u64>,
    pub max_audio_mb: Option<usize>,
    /// Sentence returned by the local-mode recognizer.
    pub mock_transcript: Option<String>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct VoiceConfig {
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub api_key_command: Option<String>,
    pub voice_id: Option<String>,
    pub story_voice_id: Option<String>,
    pub model_id: Option<String>,
    pub output_format: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}
