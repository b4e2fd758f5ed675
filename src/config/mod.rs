mod file_config;

pub use file_config::{FileConfig, ModelConfig, NearbyConfig, SpeechConfig, VoiceConfig};

use crate::server::RequestsLoggingLevel;
use anyhow::{bail, Result};
use clap::ValueEnum;
use std::path::PathBuf;
use std::time::Duration;

/// Selects the collaborators wired at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Mode {
    /// SQLite store and real speech, model and voice services.
    #[default]
    Production,
    /// In-memory store and stand-ins for any service without credentials.
    Local,
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub mode: Mode,
    pub db_dir: Option<PathBuf>,
    pub seed_file: Option<PathBuf>,
    pub port: u16,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelProviderKind {
    Vertex,
    OpenAi,
    Local,
}

impl ModelProviderKind {
    fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "vertex" | "gemini" => Some(Self::Vertex),
            "openai" => Some(Self::OpenAi),
            "local" | "mock" => Some(Self::Local),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NearbySettings {
    pub radius_km: f64,
    pub candidate_limit: usize,
    pub max_tracks: usize,
    pub store_timeout: Duration,
}

impl Default for NearbySettings {
    fn default() -> Self {
        Self {
            radius_km: 5.0,
            candidate_limit: 20,
            max_tracks: 5,
            store_timeout: Duration::from_secs(3),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ModelSettings {
    pub provider: ModelProviderKind,
    pub project_id: Option<String>,
    pub region: String,
    pub model: String,
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub api_key_command: Option<String>,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout: Duration,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            provider: ModelProviderKind::Vertex,
            project_id: None,
            region: "asia-northeast3".to_string(),
            model: "gemini-1.5-flash".to_string(),
            base_url: None,
            api_key: None,
            api_key_command: None,
            max_tokens: 400,
            temperature: 0.8,
            timeout: Duration::from_secs(20),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SpeechSettings {
    pub endpoint: Option<String>,
    pub project_id: Option<String>,
    pub api_key: Option<String>,
    pub api_key_command: Option<String>,
    pub language_code: String,
    pub alternative_language_codes: Vec<String>,
    pub model: String,
    pub timeout: Duration,
    pub max_audio_bytes: usize,
    pub mock_transcript: String,
}

impl SpeechSettings {
    pub fn has_credentials(&self) -> bool {
        self.api_key.is_some() || self.api_key_command.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct VoiceSettings {
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub api_key_command: Option<String>,
    pub voice_id: Option<String>,
    pub story_voice_id: Option<String>,
    pub model_id: Option<String>,
    pub output_format: Option<String>,
    pub timeout: Duration,
}

impl VoiceSettings {
    pub fn has_credentials(&self) -> bool {
        self.api_key.is_some() || self.api_key_command.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    // Core settings
    pub mode: Mode,
    pub db_dir: Option<PathBuf>,
    pub seed_file: Option<PathBuf>,
    pub port: u16,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,

    // Feature configs (with defaults)
    pub nearby: NearbySettings,
    pub model: ModelSettings,
    pub speech: SpeechSettings,
    pub voice: VoiceSettings,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let mode = match file.mode {
            Some(s) => match Mode::from_str(&s, true) {
                Ok(mode) => mode,
                Err(_) => bail!("Unknown mode in config file: {}", s),
            },
            None => cli.mode,
        };

        let db_dir = file.db_dir.map(PathBuf::from).or_else(|| cli.db_dir.clone());
        if let Some(dir) = &db_dir {
            if !dir.exists() {
                bail!("Database directory does not exist: {:?}", dir);
            }
            if !dir.is_dir() {
                bail!("db_dir is not a directory: {:?}", dir);
            }
        } else if mode == Mode::Production {
            bail!("db_dir must be specified via --db-dir or in config file");
        }

        let seed_file = file
            .seed_file
            .map(PathBuf::from)
            .or_else(|| cli.seed_file.clone());

        let port = file.port.unwrap_or(cli.port);
        let metrics_port = file.metrics_port.unwrap_or(cli.metrics_port);

        let logging_level = file
            .logging_level
            .and_then(|s| parse_logging_level(&s))
            .unwrap_or_else(|| cli.logging_level.clone());

        // Nearby settings
        let nearby_file = file.nearby.unwrap_or_default();
        let nearby_defaults = NearbySettings::default();
        let nearby = NearbySettings {
            radius_km: nearby_file.radius_km.unwrap_or(nearby_defaults.radius_km),
            candidate_limit: nearby_file
                .candidate_limit
                .unwrap_or(nearby_defaults.candidate_limit),
            max_tracks: nearby_file.max_tracks.unwrap_or(nearby_defaults.max_tracks),
            store_timeout: nearby_file
                .store_timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(nearby_defaults.store_timeout),
        };
        if !nearby.radius_km.is_finite() || nearby.radius_km <= 0.0 {
            bail!("nearby.radius_km must be a positive number");
        }

        // Model settings
        let model_file = file.model.unwrap_or_default();
        let model_defaults = ModelSettings::default();
        let provider = match model_file.provider {
            Some(s) => match ModelProviderKind::parse(&s) {
                Some(kind) => kind,
                None => bail!("Unknown model provider: {}", s),
            },
            None if mode == Mode::Local => ModelProviderKind::Local,
            None => model_defaults.provider,
        };
        let model = ModelSettings {
            provider,
            project_id: non_blank(model_file.project_id),
            region: model_file.region.unwrap_or(model_defaults.region),
            model: model_file.model.unwrap_or(model_defaults.model),
            base_url: model_file.base_url,
            api_key: non_blank(model_file.api_key),
            api_key_command: non_blank(model_file.api_key_command),
            max_tokens: model_file.max_tokens.unwrap_or(model_defaults.max_tokens),
            temperature: model_file
                .temperature
                .unwrap_or(model_defaults.temperature),
            timeout: model_file
                .timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(model_defaults.timeout),
        };
        if model.provider == ModelProviderKind::Vertex && model.project_id.is_none() {
            bail!("model.project_id is required for the vertex provider");
        }

        // Speech settings; local runs give up on recognition sooner
        let speech_file = file.speech.unwrap_or_default();
        let speech_timeout_secs = match mode {
            Mode::Production => 30,
            Mode::Local => 8,
        };
        let speech = SpeechSettings {
            endpoint: speech_file.endpoint,
            project_id: non_blank(speech_file.project_id),
            api_key: non_blank(speech_file.api_key),
            api_key_command: non_blank(speech_file.api_key_command),
            language_code: speech_file
                .language_code
                .unwrap_or_else(|| "ko-KR".to_string()),
            alternative_language_codes: speech_file
                .alternative_language_codes
                .unwrap_or_else(|| vec!["en-US".to_string()]),
            model: speech_file
                .model
                .unwrap_or_else(|| "latest_long".to_string()),
            timeout: Duration::from_secs(speech_file.timeout_secs.unwrap_or(speech_timeout_secs)),
            max_audio_bytes: speech_file.max_audio_mb.unwrap_or(10) * 1024 * 1024,
            mock_transcript: speech_file
                .mock_transcript
                .unwrap_or_else(|| "Recommend a song for this place.".to_string()),
        };

        // Voice settings
        let voice_file = file.voice.unwrap_or_default();
        let voice = VoiceSettings {
            base_url: voice_file.base_url,
            api_key: non_blank(voice_file.api_key),
            api_key_command: non_blank(voice_file.api_key_command),
            voice_id: non_blank(voice_file.voice_id),
            story_voice_id: non_blank(voice_file.story_voice_id),
            model_id: voice_file.model_id,
            output_format: voice_file.output_format,
            timeout: Duration::from_secs(voice_file.timeout_secs.unwrap_or(30)),
        };
        if mode == Mode::Production {
            if !voice.has_credentials() {
                bail!("voice.api_key or voice.api_key_command is required in production mode");
            }
            if voice.voice_id.is_none() {
                bail!("voice.voice_id is required in production mode");
            }
        }

        Ok(Self {
            mode,
            db_dir,
            seed_file,
            port,
            metrics_port,
            logging_level,
            nearby,
            model,
            speech,
            voice,
        })
    }

    pub fn drops_db_path(&self) -> Option<PathBuf> {
        self.db_dir.as_ref().map(|dir| dir.join("drops.db"))
    }
}

fn parse_logging_level(s: &str) -> Option<RequestsLoggingLevel> {
    RequestsLoggingLevel::from_str(s, true).ok()
}
