//! Startup wiring: picks the collaborators for the configured mode.

use crate::config::{AppConfig, Mode, ModelProviderKind};
use crate::conversation::{ConversationService, ConversationSettings};
use crate::credentials::SecretSource;
use crate::dj::{AnswerComposer, QueryResolver};
use crate::drop_store::{load_seed_documents, DropStore, InMemoryDropStore, SqliteDropStore};
use crate::llm::{CompletionOptions, LlmProvider, LocalProvider, OpenAIProvider, VertexProvider};
use crate::nearby::NearbyLocator;
use crate::speech::{
    GoogleSpeechRecognizer, MockRecognizer, RecognitionProvider, SpeechTranscriber,
    TranscriberSettings, DEFAULT_SPEECH_ENDPOINT,
};
use crate::voice::{
    ElevenLabsProvider, SilentVoiceProvider, SpeechSynthesizer, VoiceProvider,
    DEFAULT_ELEVENLABS_MODEL, DEFAULT_ELEVENLABS_URL, DEFAULT_OUTPUT_FORMAT,
};
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

const OPENAI_DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
/// Voice used by the silent stand-in, which ignores it.
const LOCAL_VOICE_ID: &str = "local";

/// Everything the HTTP layer needs.
#[derive(Clone)]
pub struct Services {
    pub store: Arc<dyn DropStore>,
    pub conversation: Arc<ConversationService>,
    pub store_timeout: Duration,
}

impl Services {
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .context("Failed to build HTTP client")?;

        let store = build_store(config)?;
        let llm = build_llm(config, client.clone());
        let recognizer = build_recognizer(config, client.clone());
        let (voice, default_voice_id) = build_voice(config, client.clone())?;

        let transcriber = SpeechTranscriber::new(
            recognizer,
            client,
            TranscriberSettings {
                language_code: config.speech.language_code.clone(),
                alternative_language_codes: config.speech.alternative_language_codes.clone(),
                model: config.speech.model.clone(),
                use_enhanced: true,
                timeout: config.speech.timeout,
                max_audio_bytes: config.speech.max_audio_bytes,
            },
        );
        let composer = AnswerComposer::new(
            llm,
            CompletionOptions {
                temperature: config.model.temperature,
                max_tokens: Some(config.model.max_tokens),
                timeout: config.model.timeout,
            },
        );
        let synthesizer = SpeechSynthesizer::new(voice, default_voice_id, config.voice.timeout)?;

        let conversation = ConversationService::new(
            NearbyLocator::new(store.clone(), config.nearby.store_timeout),
            QueryResolver::new(Arc::new(transcriber)),
            composer,
            synthesizer,
            ConversationSettings {
                radius_km: config.nearby.radius_km,
                candidate_limit: config.nearby.candidate_limit,
                max_tracks: config.nearby.max_tracks,
                story_voice_id: config.voice.story_voice_id.clone(),
            },
        );

        Ok(Self {
            store,
            conversation: Arc::new(conversation),
            store_timeout: config.nearby.store_timeout,
        })
    }
}

fn build_store(config: &AppConfig) -> Result<Arc<dyn DropStore>> {
    match (config.mode, config.drops_db_path()) {
        (Mode::Production, Some(path)) => {
            info!("Opening SQLite drop store at {:?}...", path);
            Ok(Arc::new(SqliteDropStore::new(&path)?))
        }
        (Mode::Production, None) => anyhow::bail!("Production mode needs a db_dir"),
        (Mode::Local, _) => match &config.seed_file {
            Some(seed) => {
                info!("Seeding in-memory drop store from {:?}...", seed);
                Ok(Arc::new(InMemoryDropStore::from_documents(
                    load_seed_documents(seed)?,
                )))
            }
            None => {
                info!("Using an empty in-memory drop store");
                Ok(Arc::new(InMemoryDropStore::new()))
            }
        },
    }
}

fn build_llm(config: &AppConfig, client: reqwest::Client) -> Arc<dyn LlmProvider> {
    let model = &config.model;
    let key = SecretSource::from_parts(model.api_key.clone(), model.api_key_command.clone());
    match model.provider {
        ModelProviderKind::Vertex => {
            info!("Answer model: Vertex AI {} in {}", model.model, model.region);
            Arc::new(VertexProvider::new(
                client,
                model.project_id.clone().unwrap_or_default(),
                model.region.clone(),
                model.model.clone(),
                model.base_url.clone(),
                key,
            ))
        }
        ModelProviderKind::OpenAi => {
            let base_url = model
                .base_url
                .clone()
                .unwrap_or_else(|| OPENAI_DEFAULT_BASE_URL.to_string());
            info!("Answer model: {} at {}", model.model, base_url);
            Arc::new(OpenAIProvider::new(client, base_url, model.model.clone(), key))
        }
        ModelProviderKind::Local => {
            info!("Answer model: local stand-in");
            Arc::new(LocalProvider::default())
        }
    }
}

fn build_recognizer(config: &AppConfig, client: reqwest::Client) -> Arc<dyn RecognitionProvider> {
    let speech = &config.speech;
    if config.mode == Mode::Local && !speech.has_credentials() {
        info!("Speech recognition: local stand-in");
        return Arc::new(MockRecognizer::new(speech.mock_transcript.clone()));
    }
    if !speech.has_credentials() {
        warn!("No speech credentials configured; recognition calls will be unauthenticated");
    }
    Arc::new(GoogleSpeechRecognizer::new(
        client,
        speech
            .endpoint
            .clone()
            .unwrap_or_else(|| DEFAULT_SPEECH_ENDPOINT.to_string()),
        SecretSource::from_parts(speech.api_key.clone(), speech.api_key_command.clone()),
        speech.project_id.clone(),
    ))
}

fn build_voice(
    config: &AppConfig,
    client: reqwest::Client,
) -> Result<(Arc<dyn VoiceProvider>, String)> {
    let voice = &config.voice;
    if config.mode == Mode::Local && !voice.has_credentials() {
        info!("Voice synthesis: silent stand-in");
        let voice_id = voice
            .voice_id
            .clone()
            .unwrap_or_else(|| LOCAL_VOICE_ID.to_string());
        return Ok((Arc::new(SilentVoiceProvider), voice_id));
    }

    let provider = ElevenLabsProvider::new(
        client,
        voice
            .base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_ELEVENLABS_URL.to_string()),
        SecretSource::from_parts(voice.api_key.clone(), voice.api_key_command.clone()),
        voice
            .model_id
            .clone()
            .unwrap_or_else(|| DEFAULT_ELEVENLABS_MODEL.to_string()),
        voice
            .output_format
            .clone()
            .unwrap_or_else(|| DEFAULT_OUTPUT_FORMAT.to_string()),
    )?;
    let voice_id = voice
        .voice_id
        .clone()
        .context("voice.voice_id is required when a voice API key is configured")?;
    Ok((Arc::new(provider), voice_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CliConfig, FileConfig, VoiceConfig};

    fn local_config(file: Option<FileConfig>) -> AppConfig {
        let cli = CliConfig {
            mode: Mode::Local,
            port: 3001,
            metrics_port: 9091,
            ..Default::default()
        };
        AppConfig::resolve(&cli, file).unwrap()
    }

    #[tokio::test]
    async fn local_mode_wires_stand_ins() {
        let services = Services::from_config(&local_config(None)).unwrap();
        assert_eq!(services.store.count_drops().unwrap(), 0);
        assert_eq!(services.conversation.settings().max_tracks, 5);
    }

    #[test]
    fn local_voice_key_without_voice_id_fails() {
        let config = local_config(Some(FileConfig {
            voice: Some(VoiceConfig {
                api_key: Some("xi".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        }));
        assert!(Services::from_config(&config).is_err());
    }

    #[test]
    fn local_seed_file_is_loaded() {
        let dir = tempfile::TempDir::new().unwrap();
        let seed = dir.path().join("drops.json");
        std::fs::write(
            &seed,
            r#"[{"id": "a", "trackName": "Ditto", "location": {"_latitude": 37.5, "_longitude": 127.0}},
                {"id": "b", "trackName": "Nowhere"}]"#,
        )
        .unwrap();

        let mut config = local_config(None);
        config.seed_file = Some(seed);
        let services = Services::from_config(&config).unwrap();
        assert_eq!(services.store.count_drops().unwrap(), 1);
    }
}
