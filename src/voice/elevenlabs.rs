//! ElevenLabs text-to-speech provider.

use super::provider::{SynthesisError, SynthesizedAudio, VoiceProvider};
use crate::credentials::SecretSource;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::debug;

pub const DEFAULT_ELEVENLABS_URL: &str = "https://api.elevenlabs.io";
pub const DEFAULT_ELEVENLABS_MODEL: &str = "eleven_multilingual_v2";
pub const DEFAULT_OUTPUT_FORMAT: &str = "mp3_44100_128";

pub struct ElevenLabsProvider {
    client: Client,
    base_url: String,
    api_key: SecretSource,
    model_id: String,
    output_format: String,
}

impl ElevenLabsProvider {
    /// Fails when no API key source is configured.
    pub fn new(
        client: Client,
        base_url: impl Into<String>,
        api_key: SecretSource,
        model_id: impl Into<String>,
        output_format: impl Into<String>,
    ) -> Result<Self, SynthesisError> {
        if !api_key.is_configured() {
            return Err(SynthesisError::Configuration(
                "ElevenLabs API key is not configured".to_string(),
            ));
        }
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            model_id: model_id.into(),
            output_format: output_format.into(),
        })
    }

    fn mime_for_format(&self) -> &'static str {
        let codec = self.output_format.split('_').next().unwrap_or_default();
        match codec {
            "pcm" => "audio/pcm",
            "ulaw" => "audio/basic",
            "opus" => "audio/ogg",
            _ => "audio/mpeg",
        }
    }
}

#[derive(Debug, Serialize)]
struct TextToSpeechRequest<'a> {
    text: &'a str,
    model_id: &'a str,
}

#[async_trait]
impl VoiceProvider for ElevenLabsProvider {
    fn name(&self) -> &str {
        "elevenlabs"
    }

    async fn synthesize(
        &self,
        text: &str,
        voice_id: &str,
    ) -> Result<SynthesizedAudio, SynthesisError> {
        let url = format!("{}/v1/text-to-speech/{}", self.base_url, voice_id);
        let api_key = self.api_key.get().await?.ok_or_else(|| {
            SynthesisError::Configuration("ElevenLabs API key is not configured".to_string())
        })?;

        debug!(voice_id, chars = text.chars().count(), "Sending text-to-speech request");

        let response = self
            .client
            .post(&url)
            .query(&[("output_format", self.output_format.as_str())])
            .header("xi-api-key", api_key)
            .json(&TextToSpeechRequest {
                text,
                model_id: &self.model_id,
            })
            .send()
            .await
            .map_err(|e| SynthesisError::Connection(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SynthesisError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let mime_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .filter(|ct| ct.starts_with("audio/"))
            .map(str::to_string)
            .unwrap_or_else(|| self.mime_for_format().to_string());
        let bytes = response
            .bytes()
            .await
            .map_err(|e| SynthesisError::Connection(e.to_string()))?;
        if bytes.is_empty() {
            return Err(SynthesisError::EmptyAudio);
        }

        Ok(SynthesizedAudio {
            bytes: bytes.to_vec(),
            mime_type,
        })
    }
}
