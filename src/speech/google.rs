//! Google Cloud Speech-to-Text (REST `speech:recognize`) provider.

use super::recognizer::{
    RecognitionProvider, RecognitionRequest, RecognitionSegment, SpeechError,
};
use crate::credentials::SecretSource;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const DEFAULT_SPEECH_ENDPOINT: &str = "https://speech.googleapis.com";

pub struct GoogleSpeechRecognizer {
    client: Client,
    endpoint: String,
    access_token: SecretSource,
    project_id: Option<String>,
}

impl GoogleSpeechRecognizer {
    /// # Arguments
    /// * `endpoint` - Base URL, normally [`DEFAULT_SPEECH_ENDPOINT`].
    /// * `access_token` - OAuth bearer token source.
    /// * `project_id` - Billing project sent as `x-goog-user-project`.
    pub fn new(
        client: Client,
        endpoint: impl Into<String>,
        access_token: SecretSource,
        project_id: Option<String>,
    ) -> Self {
        Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            access_token,
            project_id,
        }
    }

    fn to_google_request(request: &RecognitionRequest) -> GoogleRecognizeRequest<'_> {
        let config = &request.config;
        GoogleRecognizeRequest {
            config: GoogleRecognitionConfig {
                encoding: config.encoding.api_name(),
                sample_rate_hertz: config.sample_rate_hz,
                language_code: &config.language_code,
                alternative_language_codes: &config.alternative_language_codes,
                enable_automatic_punctuation: config.enable_automatic_punctuation,
                model: &config.model,
                use_enhanced: config.use_enhanced,
            },
            audio: GoogleAudio {
                content: STANDARD.encode(&request.audio),
            },
        }
    }
}

#[async_trait]
impl RecognitionProvider for GoogleSpeechRecognizer {
    fn name(&self) -> &str {
        "google"
    }

    async fn recognize(
        &self,
        request: &RecognitionRequest,
    ) -> Result<Vec<RecognitionSegment>, SpeechError> {
        let url = format!("{}/v1p1beta1/speech:recognize", self.endpoint);

        debug!(
            encoding = request.config.encoding.api_name(),
            sample_rate = request.config.sample_rate_hz,
            bytes = request.audio.len(),
            "Sending recognition request"
        );

        let mut req_builder = self.client.post(&url).json(&Self::to_google_request(request));
        if let Some(token) = self.access_token.get().await? {
            req_builder = req_builder.bearer_auth(token);
        }
        if let Some(project) = &self.project_id {
            req_builder = req_builder.header("x-goog-user-project", project);
        }

        let response = req_builder
            .send()
            .await
            .map_err(|e| SpeechError::Connection(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SpeechError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let parsed: GoogleRecognizeResponse = response.json().await.map_err(|e| {
            SpeechError::InvalidResponse(format!("Failed to parse recognition response: {}", e))
        })?;

        Ok(parsed
            .results
            .into_iter()
            .filter_map(|result| result.alternatives.into_iter().next())
            .map(|alt| RecognitionSegment {
                transcript: alt.transcript,
                confidence: alt.confidence,
            })
            .collect())
    }
}

// Speech-to-Text API types

#[derive(Debug, Serialize)]
struct GoogleRecognizeRequest<'a> {
    config: GoogleRecognitionConfig<'a>,
    audio: GoogleAudio,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GoogleRecognitionConfig<'a> {
    encoding: &'static str,
    sample_rate_hertz: u32,
    language_code: &'a str,
    alternative_language_codes: &'a [String],
    enable_automatic_punctuation: bool,
    model: &'a str,
    use_enhanced: bool,
}

#[derive(Debug, Serialize)]
struct GoogleAudio {
    content: String,
}

#[derive(Debug, Deserialize)]
struct GoogleRecognizeResponse {
    #[serde(default)]
    results: Vec<GoogleRecognitionResult>,
}

#[derive(Debug, Deserialize)]
struct GoogleRecognitionResult {
    #[serde(default)]
    alternatives: Vec<GoogleAlternative>,
}

#[derive(Debug, Deserialize)]
struct GoogleAlternative {
    #[serde(default)]
    transcript: String,
    confidence: Option<f32>,
}
