//! Vertex AI Gemini provider (`generateContent`).

use super::provider::{map_reqwest_error, CompletionOptions, LlmError, LlmProvider};
use super::types::{CompletionResponse, FinishReason, Message, MessageRole, TokenUsage};
use crate::credentials::SecretSource;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub struct VertexProvider {
    client: Client,
    endpoint: String,
    project_id: String,
    region: String,
    model: String,
    access_token: SecretSource,
}

impl VertexProvider {
    /// # Arguments
    /// * `endpoint` - Overrides `https://{region}-aiplatform.googleapis.com`.
    /// * `access_token` - OAuth bearer token source.
    pub fn new(
        client: Client,
        project_id: impl Into<String>,
        region: impl Into<String>,
        model: impl Into<String>,
        endpoint: Option<String>,
        access_token: SecretSource,
    ) -> Self {
        let region = region.into();
        let endpoint = endpoint
            .unwrap_or_else(|| format!("https://{}-aiplatform.googleapis.com", region))
            .trim_end_matches('/')
            .to_string();
        Self {
            client,
            endpoint,
            project_id: project_id.into(),
            region,
            model: model.into(),
            access_token,
        }
    }

    fn model_url(&self) -> String {
        format!(
            "{}/v1/projects/{}/locations/{}/publishers/google/models/{}",
            self.endpoint, self.project_id, self.region, self.model
        )
    }

    /// System messages are merged into `systemInstruction`; the rest become
    /// `contents` with Gemini's `user`/`model` roles.
    fn to_gemini_request<'a>(
        messages: &'a [Message],
        options: &CompletionOptions,
    ) -> GeminiRequest<'a> {
        let system_parts: Vec<GeminiPart<'a>> = messages
            .iter()
            .filter(|m| m.role == MessageRole::System)
            .map(|m| GeminiPart { text: &m.content })
            .collect();
        let contents = messages
            .iter()
            .filter(|m| m.role != MessageRole::System)
            .map(|m| GeminiContent {
                role: if m.role == MessageRole::Assistant {
                    "model"
                } else {
                    "user"
                },
                parts: vec![GeminiPart { text: &m.content }],
            })
            .collect();

        GeminiRequest {
            system_instruction: if system_parts.is_empty() {
                None
            } else {
                Some(GeminiSystemInstruction {
                    parts: system_parts,
                })
            },
            contents,
            generation_config: GeminiGenerationConfig {
                max_output_tokens: options.max_tokens,
                temperature: options.temperature,
            },
        }
    }

    async fn authorized(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> Result<reqwest::RequestBuilder, LlmError> {
        Ok(match self.access_token.get().await? {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        })
    }
}

#[async_trait]
impl LlmProvider for VertexProvider {
    fn name(&self) -> &str {
        "vertex"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(
        &self,
        messages: &[Message],
        options: &CompletionOptions,
    ) -> Result<CompletionResponse, LlmError> {
        let url = format!("{}:generateContent", self.model_url());
        let request = Self::to_gemini_request(messages, options);

        debug!(
            model = %self.model,
            message_count = messages.len(),
            "Sending generateContent request to Vertex AI"
        );

        let response = self
            .authorized(self.client.post(&url).json(&request))
            .await?
            .timeout(options.timeout)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(LlmError::RateLimited);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let gemini: GeminiResponse = response.json().await.map_err(|e| {
            LlmError::InvalidResponse(format!("Failed to parse Gemini response: {}", e))
        })?;

        let candidate = gemini.candidates.into_iter().next().ok_or_else(|| {
            LlmError::InvalidResponse("No candidates in Gemini response".to_string())
        })?;

        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        let finish_reason = match candidate.finish_reason.as_deref() {
            Some("MAX_TOKENS") => FinishReason::MaxTokens,
            Some("SAFETY") | Some("PROHIBITED_CONTENT") | Some("BLOCKLIST") => {
                FinishReason::ContentFilter
            }
            _ => FinishReason::Stop,
        };

        Ok(CompletionResponse {
            message: Message::assistant(text),
            finish_reason,
            usage: gemini.usage_metadata.map(|u| TokenUsage {
                prompt_tokens: u.prompt_token_count,
                completion_tokens: u.candidates_token_count,
                total_tokens: u.total_token_count,
            }),
        })
    }
}

// Gemini API types

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiSystemInstruction<'a>>,
    contents: Vec<GeminiContent<'a>>,
    generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Serialize)]
struct GeminiSystemInstruction<'a> {
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Debug, Serialize)]
struct GeminiContent<'a> {
    role: &'static str,
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Debug, Serialize)]
struct GeminiPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    usage_metadata: Option<GeminiUsage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiResponseContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponseContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiUsage {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
    #[serde(default)]
    total_token_count: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(endpoint: String) -> VertexProvider {
        VertexProvider::new(
            Client::new(),
            "music-map",
            "asia-northeast3",
            "gemini-1.5-flash",
            Some(endpoint),
            SecretSource::Static("ya29.token".to_string()),
        )
    }

    #[test]
    fn default_endpoint_uses_region() {
        let provider = VertexProvider::new(
            Client::new(),
            "p",
            "us-central1",
            "gemini-1.5-flash",
            None,
            SecretSource::None,
        );
        assert_eq!(
            provider.model_url(),
            "https://us-central1-aiplatform.googleapis.com/v1/projects/p/locations/us-central1/publishers/google/models/gemini-1.5-flash"
        );
    }

    #[tokio::test]
    async fn sends_system_instruction_and_joins_parts() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(
                "/v1/projects/music-map/locations/asia-northeast3/publishers/google/models/gemini-1.5-flash:generateContent",
            ))
            .and(header("authorization", "Bearer ya29.token"))
            .and(body_partial_json(serde_json::json!({
                "systemInstruction": {"parts": [{"text": "You are a DJ"}]},
                "contents": [{"role": "user", "parts": [{"text": "play something"}]}],
                "generationConfig": {"maxOutputTokens": 400}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{
                    "content": {"role": "model", "parts": [{"text": "How about "}, {"text": "Ditto?"}]},
                    "finishReason": "STOP"
                }],
                "usageMetadata": {"promptTokenCount": 10, "candidatesTokenCount": 4, "totalTokenCount": 14}
            })))
            .mount(&server)
            .await;

        let response = provider(server.uri())
            .complete(
                &[Message::system("You are a DJ"), Message::user("play something")],
                &CompletionOptions::default(),
            )
            .await
            .unwrap();

        assert_eq!(response.message.content, "How about Ditto?");
        assert_eq!(response.finish_reason, FinishReason::Stop);
        assert_eq!(response.usage.unwrap().total_tokens, 14);
    }

    #[tokio::test]
    async fn blocked_candidate_has_empty_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{"finishReason": "SAFETY"}]
            })))
            .mount(&server)
            .await;

        let response = provider(server.uri())
            .complete(&[Message::user("hi")], &CompletionOptions::default())
            .await
            .unwrap();
        assert_eq!(response.message.content, "");
        assert_eq!(response.finish_reason, FinishReason::ContentFilter);
    }

    #[tokio::test]
    async fn server_error_is_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let result = provider(server.uri())
            .complete(&[Message::user("hi")], &CompletionOptions::default())
            .await;
        assert!(matches!(result, Err(LlmError::Api { status: 500, .. })));
    }
}
