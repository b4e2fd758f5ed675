use super::context::build_grounded_prompt;
use super::fallback::fallback_answer;
use super::prompts::DJ_PERSONA;
use crate::llm::{CompletionOptions, LlmError, LlmProvider, Message};
use crate::nearby::NearbyDrop;
use crate::server::metrics;
use crate::timeout::{call_with_timeout, CallError};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerSource {
    Model,
    Fallback,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComposedAnswer {
    /// Never empty.
    pub text: String,
    pub source: AnswerSource,
}

/// Writes the DJ's reply. Model failures, timeouts and blank output all end
/// in the templated fallback, so composing itself never fails.
pub struct AnswerComposer {
    provider: Arc<dyn LlmProvider>,
    options: CompletionOptions,
}

impl AnswerComposer {
    pub fn new(provider: Arc<dyn LlmProvider>, options: CompletionOptions) -> Self {
        Self { provider, options }
    }

    /// Runs one completion under the configured deadline and returns the
    /// trimmed text, or `None` when nothing usable came back.
    pub(super) async fn generate(&self, messages: &[Message], purpose: &str) -> Option<String> {
        let start = Instant::now();
        let service = format!("llm_{}", self.provider.name());
        let call = self.provider.complete(messages, &self.options);

        match call_with_timeout::<_, LlmError, _>(self.options.timeout, call).await {
            Ok(response) => {
                metrics::record_external_call(&service, "ok", start.elapsed());
                if let Some(usage) = &response.usage {
                    debug!(
                        purpose,
                        prompt_tokens = usage.prompt_tokens,
                        completion_tokens = usage.completion_tokens,
                        total_tokens = usage.total_tokens,
                        "Model token usage"
                    );
                    metrics::record_model_tokens(usage.prompt_tokens, usage.completion_tokens);
                }
                let text = response.message.content.trim().to_string();
                if text.is_empty() {
                    warn!(
                        purpose,
                        finish_reason = ?response.finish_reason,
                        "Model returned an empty {}", purpose
                    );
                    return None;
                }
                info!(
                    purpose,
                    model = self.provider.model(),
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Model produced {}", purpose
                );
                Some(text)
            }
            Err(CallError::TimedOut(after)) => {
                metrics::record_external_call(&service, "timeout", start.elapsed());
                warn!(purpose, "Model call timed out after {:?}", after);
                None
            }
            Err(CallError::Failed(err)) => {
                metrics::record_external_call(&service, "error", start.elapsed());
                warn!(purpose, "Model call failed: {}", err);
                None
            }
        }
    }

    pub async fn compose(&self, query: &str, nearby: &[NearbyDrop]) -> ComposedAnswer {
        let messages = [
            Message::system(DJ_PERSONA),
            Message::user(build_grounded_prompt(query, nearby)),
        ];

        match self.generate(&messages, "answer").await {
            Some(text) => ComposedAnswer {
                text,
                source: AnswerSource::Model,
            },
            None => {
                metrics::record_degraded("composer");
                ComposedAnswer {
                    text: fallback_answer(query, nearby),
                    source: AnswerSource::Fallback,
                }
            }
        }
    }
}
