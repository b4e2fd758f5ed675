use super::provider::{CompletionOptions, LlmError, LlmProvider};
use super::types::{CompletionResponse, FinishReason, Message};
use async_trait::async_trait;

pub const LOCAL_REPLY: &str =
    "You're running the local DJ. Imagine a warm voice picking the perfect song for this spot!";

/// Stand-in model for local mode; always answers with a fixed reply.
pub struct LocalProvider {
    reply: String,
}

impl LocalProvider {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
        }
    }
}

impl Default for LocalProvider {
    fn default() -> Self {
        Self::new(LOCAL_REPLY)
    }
}

#[async_trait]
impl LlmProvider for LocalProvider {
    fn name(&self) -> &str {
        "local"
    }

    fn model(&self) -> &str {
        "scripted"
    }

    async fn complete(
        &self,
        _messages: &[Message],
        _options: &CompletionOptions,
    ) -> Result<CompletionResponse, LlmError> {
        Ok(CompletionResponse {
            message: Message::assistant(self.reply.clone()),
            finish_reason: FinishReason::Stop,
            usage: None,
        })
    }
}
