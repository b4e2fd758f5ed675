mod mock;
mod openai;
mod provider;
mod types;
mod vertex;

pub use mock::{LocalProvider, LOCAL_REPLY};
pub use openai::OpenAIProvider;
pub use provider::{CompletionOptions, LlmError, LlmProvider};
pub use types::{CompletionResponse, FinishReason, Message, MessageRole, TokenUsage};
pub use vertex::VertexProvider;
