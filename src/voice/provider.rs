//! Voice synthesis provider trait definition.

use crate::credentials::CredentialError;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use thiserror::Error;

/// Encoded audio returned by a voice provider.
#[derive(Clone, PartialEq)]
pub struct SynthesizedAudio {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl std::fmt::Debug for SynthesizedAudio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SynthesizedAudio")
            .field("len", &self.bytes.len())
            .field("mime_type", &self.mime_type)
            .finish()
    }
}

impl SynthesizedAudio {
    /// `data:{mime};base64,{payload}` for embedding in JSON responses.
    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, STANDARD.encode(&self.bytes))
    }
}

#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("Voice configuration error: {0}")]
    Configuration(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Provider returned no audio")]
    EmptyAudio,

    #[error(transparent)]
    Credential(#[from] CredentialError),
}

#[async_trait]
pub trait VoiceProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn synthesize(
        &self,
        text: &str,
        voice_id: &str,
    ) -> Result<SynthesizedAudio, SynthesisError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_uri_embeds_mime_and_base64() {
        let audio = SynthesizedAudio {
            bytes: vec![1, 2, 3],
            mime_type: "audio/mpeg".to_string(),
        };
        assert_eq!(audio.to_data_uri(), "data:audio/mpeg;base64,AQID");
    }
}
