//! Speech recognition provider trait definition.

use super::encoding::AudioEncoding;
use crate::credentials::CredentialError;
use async_trait::async_trait;
use thiserror::Error;

/// Recognition parameters sent along with the audio.
#[derive(Debug, Clone, PartialEq)]
pub struct RecognitionConfig {
    pub encoding: AudioEncoding,
    pub sample_rate_hz: u32,
    pub language_code: String,
    pub alternative_language_codes: Vec<String>,
    pub enable_automatic_punctuation: bool,
    pub model: String,
    pub use_enhanced: bool,
}

#[derive(Debug, Clone)]
pub struct RecognitionRequest {
    pub config: RecognitionConfig,
    pub audio: Vec<u8>,
}

/// Top alternative of one recognized segment.
#[derive(Debug, Clone, PartialEq)]
pub struct RecognitionSegment {
    pub transcript: String,
    pub confidence: Option<f32>,
}

#[derive(Debug, Error)]
pub enum SpeechError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Audio download failed: {0}")]
    Download(String),

    #[error("Audio too large: {0} bytes")]
    TooLarge(usize),

    #[error(transparent)]
    Credential(#[from] CredentialError),
}

#[async_trait]
pub trait RecognitionProvider: Send + Sync {
    /// Provider name for logs and metrics (e.g. "google").
    fn name(&self) -> &str;

    /// Returns the recognized segments in order. An empty list means the
    /// service heard nothing.
    async fn recognize(
        &self,
        request: &RecognitionRequest,
    ) -> Result<Vec<RecognitionSegment>, SpeechError>;
}
