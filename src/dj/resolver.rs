use crate::speech::{AudioRef, Transcriber};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ResolveError {
    #[error("Either text or audio is required.")]
    MissingInput,
    #[error("Could not understand the audio. Please try again or type your question.")]
    TranscriptionFailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryOrigin {
    Typed,
    Transcribed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedQuery {
    pub text: String,
    pub origin: QueryOrigin,
}

/// Picks the effective question: typed text wins, otherwise the audio must
/// transcribe to something.
pub struct QueryResolver {
    transcriber: Arc<dyn Transcriber>,
}

impl QueryResolver {
    pub fn new(transcriber: Arc<dyn Transcriber>) -> Self {
        Self { transcriber }
    }

    pub async fn resolve(
        &self,
        text: Option<&str>,
        audio: Option<&AudioRef>,
    ) -> Result<ResolvedQuery, ResolveError> {
        if let Some(text) = text.map(str::trim).filter(|t| !t.is_empty()) {
            return Ok(ResolvedQuery {
                text: text.to_string(),
                origin: QueryOrigin::Typed,
            });
        }

        let audio = audio.ok_or(ResolveError::MissingInput)?;
        match self.transcriber.transcribe(audio).await {
            Some(text) if !text.trim().is_empty() => Ok(ResolvedQuery {
                text: text.trim().to_string(),
                origin: QueryOrigin::Transcribed,
            }),
            _ => Err(ResolveError::TranscriptionFailed),
        }
    }
}
