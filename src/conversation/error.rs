use super::models::ValidationError;
use crate::dj::{ResolveError, StoryRequestError};
use crate::drop_store::NewDropError;
use crate::server::metrics;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

const GENERIC_INTERNAL_MESSAGE: &str = "Something went wrong. Please try again later.";

/// Everything a request can fail with, mapped onto HTTP statuses.
/// Internal details only ever reach the logs.
#[derive(Debug, Error)]
pub enum ConversationError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    InvalidStory(#[from] StoryRequestError),

    #[error(transparent)]
    InvalidDrop(#[from] NewDropError),

    #[error("Could not understand the audio. Please try again or type your question.")]
    TranscriptionFailed,

    #[error("The narration could not be generated. Please try again later.")]
    SynthesisUnavailable,

    #[error("Drop not found.")]
    NotFound,

    #[error("internal error: {0:#}")]
    Internal(#[from] anyhow::Error),
}

impl From<ResolveError> for ConversationError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::MissingInput => ValidationError::MissingInput.into(),
            ResolveError::TranscriptionFailed => ConversationError::TranscriptionFailed,
        }
    }
}

impl ConversationError {
    pub fn status(&self) -> StatusCode {
        match self {
            ConversationError::Validation(_)
            | ConversationError::InvalidStory(_)
            | ConversationError::InvalidDrop(_) => StatusCode::BAD_REQUEST,
            ConversationError::TranscriptionFailed => StatusCode::UNPROCESSABLE_ENTITY,
            ConversationError::SynthesisUnavailable => StatusCode::BAD_GATEWAY,
            ConversationError::NotFound => StatusCode::NOT_FOUND,
            ConversationError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Label for the errors counter.
    pub fn kind(&self) -> &'static str {
        match self {
            ConversationError::Validation(_) => "validation",
            ConversationError::InvalidStory(_) => "invalid_story",
            ConversationError::InvalidDrop(_) => "invalid_drop",
            ConversationError::TranscriptionFailed => "transcription_failed",
            ConversationError::SynthesisUnavailable => "synthesis_unavailable",
            ConversationError::NotFound => "not_found",
            ConversationError::Internal(_) => "internal",
        }
    }

    /// Counts the error against `endpoint` and hands it back.
    pub fn recorded(self, endpoint: &str) -> Self {
        metrics::record_error(self.kind(), endpoint);
        self
    }

    /// The message shown to clients.
    pub fn client_message(&self) -> String {
        match self {
            ConversationError::Internal(_) => GENERIC_INTERNAL_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ConversationError {
    fn into_response(self) -> Response {
        if let ConversationError::Internal(err) = &self {
            error!("Request failed: {:#}", err);
        }
        (
            self.status(),
            Json(json!({ "error": self.client_message() })),
        )
            .into_response()
    }
}
