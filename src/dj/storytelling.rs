use super::composer::{AnswerComposer, AnswerSource};
use super::prompts::STORYTELLER_PERSONA;
use crate::drop_store::{DocumentTimestamp, DEFAULT_ARTIST_NAME};
use crate::llm::Message;
use crate::server::metrics;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error, PartialEq)]
pub enum StoryRequestError {
    #[error("A song title is required.")]
    MissingTitle,
    #[error("createdAt is required.")]
    MissingCreatedAt,
    #[error("createdAt must be epoch milliseconds or an RFC 3339 timestamp.")]
    InvalidCreatedAt,
}

/// Raw storytelling payload. Unknown fields (the client also sends the
/// drop coordinates) are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StoryBody {
    #[serde(alias = "trackName")]
    pub title: Option<String>,
    #[serde(alias = "artistName")]
    pub artist: Option<String>,
    pub mood: Option<String>,
    #[serde(alias = "userText")]
    pub text: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: Option<DocumentTimestamp>,
    pub timezone: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoryRequest {
    pub title: String,
    pub artist: String,
    pub mood: Option<String>,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub timezone: Option<String>,
}

impl StoryRequest {
    pub fn from_body(body: StoryBody) -> Result<Self, StoryRequestError> {
        let title = body
            .title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or(StoryRequestError::MissingTitle)?;
        let created_at = body
            .created_at
            .ok_or(StoryRequestError::MissingCreatedAt)?
            .to_datetime()
            .ok_or(StoryRequestError::InvalidCreatedAt)?;
        Ok(Self {
            title,
            artist: body
                .artist
                .map(|a| a.trim().to_string())
                .filter(|a| !a.is_empty())
                .unwrap_or_else(|| DEFAULT_ARTIST_NAME.to_string()),
            mood: body.mood.filter(|m| !m.trim().is_empty()),
            text: body.text.unwrap_or_default().trim().to_string(),
            created_at,
            timezone: body.timezone,
        })
    }
}

/// Formats a drop date for narration, e.g. "March 5, 2025 at 3:42 PM".
/// Unknown or missing time zones fall back to UTC.
pub fn format_drop_date(created_at: &DateTime<Utc>, timezone: Option<&str>) -> String {
    const FORMAT: &str = "%B %-d, %Y at %-I:%M %p";
    match timezone.and_then(|tz| tz.parse::<Tz>().ok()) {
        Some(tz) => created_at.with_timezone(&tz).format(FORMAT).to_string(),
        None => created_at.format(FORMAT).to_string(),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComposedStory {
    pub introduction: String,
    /// Introduction, a blank line, then the memory text verbatim.
    pub narration: String,
    pub source: AnswerSource,
}

fn fallback_introduction(request: &StoryRequest, date: &str) -> String {
    format!(
        "On {}, someone left \"{}\" by {} here, along with a memory. Let's listen.",
        date, request.title, request.artist
    )
}

impl AnswerComposer {
    /// Storytelling variant: introduces a single drop's memory.
    pub async fn compose_story(&self, request: &StoryRequest) -> ComposedStory {
        let date = format_drop_date(&request.created_at, request.timezone.as_deref());
        let prompt = format!(
            "Song: \"{}\" by {}\nMood: {}\nDropped on: {}\n\nWrite the introduction.",
            request.title,
            request.artist,
            request.mood.as_deref().unwrap_or("unknown"),
            date
        );
        debug!("Composing story introduction for \"{}\"", request.title);

        let messages = [Message::system(STORYTELLER_PERSONA), Message::user(prompt)];
        let (introduction, source) = match self.generate(&messages, "story introduction").await {
            Some(text) => (text, AnswerSource::Model),
            None => {
                metrics::record_degraded("storyteller");
                (
                    fallback_introduction(request, &date),
                    AnswerSource::Fallback,
                )
            }
        };

        let narration = if request.text.is_empty() {
            introduction.clone()
        } else {
            format!("{}\n\n{}", introduction, request.text)
        };
        ComposedStory {
            introduction,
            narration,
            source,
        }
    }
}
