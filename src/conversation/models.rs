use crate::drop_store::{GeoPoint, GeoPointError};
use crate::nearby::NearbyDrop;
use crate::speech::{AudioRef, AudioRefError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("Location is required.")]
    MissingLocation,
    #[error("Invalid location: {0}")]
    InvalidLocation(String),
    #[error("Either text or audio is required.")]
    MissingInput,
    #[error("Invalid audio reference: {0}")]
    InvalidAudio(#[from] AudioRefError),
    #[error("Malformed request: {0}")]
    Malformed(String),
}

impl From<GeoPointError> for ValidationError {
    fn from(err: GeoPointError) -> Self {
        ValidationError::InvalidLocation(err.to_string())
    }
}

/// JSON body of an ask request. `location` stays loose because multipart
/// uploads carry it as a JSON-encoded string.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AskBody {
    pub text: Option<String>,
    #[serde(alias = "audioRef")]
    pub audio_url: Option<String>,
    pub location: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct LocationBody {
    #[serde(alias = "lat")]
    latitude: f64,
    #[serde(alias = "lng")]
    longitude: f64,
}

/// Accepts `{latitude, longitude}` (or `{lat, lng}`), either as an object
/// or as a string holding that object.
pub fn parse_location(value: Option<&serde_json::Value>) -> Result<GeoPoint, ValidationError> {
    let body: LocationBody = match value {
        None | Some(serde_json::Value::Null) => return Err(ValidationError::MissingLocation),
        Some(serde_json::Value::String(raw)) if raw.trim().is_empty() => {
            return Err(ValidationError::MissingLocation)
        }
        Some(serde_json::Value::String(raw)) => serde_json::from_str(raw)
            .map_err(|e| ValidationError::InvalidLocation(e.to_string()))?,
        Some(other) => serde_json::from_value(other.clone())
            .map_err(|e| ValidationError::InvalidLocation(e.to_string()))?,
    };
    Ok(GeoPoint::new(body.latitude, body.longitude)?)
}

/// A validated ask. Holds a location and at least one of text or audio.
#[derive(Debug, Clone)]
pub struct ConversationRequest {
    pub text: Option<String>,
    pub audio: Option<AudioRef>,
    pub location: GeoPoint,
}

impl ConversationRequest {
    pub fn new(
        text: Option<String>,
        audio: Option<AudioRef>,
        location: GeoPoint,
    ) -> Result<Self, ValidationError> {
        let text = text.filter(|t| !t.trim().is_empty());
        if text.is_none() && audio.is_none() {
            return Err(ValidationError::MissingInput);
        }
        Ok(Self {
            text,
            audio,
            location,
        })
    }

    pub fn from_body(body: AskBody) -> Result<Self, ValidationError> {
        let location = parse_location(body.location.as_ref())?;
        let audio = body
            .audio_url
            .filter(|a| !a.trim().is_empty())
            .map(|a| AudioRef::parse(a.trim()))
            .transpose()?;
        Self::new(body.text, audio, location)
    }
}

/// A recommended track as the client renders it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackView {
    pub id: String,
    pub track_name: String,
    pub artist_name: String,
    pub mood: String,
    pub cover_url: String,
    pub preview_url: String,
    pub user_text: String,
    /// Kilometres from the listener.
    pub distance: f64,
}

impl From<NearbyDrop> for TrackView {
    fn from(drop: NearbyDrop) -> Self {
        Self {
            id: drop.id,
            track_name: drop.track_name,
            artist_name: drop.artist_name,
            mood: drop.mood,
            cover_url: drop.cover_url,
            preview_url: drop.preview_url,
            user_text: drop.user_text,
            distance: drop.distance_km,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationResponse {
    pub answer_text: String,
    pub tracks: Vec<TrackView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tts_audio_url: Option<String>,
}
