use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Owner id recorded when a drop is created without an authenticated user.
pub const ANONYMOUS_OWNER: &str = "anonymous";
pub const DEFAULT_ARTIST_NAME: &str = "Unknown Artist";
pub const DEFAULT_MOOD: &str = "neutral";

#[derive(Debug, Error, PartialEq)]
pub enum GeoPointError {
    #[error("latitude and longitude must be finite numbers")]
    NotFinite,
    #[error("latitude {0} is outside [-90, 90]")]
    LatitudeOutOfRange(f64),
    #[error("longitude {0} is outside [-180, 180]")]
    LongitudeOutOfRange(f64),
}

/// A validated geographic point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeoPoint {
    latitude: f64,
    longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, GeoPointError> {
        if !latitude.is_finite() || !longitude.is_finite() {
            return Err(GeoPointError::NotFinite);
        }
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(GeoPointError::LatitudeOutOfRange(latitude));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(GeoPointError::LongitudeOutOfRange(longitude));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

/// A persisted music memory tied to a place.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MusicDrop {
    pub id: String,
    pub track_name: String,
    pub artist_name: String,
    pub cover_url: String,
    pub preview_url: String,
    pub user_text: String,
    pub mood: String,
    pub location: GeoPoint,
    pub like_count: i64,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    pub owner_id: String,
}

#[derive(Debug, Error, PartialEq)]
pub enum NewDropError {
    #[error("Required information (track name, location) is missing.")]
    MissingRequired,
    #[error("Invalid location: {0}")]
    InvalidLocation(#[from] GeoPointError),
}

/// Input for creating a drop, with defaults already applied.
#[derive(Debug, Clone, PartialEq)]
pub struct NewDrop {
    pub track_name: String,
    pub artist_name: String,
    pub cover_url: String,
    pub preview_url: String,
    pub user_text: String,
    pub mood: String,
    pub location: GeoPoint,
    pub owner_id: String,
}

/// Raw creation payload as sent by clients. Every field is optional so that
/// missing values surface as a validation message instead of a decode error.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateDropBody {
    pub track_name: Option<String>,
    pub artist_name: Option<String>,
    pub cover_url: Option<String>,
    pub preview_url: Option<String>,
    pub user_text: Option<String>,
    pub mood: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Lower-cases a mood label, mapping blank input to `None`.
pub fn normalize_mood(mood: Option<&str>) -> Option<String> {
    mood.map(|m| m.trim().to_lowercase()).filter(|m| !m.is_empty())
}

impl NewDrop {
    pub fn from_body(body: CreateDropBody, owner_id: Option<String>) -> Result<Self, NewDropError> {
        let track_name = non_blank(body.track_name).ok_or(NewDropError::MissingRequired)?;
        let (latitude, longitude) = match (body.latitude, body.longitude) {
            (Some(lat), Some(lng)) => (lat, lng),
            _ => return Err(NewDropError::MissingRequired),
        };
        let location = GeoPoint::new(latitude, longitude)?;

        Ok(Self {
            track_name,
            artist_name: non_blank(body.artist_name)
                .unwrap_or_else(|| DEFAULT_ARTIST_NAME.to_string()),
            cover_url: body.cover_url.unwrap_or_default(),
            preview_url: body.preview_url.unwrap_or_default(),
            user_text: body.user_text.unwrap_or_default(),
            mood: normalize_mood(body.mood.as_deref()).unwrap_or_else(|| DEFAULT_MOOD.to_string()),
            location,
            owner_id: non_blank(owner_id).unwrap_or_else(|| ANONYMOUS_OWNER.to_string()),
        })
    }

    /// Assigns the identity and server-side fields of a fresh drop.
    pub fn into_drop(self, id: String, created_at: DateTime<Utc>) -> MusicDrop {
        MusicDrop {
            id,
            track_name: self.track_name,
            artist_name: self.artist_name,
            cover_url: self.cover_url,
            preview_url: self.preview_url,
            user_text: self.user_text,
            mood: self.mood,
            location: self.location,
            like_count: 0,
            created_at,
            owner_id: self.owner_id,
        }
    }
}

/// Store-level predicate for drop queries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DropFilter {
    pub mood: Option<String>,
}

impl DropFilter {
    pub fn with_mood(mood: Option<&str>) -> Self {
        Self {
            mood: normalize_mood(mood),
        }
    }

    pub fn matches(&self, drop: &MusicDrop) -> bool {
        match &self.mood {
            Some(mood) => drop.mood == *mood,
            None => true,
        }
    }
}
