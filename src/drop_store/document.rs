//! Loose JSON shape of exported drop records, used to seed the in-memory
//! store. Exports from the old document database encode locations as
//! `{"_latitude", "_longitude"}` and timestamps as `{"_seconds", "_nanoseconds"}`.

use super::models::{
    non_blank, normalize_mood, GeoPoint, GeoPointError, MusicDrop, ANONYMOUS_OWNER,
    DEFAULT_ARTIST_NAME, DEFAULT_MOOD,
};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DocumentLocation {
    Exported {
        #[serde(rename = "_latitude")]
        latitude: f64,
        #[serde(rename = "_longitude")]
        longitude: f64,
    },
    Plain {
        latitude: f64,
        longitude: f64,
    },
}

impl DocumentLocation {
    pub fn to_geo_point(&self) -> Result<GeoPoint, GeoPointError> {
        match *self {
            DocumentLocation::Exported {
                latitude,
                longitude,
            }
            | DocumentLocation::Plain {
                latitude,
                longitude,
            } => GeoPoint::new(latitude, longitude),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DocumentTimestamp {
    Millis(i64),
    Exported {
        #[serde(rename = "_seconds")]
        seconds: i64,
        #[serde(rename = "_nanoseconds", default)]
        nanoseconds: u32,
    },
    Text(String),
}

impl DocumentTimestamp {
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            DocumentTimestamp::Millis(ms) => DateTime::from_timestamp_millis(*ms),
            DocumentTimestamp::Exported {
                seconds,
                nanoseconds,
            } => DateTime::from_timestamp(*seconds, *nanoseconds),
            DocumentTimestamp::Text(text) => DateTime::parse_from_rfc3339(text)
                .ok()
                .map(|dt| dt.with_timezone(&Utc)),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DropDocument {
    pub id: Option<String>,
    pub track_name: Option<String>,
    pub artist_name: Option<String>,
    pub cover_url: Option<String>,
    pub preview_url: Option<String>,
    pub user_text: Option<String>,
    pub mood: Option<String>,
    pub location: Option<DocumentLocation>,
    pub like_count: Option<i64>,
    #[serde(alias = "timestamp")]
    pub created_at: Option<DocumentTimestamp>,
    #[serde(alias = "uid")]
    pub owner_id: Option<String>,
}

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("document {0} has no track name")]
    MissingTrackName(String),
    #[error("document {0} has no location")]
    MissingLocation(String),
    #[error("document {id} has an invalid location: {source}")]
    InvalidLocation { id: String, source: GeoPointError },
}

impl DropDocument {
    pub fn into_drop(self) -> Result<MusicDrop, DocumentError> {
        let id = self
            .id
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let track_name = non_blank(self.track_name)
            .ok_or_else(|| DocumentError::MissingTrackName(id.clone()))?;
        let location = self
            .location
            .as_ref()
            .ok_or_else(|| DocumentError::MissingLocation(id.clone()))?
            .to_geo_point()
            .map_err(|source| DocumentError::InvalidLocation {
                id: id.clone(),
                source,
            })?;

        Ok(MusicDrop {
            id,
            track_name,
            artist_name: non_blank(self.artist_name)
                .unwrap_or_else(|| DEFAULT_ARTIST_NAME.to_string()),
            cover_url: self.cover_url.unwrap_or_default(),
            preview_url: self.preview_url.unwrap_or_default(),
            user_text: self.user_text.unwrap_or_default(),
            mood: normalize_mood(self.mood.as_deref()).unwrap_or_else(|| DEFAULT_MOOD.to_string()),
            location,
            like_count: self.like_count.unwrap_or(0),
            created_at: self
                .created_at
                .as_ref()
                .and_then(DocumentTimestamp::to_datetime)
                .unwrap_or(DateTime::UNIX_EPOCH),
            owner_id: non_blank(self.owner_id).unwrap_or_else(|| ANONYMOUS_OWNER.to_string()),
        })
    }
}

/// Reads a JSON array of drop documents from disk.
pub fn load_seed_documents<P: AsRef<Path>>(path: P) -> Result<Vec<DropDocument>> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read seed file: {:?}", path))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse seed file: {:?}", path))
}
