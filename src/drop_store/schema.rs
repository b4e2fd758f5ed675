//! SQLite schema for the drops database.

use crate::sqlite_column;
use crate::sqlite_persistence::{Column, SqlType, Table, VersionedSchema};

// =============================================================================
// Version 1 - Drops
// =============================================================================

/// Coordinates are nullable so that records imported by other tools with a
/// missing location are skipped on read instead of failing the whole query.
const DROPS_TABLE_V1: Table = Table {
    name: "drops",
    columns: &[
        sqlite_column!("id", &SqlType::Text, is_primary_key = true),
        sqlite_column!("track_name", &SqlType::Text, non_null = true),
        sqlite_column!("artist_name", &SqlType::Text, non_null = true),
        sqlite_column!("cover_url", &SqlType::Text, non_null = true),
        sqlite_column!("preview_url", &SqlType::Text, non_null = true),
        sqlite_column!("user_text", &SqlType::Text, non_null = true),
        sqlite_column!("mood", &SqlType::Text, non_null = true),
        sqlite_column!("latitude", &SqlType::Real),
        sqlite_column!("longitude", &SqlType::Real),
        sqlite_column!(
            "like_count",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("0")
        ),
        sqlite_column!("created_at", &SqlType::Integer, non_null = true),
        sqlite_column!("owner_id", &SqlType::Text, non_null = true),
    ],
    indices: &[("idx_drops_mood", "mood")],
};

pub const DROPS_VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 1,
    tables: &[DROPS_TABLE_V1],
    migration: None,
}];
