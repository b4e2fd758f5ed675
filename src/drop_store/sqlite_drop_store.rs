use super::models::{DropFilter, GeoPoint, MusicDrop, NewDrop};
use super::schema::DROPS_VERSIONED_SCHEMAS;
use super::DropStore;
use crate::sqlite_persistence::read_schema_version;
use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

const DROP_COLUMNS: &str = "id, track_name, artist_name, cover_url, preview_url, user_text, \
     mood, latitude, longitude, like_count, created_at, owner_id";

pub struct SqliteDropStore {
    conn: Arc<Mutex<Connection>>,
}

/// A row as stored, before its location has been checked.
struct DropRow {
    drop_id: String,
    track_name: String,
    artist_name: String,
    cover_url: String,
    preview_url: String,
    user_text: String,
    mood: String,
    latitude: Option<f64>,
    longitude: Option<f64>,
    like_count: i64,
    created_at_ms: i64,
    owner_id: String,
}

impl DropRow {
    fn into_drop(self) -> Option<MusicDrop> {
        let location = match (self.latitude, self.longitude) {
            (Some(lat), Some(lng)) => match GeoPoint::new(lat, lng) {
                Ok(point) => point,
                Err(err) => {
                    warn!("Skipping drop {} with invalid location: {}", self.drop_id, err);
                    return None;
                }
            },
            _ => {
                warn!("Skipping drop {} without location", self.drop_id);
                return None;
            }
        };
        let created_at = DateTime::<Utc>::from_timestamp_millis(self.created_at_ms)
            .unwrap_or(DateTime::UNIX_EPOCH);

        Some(MusicDrop {
            id: self.drop_id,
            track_name: self.track_name,
            artist_name: self.artist_name,
            cover_url: self.cover_url,
            preview_url: self.preview_url,
            user_text: self.user_text,
            mood: self.mood,
            location,
            like_count: self.like_count,
            created_at,
            owner_id: self.owner_id,
        })
    }
}

impl SqliteDropStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let path = db_path.as_ref();
        let is_new_db = !path.exists();

        let conn = Connection::open(path).context("Failed to open drops database")?;
        let latest_schema = DROPS_VERSIONED_SCHEMAS
            .last()
            .context("No drops schema defined")?;

        if is_new_db {
            info!("Creating new drops database at {:?}", path);
            latest_schema.create(&conn)?;
        } else {
            let db_version = read_schema_version(&conn)?;
            if db_version < 1 {
                bail!(
                    "Drops database version {} is invalid (expected >= 1)",
                    db_version
                );
            }
            let schema = DROPS_VERSIONED_SCHEMAS
                .iter()
                .find(|s| s.version as i64 == db_version)
                .with_context(|| format!("Unknown drops database version {}", db_version))?;
            schema.validate(&conn).with_context(|| {
                format!(
                    "Drops database schema validation failed for version {}",
                    db_version
                )
            })?;
        }

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow::anyhow!("Drops database lock poisoned"))
    }

    fn read_row(row: &rusqlite::Row) -> rusqlite::Result<DropRow> {
        Ok(DropRow {
            drop_id: row.get("id")?,
            track_name: row.get("track_name")?,
            artist_name: row.get("artist_name")?,
            cover_url: row.get("cover_url")?,
            preview_url: row.get("preview_url")?,
            user_text: row.get("user_text")?,
            mood: row.get("mood")?,
            latitude: row.get("latitude")?,
            longitude: row.get("longitude")?,
            like_count: row.get("like_count")?,
            created_at_ms: row.get("created_at")?,
            owner_id: row.get("owner_id")?,
        })
    }
}

impl DropStore for SqliteDropStore {
    fn insert_drop(&self, new_drop: NewDrop) -> Result<MusicDrop> {
        let drop = new_drop.into_drop(uuid::Uuid::new_v4().to_string(), Utc::now());
        let conn = self.lock()?;
        conn.execute(
            &format!(
                "INSERT INTO drops ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                DROP_COLUMNS
            ),
            params![
                drop.id,
                drop.track_name,
                drop.artist_name,
                drop.cover_url,
                drop.preview_url,
                drop.user_text,
                drop.mood,
                drop.location.latitude(),
                drop.location.longitude(),
                drop.like_count,
                drop.created_at.timestamp_millis(),
                drop.owner_id,
            ],
        )
        .context("Failed to insert drop")?;
        Ok(drop)
    }

    fn get_drop(&self, id: &str) -> Result<Option<MusicDrop>> {
        let conn = self.lock()?;
        let row = conn
            .query_row(
                &format!("SELECT {} FROM drops WHERE id = ?1", DROP_COLUMNS),
                params![id],
                Self::read_row,
            )
            .optional()?;
        Ok(row.and_then(DropRow::into_drop))
    }

    fn query_drops(&self, filter: &DropFilter, limit: usize) -> Result<Vec<MusicDrop>> {
        let conn = self.lock()?;
        let rows: Vec<DropRow> = match &filter.mood {
            Some(mood) => {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {} FROM drops WHERE mood = ?1 ORDER BY rowid LIMIT ?2",
                    DROP_COLUMNS
                ))?;
                let rows = stmt
                    .query_map(params![mood, limit as i64], Self::read_row)?
                    .collect::<Result<_, _>>()?;
                rows
            }
            None => {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {} FROM drops ORDER BY rowid LIMIT ?1",
                    DROP_COLUMNS
                ))?;
                let rows = stmt
                    .query_map(params![limit as i64], Self::read_row)?
                    .collect::<Result<_, _>>()?;
                rows
            }
        };
        Ok(rows.into_iter().filter_map(DropRow::into_drop).collect())
    }

    fn count_drops(&self) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM drops", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drop_store::CreateDropBody;
    use tempfile::TempDir;

    struct TestStore {
        store: SqliteDropStore,
        db_path: std::path::PathBuf,
        _temp_dir: TempDir,
    }

    fn create_test_store() -> TestStore {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("drops.db");
        let store = SqliteDropStore::new(&db_path).unwrap();
        TestStore {
            store,
            db_path,
            _temp_dir: temp_dir,
        }
    }

    fn new_drop(track: &str, mood: &str, lat: f64, lng: f64) -> NewDrop {
        NewDrop::from_body(
            CreateDropBody {
                track_name: Some(track.to_string()),
                mood: Some(mood.to_string()),
                latitude: Some(lat),
                longitude: Some(lng),
                ..Default::default()
            },
            None,
        )
        .unwrap()
    }

    #[test]
    fn insert_and_get_drop() {
        let test = create_test_store();
        let store = &test.store;

        let inserted = store
            .insert_drop(new_drop("Spring Day", "sad", 37.56, 126.97))
            .unwrap();
        let fetched = store.get_drop(&inserted.id).unwrap().unwrap();

        assert_eq!(fetched.track_name, "Spring Day");
        assert_eq!(fetched.mood, "sad");
        assert_eq!(fetched.like_count, 0);
        assert_eq!(
            fetched.created_at.timestamp_millis(),
            inserted.created_at.timestamp_millis()
        );
        assert!(store.get_drop("missing").unwrap().is_none());
        assert_eq!(store.count_drops().unwrap(), 1);
    }

    #[test]
    fn query_filters_by_mood_and_caps_results() {
        let test = create_test_store();
        let store = &test.store;
        for i in 0..4 {
            store
                .insert_drop(new_drop(&format!("happy {}", i), "happy", 1.0, 1.0))
                .unwrap();
        }
        store.insert_drop(new_drop("blue", "sad", 1.0, 1.0)).unwrap();

        let all = store.query_drops(&DropFilter::default(), 100).unwrap();
        assert_eq!(all.len(), 5);

        let sad = store
            .query_drops(&DropFilter::with_mood(Some("SAD")), 100)
            .unwrap();
        assert_eq!(sad.len(), 1);
        assert_eq!(sad[0].track_name, "blue");

        let capped = store.query_drops(&DropFilter::default(), 2).unwrap();
        assert_eq!(capped.len(), 2);
        assert_eq!(capped[0].track_name, "happy 0");
    }

    #[test]
    fn rows_without_location_are_skipped() {
        let test = create_test_store();
        test.store
            .insert_drop(new_drop("ok", "calm", 1.0, 1.0))
            .unwrap();
        {
            let conn = test.store.lock().unwrap();
            conn.execute(
                "INSERT INTO drops (id, track_name, artist_name, cover_url, preview_url, user_text, mood, latitude, longitude, created_at, owner_id)
                 VALUES ('broken', 'x', 'y', '', '', '', 'calm', NULL, 10.0, 0, 'anonymous')",
                [],
            )
            .unwrap();
        }

        let drops = test.store.query_drops(&DropFilter::default(), 10).unwrap();
        assert_eq!(drops.len(), 1);
        assert_eq!(drops[0].track_name, "ok");
        assert!(test.store.get_drop("broken").unwrap().is_none());
    }

    #[test]
    fn reopens_existing_database() {
        let test = create_test_store();
        test.store
            .insert_drop(new_drop("kept", "calm", 1.0, 1.0))
            .unwrap();

        let reopened = SqliteDropStore::new(&test.db_path).unwrap();
        assert_eq!(reopened.count_drops().unwrap(), 1);
    }

    #[test]
    fn rejects_database_with_wrong_schema() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("other.db");
        {
            let conn = Connection::open(&db_path).unwrap();
            conn.execute("CREATE TABLE drops (id TEXT PRIMARY KEY)", [])
                .unwrap();
            conn.execute(
                &format!(
                    "PRAGMA user_version = {}",
                    crate::sqlite_persistence::BASE_DB_VERSION + 1
                ),
                [],
            )
            .unwrap();
        }

        assert!(SqliteDropStore::new(&db_path).is_err());
    }
}
