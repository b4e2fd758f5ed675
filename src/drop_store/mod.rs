mod document;
mod memory_store;
mod models;
mod schema;
mod sqlite_drop_store;

pub use document::{
    load_seed_documents, DocumentError, DocumentLocation, DocumentTimestamp, DropDocument,
};
pub use memory_store::InMemoryDropStore;
pub use models::*;
pub use schema::DROPS_VERSIONED_SCHEMAS;
pub use sqlite_drop_store::SqliteDropStore;

use anyhow::Result;

/// Persistence for music drops. Implementations are internally synchronized
/// and blocking; async callers go through `spawn_blocking`.
pub trait DropStore: Send + Sync {
    fn insert_drop(&self, new_drop: NewDrop) -> Result<MusicDrop>;
    fn get_drop(&self, id: &str) -> Result<Option<MusicDrop>>;

    /// Returns at most `limit` drops matching `filter`. Records whose stored
    /// location is unusable are skipped but still count towards the limit.
    fn query_drops(&self, filter: &DropFilter, limit: usize) -> Result<Vec<MusicDrop>>;

    fn count_drops(&self) -> Result<usize>;
}
