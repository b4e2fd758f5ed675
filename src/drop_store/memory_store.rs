use super::document::DropDocument;
use super::models::{DropFilter, MusicDrop, NewDrop};
use super::DropStore;
use anyhow::{anyhow, Result};
use chrono::Utc;
use std::sync::RwLock;
use tracing::{info, warn};

/// Volatile drop store used in local mode.
#[derive(Default)]
pub struct InMemoryDropStore {
    drops: RwLock<Vec<MusicDrop>>,
}

impl InMemoryDropStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from exported documents, skipping the ones that cannot
    /// be turned into a drop.
    pub fn from_documents(documents: Vec<DropDocument>) -> Self {
        let total = documents.len();
        let drops: Vec<MusicDrop> = documents
            .into_iter()
            .filter_map(|doc| match doc.into_drop() {
                Ok(drop) => Some(drop),
                Err(err) => {
                    warn!("Skipping seed document: {}", err);
                    None
                }
            })
            .collect();
        info!("Seeded in-memory store with {}/{} drops", drops.len(), total);
        Self {
            drops: RwLock::new(drops),
        }
    }
}

impl DropStore for InMemoryDropStore {
    fn insert_drop(&self, new_drop: NewDrop) -> Result<MusicDrop> {
        let drop = new_drop.into_drop(uuid::Uuid::new_v4().to_string(), Utc::now());
        self.drops
            .write()
            .map_err(|_| anyhow!("Drop store lock poisoned"))?
            .push(drop.clone());
        Ok(drop)
    }

    fn get_drop(&self, id: &str) -> Result<Option<MusicDrop>> {
        let drops = self
            .drops
            .read()
            .map_err(|_| anyhow!("Drop store lock poisoned"))?;
        Ok(drops.iter().find(|d| d.id == id).cloned())
    }

    fn query_drops(&self, filter: &DropFilter, limit: usize) -> Result<Vec<MusicDrop>> {
        let drops = self
            .drops
            .read()
            .map_err(|_| anyhow!("Drop store lock poisoned"))?;
        Ok(drops
            .iter()
            .filter(|d| filter.matches(d))
            .take(limit)
            .cloned()
            .collect())
    }

    fn count_drops(&self) -> Result<usize> {
        Ok(self
            .drops
            .read()
            .map_err(|_| anyhow!("Drop store lock poisoned"))?
            .len())
    }
}
