//! Store selection.

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use touchline_core::constants::DEFAULT_COLLECTIONS;
use touchline_core::error::Result;
use touchline_core::traits::PersistentStore;

use crate::file::DEFAULT_AUTO_SAVE_THRESHOLD;
use crate::{FileStore, MemoryStore};

/// Which store to open and with which collections.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Snapshot file; `None` keeps everything in memory.
    pub path: Option<PathBuf>,
    /// Collections created on open.
    pub collections: Vec<String>,
    /// Pending writes tolerated before the file store saves.
    pub auto_save_threshold: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: None,
            collections: DEFAULT_COLLECTIONS.iter().map(|c| c.to_string()).collect(),
            auto_save_threshold: DEFAULT_AUTO_SAVE_THRESHOLD,
        }
    }
}

impl StoreConfig {
    /// In-memory store with the default collections.
    pub fn memory() -> Self {
        Self::default()
    }

    /// File-backed store at `path`.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::default()
        }
    }

    /// Opens the configured store.
    pub async fn open(&self) -> Result<Arc<dyn PersistentStore>> {
        let memory = MemoryStore::with_collections(self.collections.iter().cloned());
        match &self.path {
            Some(path) => {
                let store = FileStore::open(path, memory, self.auto_save_threshold).await?;
                info!(path = ?path, documents = store.len(), "Opened file store");
                Ok(Arc::new(store))
            }
            None => {
                info!("Using in-memory store");
                Ok(Arc::new(memory))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use touchline_core::types::{CacheCategory, StoreRecord};

    #[tokio::test]
    async fn test_open_memory() {
        let store = StoreConfig::memory().open().await.unwrap();
        let counts = store.collection_counts().await.unwrap();
        assert_eq!(counts.len(), DEFAULT_COLLECTIONS.len());
    }

    #[tokio::test]
    async fn test_open_file_persists() {
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig::file(dir.path().join("cache.tchl"));

        let store = config.open().await.unwrap();
        store
            .upsert(CacheCategory::Standings, StoreRecord::new("s1", "standings"))
            .await
            .unwrap();
        drop(store);

        let reopened = config.open().await.unwrap();
        let counts = reopened.collection_counts().await.unwrap();
        assert!(counts.contains(&("epl_teams".to_string(), 1)));
    }
}
