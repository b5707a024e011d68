//! File-backed document store with persistence.
//!
//! Keeps documents in a [`MemoryStore`] and writes the whole store to a
//! snapshot file. Suitable for single-node deployments where cached data
//! should survive restarts.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use touchline_core::error::{Result, TouchlineError};
use touchline_core::traits::PersistentStore;
use touchline_core::types::{CacheCategory, QueryDescriptor, StoreRecord, StoredDocument};

use crate::memory::{StoreSnapshot, StoreStats};
use crate::MemoryStore;

/// File-backed document store.
///
/// # File Format
///
/// ```text
/// magic (4 bytes): "TCHL"
/// version (1 byte): 1
/// count (8 bytes): number of documents, little endian
/// snapshot (variable): JSON-serialized collections and documents
/// ```
pub struct FileStore {
    /// Path to the snapshot file
    path: PathBuf,
    /// In-memory storage
    memory: MemoryStore,
    /// Whether there are unsaved changes
    dirty: AtomicBool,
    /// Save after more than N unsaved writes
    auto_save_threshold: u64,
    /// Writes since last save
    writes_since_save: AtomicU64,
    /// Held for the whole of a save; there is one temp file per store.
    save_lock: Mutex<()>,
}

/// File format magic bytes
const MAGIC: &[u8; 4] = b"TCHL";
/// Current file format version
const VERSION: u8 = 1;
/// Magic + version + count
const HEADER_LEN: usize = 13;
/// Default threshold: save after every write.
pub const DEFAULT_AUTO_SAVE_THRESHOLD: u64 = 0;

impl FileStore {
    /// Opens a store at `path` with the default dashboard collections.
    ///
    /// An existing file is loaded; otherwise the file is created on the
    /// first save.
    pub async fn new(path: impl AsRef<Path>) -> Result<Self> {
        Self::open(path, MemoryStore::new(), DEFAULT_AUTO_SAVE_THRESHOLD).await
    }

    /// Opens a store that saves once more than `threshold` writes are pending.
    pub async fn with_auto_save(path: impl AsRef<Path>, threshold: u64) -> Result<Self> {
        Self::open(path, MemoryStore::new(), threshold).await
    }

    /// Opens a store over a preconfigured memory store.
    pub async fn open(path: impl AsRef<Path>, memory: MemoryStore, threshold: u64) -> Result<Self> {
        let store = Self {
            path: path.as_ref().to_path_buf(),
            memory,
            dirty: AtomicBool::new(false),
            auto_save_threshold: threshold,
            writes_since_save: AtomicU64::new(0),
            save_lock: Mutex::new(()),
        };

        if store.path.exists() {
            store.load().await?;
        }

        Ok(store)
    }

    #[instrument(skip(self), fields(path = ?self.path))]
    async fn load(&self) -> Result<()> {
        let mut file = fs::File::open(&self.path).await.map_err(|e| {
            TouchlineError::IoError(std::io::Error::new(
                e.kind(),
                format!("Failed to open store file: {}", e),
            ))
        })?;

        let mut contents = Vec::new();
        file.read_to_end(&mut contents).await?;

        if contents.len() < HEADER_LEN {
            return Err(TouchlineError::Snapshot("File too short".into()));
        }

        if &contents[0..4] != MAGIC {
            return Err(TouchlineError::Snapshot("Invalid magic bytes".into()));
        }

        let version = contents[4];
        if version != VERSION {
            return Err(TouchlineError::VersionMismatch {
                expected: VERSION,
                actual: version,
            });
        }

        let mut count_bytes = [0u8; 8];
        count_bytes.copy_from_slice(&contents[5..HEADER_LEN]);
        let count = u64::from_le_bytes(count_bytes);
        info!(count, "Loading documents from file");

        if contents.len() > HEADER_LEN {
            let snapshot: StoreSnapshot = serde_json::from_slice(&contents[HEADER_LEN..])
                .map_err(|e| TouchlineError::Snapshot(e.to_string()))?;
            if snapshot.documents.len() as u64 != count {
                return Err(TouchlineError::Snapshot(format!(
                    "header says {} documents, body has {}",
                    count,
                    snapshot.documents.len()
                )));
            }
            self.memory.import(snapshot)?;
        }

        self.dirty.store(false, Ordering::SeqCst);
        debug!("Store loaded successfully");
        Ok(())
    }

    /// Writes the whole store to disk atomically.
    #[instrument(skip(self), fields(path = ?self.path))]
    pub async fn save(&self) -> Result<()> {
        let _guard = self.save_lock.lock().await;
        // Writes landing after this point mark the store dirty again.
        self.dirty.store(false, Ordering::SeqCst);
        self.writes_since_save.store(0, Ordering::SeqCst);
        let snapshot = self.memory.snapshot();
        let count = snapshot.documents.len() as u64;

        info!(count, "Saving store to file");

        let result = self.write_snapshot(&snapshot, count).await;
        if result.is_err() {
            self.dirty.store(true, Ordering::SeqCst);
        }
        result
    }

    async fn write_snapshot(&self, snapshot: &StoreSnapshot, count: u64) -> Result<()> {
        let serialized =
            serde_json::to_vec(snapshot).map_err(|e| TouchlineError::Snapshot(e.to_string()))?;

        let mut contents = Vec::with_capacity(HEADER_LEN + serialized.len());
        contents.extend_from_slice(MAGIC);
        contents.push(VERSION);
        contents.extend_from_slice(&count.to_le_bytes());
        contents.extend_from_slice(&serialized);

        // write to temp, then rename
        let temp_path = self.path.with_extension("tmp");
        let mut file = fs::File::create(&temp_path).await?;
        file.write_all(&contents).await?;
        file.sync_all().await?;

        fs::rename(&temp_path, &self.path).await?;

        debug!("Store saved successfully");
        Ok(())
    }

    /// Checks if there are unsaved changes.
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::SeqCst)
    }

    /// Saves if there are unsaved changes.
    pub async fn flush(&self) -> Result<()> {
        if self.is_dirty() {
            self.save().await?;
        }
        Ok(())
    }

    /// Returns the file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the underlying memory store.
    pub fn memory(&self) -> &MemoryStore {
        &self.memory
    }

    /// Returns operation counters.
    pub fn stats(&self) -> StoreStats {
        self.memory.stats()
    }

    /// Returns the number of documents.
    pub fn len(&self) -> usize {
        self.memory.len()
    }

    /// Returns true if empty.
    pub fn is_empty(&self) -> bool {
        self.memory.is_empty()
    }

    async fn maybe_auto_save(&self) -> Result<()> {
        let writes = self.writes_since_save.fetch_add(1, Ordering::SeqCst);
        if writes >= self.auto_save_threshold {
            self.save()
                .await
                .map_err(|e| TouchlineError::Persistence(e.to_string()))?;
        }
        Ok(())
    }
}

impl Drop for FileStore {
    fn drop(&mut self) {
        if self.is_dirty() {
            warn!(path = ?self.path, "FileStore dropped with unsaved changes");
        }
    }
}

#[async_trait]
impl PersistentStore for FileStore {
    async fn query(&self, query: &QueryDescriptor) -> Result<Vec<StoredDocument>> {
        self.memory.query(query).await
    }

    async fn upsert(&self, category: CacheCategory, record: StoreRecord) -> Result<()> {
        self.upsert_into(category.collection(), record).await
    }

    async fn upsert_into(&self, collection: &str, record: StoreRecord) -> Result<()> {
        self.memory.upsert_into(collection, record).await?;
        self.dirty.store(true, Ordering::SeqCst);
        self.maybe_auto_save().await
    }

    async fn collection_counts(&self) -> Result<Vec<(String, u64)>> {
        self.memory.collection_counts().await
    }
}
