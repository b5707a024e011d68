//! In-memory document store.
//!
//! Thread-safe collections with approximate text lookup, suitable for
//! development, testing, and single-process deployments.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use touchline_core::constants::DEFAULT_COLLECTIONS;
use touchline_core::error::{Result, TouchlineError};
use touchline_core::traits::PersistentStore;
use touchline_core::types::{CacheCategory, QueryDescriptor, StoreRecord, StoredDocument};

use crate::similarity::TermVector;

/// A stored document with its lookup vectors.
#[derive(Clone, Debug)]
struct Entry {
    record: StoreRecord,
    /// Full text, used for free-text search.
    vector: TermVector,
    /// First document only. Envelope lookups rank on this so snapshots of
    /// one key score the same and `seq` picks the newest.
    key: TermVector,
    /// Insertion order; later writes win ties.
    seq: u64,
}

/// Operation counters.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStats {
    /// Documents written (new or replaced)
    pub upserts: u64,
    /// Writes that replaced an existing id
    pub replacements: u64,
    /// Queries served
    pub queries: u64,
}

/// One document in an exported snapshot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SnapshotEntry {
    /// Collection the document belongs to.
    pub collection: String,
    /// Insertion order.
    pub seq: u64,
    /// The stored record.
    pub record: StoreRecord,
}

/// Full store contents, used for persistence.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    /// All known collections, including empty ones.
    pub collections: Vec<String>,
    /// Documents ordered by insertion.
    pub documents: Vec<SnapshotEntry>,
}

/// In-memory document store.
///
/// Collections must exist before they are written or queried; the default
/// constructor creates the dashboard collections.
///
/// # Lookup
///
/// Queries rank every document of the collection by cosine similarity of
/// lowercase word counts. The nearest document is always returned when the
/// collection is non-empty, so callers must validate what they get back.
#[derive(Debug)]
pub struct MemoryStore {
    /// collection → id → entry
    collections: DashMap<String, HashMap<String, Entry>>,
    /// Next insertion sequence number
    next_seq: AtomicU64,
    stats: RwLock<StoreStats>,
}

impl MemoryStore {
    /// Creates a store with the default dashboard collections.
    pub fn new() -> Self {
        Self::with_collections(DEFAULT_COLLECTIONS)
    }

    /// Creates a store with the given collections.
    pub fn with_collections<I, S>(collections: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let store = Self {
            collections: DashMap::new(),
            next_seq: AtomicU64::new(1),
            stats: RwLock::new(StoreStats::default()),
        };
        for name in collections {
            store.create_collection(name);
        }
        store
    }

    /// Creates a collection if it does not exist yet.
    pub fn create_collection(&self, name: impl Into<String>) {
        self.collections.entry(name.into()).or_default();
    }

    /// Returns true if the collection exists.
    pub fn has_collection(&self, name: &str) -> bool {
        self.collections.contains_key(name)
    }

    /// Returns the operation counters.
    pub fn stats(&self) -> StoreStats {
        self.stats.read().clone()
    }

    /// Total number of documents across collections.
    pub fn len(&self) -> usize {
        self.collections.iter().map(|c| c.value().len()).sum()
    }

    /// Returns true if no collection holds a document.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes every document, keeping the collections.
    pub fn clear(&self) {
        for mut collection in self.collections.iter_mut() {
            collection.value_mut().clear();
        }
        self.next_seq.store(1, Ordering::SeqCst);
        *self.stats.write() = StoreStats::default();
    }

    /// Exports all collections and documents.
    pub fn snapshot(&self) -> StoreSnapshot {
        let mut collections: Vec<String> =
            self.collections.iter().map(|c| c.key().clone()).collect();
        collections.sort();

        let mut documents: Vec<SnapshotEntry> = self
            .collections
            .iter()
            .flat_map(|c| {
                let name = c.key().clone();
                c.value()
                    .values()
                    .map(|e| SnapshotEntry {
                        collection: name.clone(),
                        seq: e.seq,
                        record: e.record.clone(),
                    })
                    .collect::<Vec<_>>()
            })
            .collect();
        documents.sort_by_key(|d| d.seq);

        StoreSnapshot {
            collections,
            documents,
        }
    }

    /// Restores documents from a snapshot, keeping their insertion order.
    ///
    /// Collections named in the snapshot are created as needed.
    pub fn import(&self, snapshot: StoreSnapshot) -> Result<usize> {
        for name in snapshot.collections {
            self.create_collection(name);
        }

        let mut imported = 0;
        for doc in snapshot.documents {
            if doc.record.id.trim().is_empty() {
                return Err(TouchlineError::Snapshot(format!(
                    "document without id in '{}'",
                    doc.collection
                )));
            }

            let current = self.next_seq.load(Ordering::SeqCst);
            if doc.seq >= current {
                self.next_seq.store(doc.seq + 1, Ordering::SeqCst);
            }

            let entry = Entry {
                vector: TermVector::from_text(&doc.record.text()),
                key: Self::key_vector(&doc.record),
                record: doc.record,
                seq: doc.seq,
            };
            self.collections
                .entry(doc.collection)
                .or_default()
                .insert(entry.record.id.clone(), entry);
            imported += 1;
        }

        Ok(imported)
    }

    fn key_vector(record: &StoreRecord) -> TermVector {
        TermVector::from_text(record.documents.first().map_or("", String::as_str))
    }

    fn unknown_collection(name: &str) -> TouchlineError {
        TouchlineError::Configuration(format!("unknown collection '{}'", name))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PersistentStore for MemoryStore {
    /// Ranks the collection against the query text, best first.
    #[instrument(skip(self, query), fields(collection = %query.collection, top_k = query.top_k))]
    async fn query(&self, query: &QueryDescriptor) -> Result<Vec<StoredDocument>> {
        let collection = self
            .collections
            .get(&query.collection)
            .ok_or_else(|| Self::unknown_collection(&query.collection))?;

        let probe = TermVector::from_text(&query.text);
        let mut ranked: Vec<(f64, &Entry)> = collection
            .values()
            .filter(|e| {
                query
                    .has_key
                    .as_ref()
                    .map_or(true, |k| e.record.metadata.contains_key(k))
            })
            .map(|e| {
                let target = if query.has_key.is_some() { &e.key } else { &e.vector };
                (probe.cosine(target), e)
            })
            .collect();
        ranked.sort_by(|(sa, a), (sb, b)| sb.total_cmp(sa).then(b.seq.cmp(&a.seq)));

        let results: Vec<StoredDocument> = ranked
            .into_iter()
            .take(query.top_k)
            .map(|(score, e)| StoredDocument {
                id: e.record.id.clone(),
                document: e.record.text(),
                metadata: e.record.metadata.clone(),
                score,
            })
            .collect();

        self.stats.write().queries += 1;
        debug!(count = results.len(), "Store query served");
        Ok(results)
    }

    async fn upsert(&self, category: CacheCategory, record: StoreRecord) -> Result<()> {
        self.upsert_into(category.collection(), record).await
    }

    #[instrument(skip(self, record), fields(id = %record.id))]
    async fn upsert_into(&self, collection: &str, record: StoreRecord) -> Result<()> {
        if record.id.trim().is_empty() {
            return Err(TouchlineError::ValidationError(
                "document id cannot be empty".into(),
            ));
        }

        let mut docs = self
            .collections
            .get_mut(collection)
            .ok_or_else(|| Self::unknown_collection(collection))?;

        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        let entry = Entry {
            vector: TermVector::from_text(&record.text()),
            key: Self::key_vector(&record),
            record,
            seq,
        };
        let replaced = docs.insert(entry.record.id.clone(), entry).is_some();
        drop(docs);

        let mut stats = self.stats.write();
        stats.upserts += 1;
        if replaced {
            stats.replacements += 1;
        }

        debug!(collection, seq, replaced, "Document stored");
        Ok(())
    }

    async fn collection_counts(&self) -> Result<Vec<(String, u64)>> {
        let mut counts: Vec<(String, u64)> = self
            .collections
            .iter()
            .map(|c| (c.key().clone(), c.value().len() as u64))
            .collect();
        counts.sort();
        Ok(counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, text: &str) -> StoreRecord {
        StoreRecord::new(id, text).with_meta("type", "test")
    }

    #[tokio::test]
    async fn test_upsert_and_query() {
        let store = MemoryStore::new();
        store
            .upsert(CacheCategory::Standings, record("s1", "Premier League standings table"))
            .await
            .unwrap();

        let docs = store
            .query(&QueryDescriptor::search("epl_teams", "premier league table", 1))
            .await
            .unwrap();

        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].id, "s1");
        assert_eq!(docs[0].meta_str("type"), Some("test"));
        assert!(docs[0].score > 0.5);
    }

    #[tokio::test]
    async fn test_empty_collection_returns_nothing() {
        let store = MemoryStore::new();
        let docs = store
            .query(&QueryDescriptor::search("match_reports", "recent matches", 1))
            .await
            .unwrap();
        assert!(docs.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_collection_is_configuration_error() {
        let store = MemoryStore::new();

        let err = store
            .query(&QueryDescriptor::search("fixtures", "anything", 3))
            .await
            .unwrap_err();
        assert!(err.is_configuration_error());

        let err = store
            .upsert_into("fixtures", record("x", "y"))
            .await
            .unwrap_err();
        assert!(err.is_configuration_error());
    }

    #[tokio::test]
    async fn test_envelope_lookup_skips_plain_documents() {
        let store = MemoryStore::new();
        store
            .upsert(
                CacheCategory::Standings,
                record("s1", "Premier League standings").with_meta("standings_data", "{}"),
            )
            .await
            .unwrap();
        store
            .upsert(CacheCategory::TeamData, record("team_57", "Arsenal FC league record"))
            .await
            .unwrap();

        let docs = store
            .query(&QueryDescriptor::probe(CacheCategory::Standings, "Arsenal FC league record"))
            .await
            .unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].id, "s1");

        let docs = store
            .query(&QueryDescriptor::probe(CacheCategory::Analysis, "anything"))
            .await
            .unwrap();
        assert!(docs.is_empty());
    }

    #[tokio::test]
    async fn test_envelope_lookup_ranks_on_key_text() {
        let store = MemoryStore::new();
        let snapshot = |id: &str, table: &str| {
            record(id, "Premier League standings table")
                .with_document(table)
                .with_meta("standings_data", "{}")
        };
        store
            .upsert(CacheCategory::Standings, snapshot("s_old", "1. Liverpool FC 64 points"))
            .await
            .unwrap();
        let table = "1. Liverpool FC 67 points\n2. Arsenal FC 64 points";
        store
            .upsert(CacheCategory::Standings, snapshot("s_new", table))
            .await
            .unwrap();

        let docs = store
            .query(&QueryDescriptor::probe(
                CacheCategory::Standings,
                "Premier League standings table",
            ))
            .await
            .unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].id, "s_new");
        assert!((docs[0].score - 1.0).abs() < 1e-9);
        assert!(docs[0].document.contains("Arsenal FC 64 points"));

        // Free-text search still sees the detail documents.
        let docs = store
            .query(&QueryDescriptor::search("epl_teams", "Arsenal", 1))
            .await
            .unwrap();
        assert_eq!(docs[0].id, "s_new");
    }

    #[tokio::test]
    async fn test_nearest_document_always_returned() {
        let store = MemoryStore::new();
        store
            .upsert(CacheCategory::Analysis, record("a1", "Arsenal 2 - 0 Chelsea"))
            .await
            .unwrap();

        let docs = store
            .query(&QueryDescriptor::search("tactical_analysis", "completely unrelated", 1))
            .await
            .unwrap();

        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].score, 0.0);
    }

    #[tokio::test]
    async fn test_ranking_prefers_closer_text() {
        let store = MemoryStore::new();
        store
            .upsert_into("team_stats", record("t1", "Liverpool FC position 1 points 70"))
            .await
            .unwrap();
        store
            .upsert_into("team_stats", record("t2", "Arsenal FC position 2 points 68"))
            .await
            .unwrap();

        let docs = store
            .query(&QueryDescriptor::search("team_stats", "arsenal", 2))
            .await
            .unwrap();

        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].id, "t2");
        assert!(docs[0].score > docs[1].score);
    }

    #[tokio::test]
    async fn test_ties_go_to_latest_write() {
        let store = MemoryStore::new();
        store
            .upsert(CacheCategory::Standings, record("s_old", "Premier League standings"))
            .await
            .unwrap();
        store
            .upsert(CacheCategory::Standings, record("s_new", "Premier League standings"))
            .await
            .unwrap();

        let docs = store
            .query(&QueryDescriptor::search("epl_teams", "Premier League standings", 1))
            .await
            .unwrap();

        assert_eq!(docs[0].id, "s_new");
    }

    #[tokio::test]
    async fn test_upsert_replaces_same_id() {
        let store = MemoryStore::new();
        store
            .upsert(CacheCategory::Matches, record("m", "first"))
            .await
            .unwrap();
        store
            .upsert(CacheCategory::Matches, record("m", "second"))
            .await
            .unwrap();

        assert_eq!(store.len(), 1);
        let stats = store.stats();
        assert_eq!(stats.upserts, 2);
        assert_eq!(stats.replacements, 1);

        let docs = store
            .query(&QueryDescriptor::search("match_reports", "second", 1))
            .await
            .unwrap();
        assert_eq!(docs[0].document, "second");
    }

    #[tokio::test]
    async fn test_team_data_shares_team_collection() {
        let store = MemoryStore::new();
        store
            .upsert(CacheCategory::TeamData, record("team_66", "Manchester United FC"))
            .await
            .unwrap();

        let counts = store.collection_counts().await.unwrap();
        let epl = counts.iter().find(|(c, _)| c == "epl_teams").unwrap();
        assert_eq!(epl.1, 1);
        assert_eq!(counts.len(), DEFAULT_COLLECTIONS.len());
    }

    #[tokio::test]
    async fn test_empty_id_rejected() {
        let store = MemoryStore::new();
        let result = store.upsert(CacheCategory::Standings, record("  ", "x")).await;
        assert!(matches!(result, Err(TouchlineError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_snapshot_import_preserves_order() {
        let store1 = MemoryStore::new();
        store1
            .upsert(CacheCategory::Standings, record("a", "Premier League standings"))
            .await
            .unwrap();
        store1
            .upsert(CacheCategory::Standings, record("b", "Premier League standings"))
            .await
            .unwrap();

        let snapshot = store1.snapshot();
        assert_eq!(snapshot.documents.len(), 2);
        assert_eq!(snapshot.collections.len(), DEFAULT_COLLECTIONS.len());

        let store2 = MemoryStore::with_collections(Vec::<String>::new());
        assert_eq!(store2.import(snapshot).unwrap(), 2);
        assert!(store2.has_collection("focus_team"));

        let docs = store2
            .query(&QueryDescriptor::search("epl_teams", "standings", 1))
            .await
            .unwrap();
        assert_eq!(docs[0].id, "b");

        // new writes continue after the imported sequence
        store2
            .upsert(CacheCategory::Standings, record("c", "Premier League standings"))
            .await
            .unwrap();
        let docs = store2
            .query(&QueryDescriptor::search("epl_teams", "standings", 1))
            .await
            .unwrap();
        assert_eq!(docs[0].id, "c");
    }

    #[tokio::test]
    async fn test_clear() {
        let store = MemoryStore::new();
        store
            .upsert(CacheCategory::Standings, record("a", "x"))
            .await
            .unwrap();
        store.clear();
        assert!(store.is_empty());
        assert!(store.has_collection("epl_teams"));
    }

    #[tokio::test]
    async fn test_concurrent_upserts() {
        use std::sync::Arc;
        use tokio::task::JoinSet;

        let store = Arc::new(MemoryStore::new());
        let mut tasks = JoinSet::new();

        for i in 0..100 {
            let s = store.clone();
            tasks.spawn(async move {
                s.upsert(CacheCategory::Matches, record(&format!("m{}", i), "match report"))
                    .await
                    .unwrap()
            });
        }

        while let Some(result) = tasks.join_next().await {
            result.unwrap();
        }

        assert_eq!(store.len(), 100);
    }
}
