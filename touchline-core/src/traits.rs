//! Collaborator interfaces for the cache layer.
//!
//! The cache only talks to these traits, so stores, sources and notifiers
//! can be swapped (and mocked in tests).

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{
    CacheCategory, MatchAnalysis, MatchList, MatchWindow, QueryDescriptor, Standings,
    StoreRecord, StoredDocument, TeamRecord,
};

// ═══════════════════════════════════════════════════════════════════════════════
// PERSISTENT STORE TRAIT
// ═══════════════════════════════════════════════════════════════════════════════

/// Durable document store with approximate text lookup.
///
/// Implementations might use:
/// - In-memory collections (for testing/development)
/// - A snapshot file (single-node deployments)
/// - A vector database
#[async_trait]
pub trait PersistentStore: Send + Sync {
    /// Returns up to `top_k` documents closest to the query text, best first.
    ///
    /// An empty collection yields an empty list. An unknown collection is a
    /// configuration error.
    async fn query(&self, query: &QueryDescriptor) -> Result<Vec<StoredDocument>>;

    /// Inserts or replaces a document in the category's collection.
    async fn upsert(&self, category: CacheCategory, record: StoreRecord) -> Result<()>;

    /// Inserts or replaces a document in a named collection.
    async fn upsert_into(&self, collection: &str, record: StoreRecord) -> Result<()>;

    /// Number of documents per collection.
    async fn collection_counts(&self) -> Result<Vec<(String, u64)>>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// REMOTE SOURCE TRAIT
// ═══════════════════════════════════════════════════════════════════════════════

/// Rate-limited upstream data provider.
///
/// Implementations apply their own spacing and retry policy. `Ok(None)` means
/// the upstream has nothing for the request; `Err` is a failed fetch.
#[async_trait]
pub trait RemoteSource: Send + Sync {
    /// Current league table.
    async fn get_standings(&self) -> Result<Option<Standings>>;

    /// Fixtures inside a date window around today.
    async fn get_matches(&self, window: MatchWindow) -> Result<Option<MatchList>>;

    /// One team's league record, looked up by (full) name.
    async fn get_team(&self, name: &str) -> Result<Option<TeamRecord>>;

    /// Analysis of a single match.
    async fn analyze(&self, match_id: u64) -> Result<Option<MatchAnalysis>>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// NOTIFIER TRAIT
// ═══════════════════════════════════════════════════════════════════════════════

/// Topic-based publisher for fresh data.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Publishes `value` on `topic` under `key`.
    async fn publish(&self, topic: &str, key: &str, value: &serde_json::Value) -> Result<()>;
}
