//! DTOs for API requests and responses.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use touchline_core::constants::{DEFAULT_DAYS_BACK, DEFAULT_DAYS_FORWARD};
use touchline_core::types::{MetadataValue, StoredDocument};

/// Query for match lists.
#[derive(Debug, Deserialize)]
pub struct MatchesQuery {
    /// Days to look back (default 7)
    #[serde(default = "default_days_back")]
    pub days_back: u32,
    /// Days to look forward (default 7)
    #[serde(default = "default_days_forward")]
    pub days_forward: u32,
}

fn default_days_back() -> u32 {
    DEFAULT_DAYS_BACK
}

fn default_days_forward() -> u32 {
    DEFAULT_DAYS_FORWARD
}

/// Query for free-text search.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    /// Collection to search
    pub collection: String,
    /// Search text
    pub q: String,
    /// Maximum results (default 5)
    pub n: Option<usize>,
}

/// Response for search.
#[derive(Debug, Serialize)]
pub struct SearchResponse {
    /// Collection searched
    pub collection: String,
    /// Matching documents, best first
    pub results: Vec<SearchHit>,
}

/// One search result.
#[derive(Debug, Serialize)]
pub struct SearchHit {
    /// Document id
    pub id: String,
    /// Document text
    pub document: String,
    /// Metadata without serialized payloads
    pub metadata: BTreeMap<String, MetadataValue>,
    /// Similarity score in [0, 1]
    pub score: f64,
}

impl From<StoredDocument> for SearchHit {
    fn from(doc: StoredDocument) -> Self {
        let mut metadata = doc.metadata;
        for category in touchline_core::CacheCategory::ALL {
            metadata.remove(category.envelope_key());
        }
        Self {
            id: doc.id,
            document: doc.document,
            metadata,
            score: doc.score,
        }
    }
}

/// Response for cache statistics.
#[derive(Debug, Serialize)]
pub struct CacheStatsResponse {
    /// Valid entries served from the store
    pub hits: u64,
    /// Lookups that went to the remote source
    pub misses: u64,
    /// Remote calls made
    pub api_calls: u64,
    /// Hits over lookups, e.g. "66.7%"
    pub hit_rate: String,
    /// Documents per collection
    pub collections: BTreeMap<String, u64>,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Status
    pub status: String,
    /// Version
    pub version: String,
    /// Uptime in seconds
    pub uptime_seconds: u64,
    /// Documents across all collections
    pub documents_count: u64,
    /// Live update subscribers
    pub subscribers: usize,
}
