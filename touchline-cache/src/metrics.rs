//! Hit/miss accounting for the freshness cache.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Counters shared by every cache call.
///
/// Owned by the application state and injected into the cache, so tests
/// and concurrent callers each see exactly the counters they were given.
#[derive(Debug, Default)]
pub struct CacheMetrics {
    hits: AtomicU64,
    misses: AtomicU64,
    api_calls: AtomicU64,
}

impl CacheMetrics {
    /// Creates zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a cache hit.
    pub fn record_hit(&self) {
        let total = self.hits.fetch_add(1, Ordering::Relaxed) + 1;
        debug!(total, "Cache hit recorded");
    }

    /// Records a cache miss.
    pub fn record_miss(&self) {
        let total = self.misses.fetch_add(1, Ordering::Relaxed) + 1;
        debug!(total, "Cache miss recorded");
    }

    /// Records an attempted remote call.
    pub fn record_api_call(&self) {
        let total = self.api_calls.fetch_add(1, Ordering::Relaxed) + 1;
        debug!(total, "API call recorded");
    }

    /// Returns a point-in-time copy of the counters.
    pub fn snapshot(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            api_calls: self.api_calls.load(Ordering::Relaxed),
        }
    }
}

/// Cache statistics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Calls answered from the store
    pub hits: u64,
    /// Calls that went to the remote source
    pub misses: u64,
    /// Remote calls attempted
    pub api_calls: u64,
}

impl CacheStats {
    /// Hits as a percentage of all calls; 0 when there were none.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64 * 100.0
        }
    }

    /// Hit rate formatted with one decimal, e.g. "66.7%".
    pub fn hit_rate_display(&self) -> String {
        format!("{:.1}%", self.hit_rate())
    }
}
