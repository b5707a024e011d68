//! Cache-through freshness layer for Touchline.
//!
//! Every dashboard read goes through [`FreshnessCache::fetch`]: probe the
//! store, trust the snapshot only if it is fresh and written with the
//! expected schema version, otherwise refetch from the remote source, store
//! the new envelope and publish it.

mod cache;
mod metrics;

pub use cache::FreshnessCache;
pub use metrics::{CacheMetrics, CacheStats};
