//! # Touchline Store
//!
//! Document storage behind the freshness cache.
//!
//! This crate provides two backends for [`PersistentStore`]:
//!
//! - **Memory**: concurrent in-memory collections for development and testing
//! - **File**: the memory store plus an atomic snapshot file for single-node
//!   deployments
//!
//! Lookups are approximate (lexical cosine similarity), mirroring a vector
//! database: the nearest document comes back even when it is not the one
//! written for the query.
//!
//! ## Example
//!
//! ```rust,ignore
//! use touchline_store::{MemoryStore, PersistentStore};
//!
//! let store = MemoryStore::new();
//! store.upsert(CacheCategory::Standings, record).await?;
//! let nearest = store.query(&QueryDescriptor::probe(CacheCategory::Standings, "table")).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod config;
mod file;
mod memory;
mod similarity;

pub use config::StoreConfig;
pub use file::{FileStore, DEFAULT_AUTO_SAVE_THRESHOLD};
pub use memory::{MemoryStore, SnapshotEntry, StoreSnapshot, StoreStats};

// Re-export the trait from core
pub use touchline_core::traits::PersistentStore;
