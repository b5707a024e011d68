//! # Touchline Core
//!
//! Core types, errors, and traits for the Touchline soccer-analytics backend.
//!
//! This crate provides the building blocks used by all other Touchline crates:
//!
//! - **Types**: cache categories and policies, the versioned envelope, store
//!   documents, and football-data.org models
//! - **Errors**: one error hierarchy with recovery classification
//! - **Constants**: policy defaults, endpoints, collections and topics
//! - **Traits**: the store, remote source and notifier interfaces
//!
//! ## Example
//!
//! ```rust
//! use touchline_core::{CacheCategory, CachePolicy};
//!
//! let policy = CachePolicy::default();
//! let standings = policy.get(CacheCategory::Standings);
//! assert_eq!(standings.version, "1.0");
//! assert!("fixtures".parse::<CacheCategory>().is_err());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, clippy::all)]

pub mod clock;
pub mod constants;
pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used items at crate root
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{Result, TouchlineError};
pub use traits::*;
pub use types::*;
