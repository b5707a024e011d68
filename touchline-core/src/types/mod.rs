//! Domain types for Touchline.
//!
//! - [`CacheCategory`], [`CachePolicy`]: what is cached and for how long
//! - [`Envelope`]: the versioned wrapper persisted with each payload
//! - [`StoreRecord`], [`StoredDocument`], [`QueryDescriptor`]: store I/O
//! - football-data.org models and the derived [`MatchAnalysis`]

mod analysis;
mod category;
mod document;
mod envelope;
mod football;
mod teams;

pub use analysis::*;
pub use category::*;
pub use document::*;
pub use envelope::*;
pub use football::*;
pub use teams::*;
