//! football-data.org remote source for Touchline.
//!
//! Implements [`RemoteSource`](touchline_core::RemoteSource) over the v4 REST
//! API with request spacing and bounded retry on rate limiting.

mod client;
mod config;

pub use client::FootballDataClient;
pub use config::SourceConfig;
