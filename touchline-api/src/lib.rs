//! # Touchline API Server
//!
//! REST API for the soccer analytics dashboard. Every read goes through the
//! freshness cache, so repeated requests within the ttl never reach
//! football-data.org.
//!
//! ## Endpoints
//!
//! - `GET /api/v1/standings` - Current league table
//! - `GET /api/v1/matches?days_back=&days_forward=` - Fixtures around today
//! - `GET /api/v1/matches/:id/analysis` - Analysis of one match
//! - `GET /api/v1/teams/:name` - One team's league record
//! - `GET /api/v1/big-six` - Big-six comparison
//! - `GET /api/v1/search?collection=&q=&n=` - Free-text search over the store
//! - `GET /api/v1/cache/stats` - Hit/miss counters and store counts
//!
//! ## Example
//!
//! ```rust,ignore
//! use touchline_api::{ApiConfig, ApiServer};
//!
//! let server = ApiServer::from_config(ApiConfig::from_env()).await?;
//! server.run(([0, 0, 0, 0], 3001)).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod dto;
mod error;
mod handlers;
mod routes;
mod service;
mod state;

pub use error::ApiError;
pub use routes::create_router;
pub use service::{Dashboard, MatchReport, MAX_SEARCH_RESULTS};
pub use state::{ApiConfig, AppState};

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use touchline_notify::spawn_update_logger;

/// API server for Touchline.
pub struct ApiServer {
    state: Arc<AppState>,
}

impl ApiServer {
    /// Creates a server around prepared state.
    pub fn new(state: AppState) -> Self {
        Self {
            state: Arc::new(state),
        }
    }

    /// Creates a server from configuration.
    pub async fn from_config(config: ApiConfig) -> touchline_core::Result<Self> {
        Ok(Self::new(AppState::from_config(config).await?))
    }

    /// Creates the router with all routes configured.
    pub fn router(&self) -> Router {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        create_router(self.state.clone())
            .layer(cors)
            .layer(TraceLayer::new_for_http())
    }

    /// Runs the server on the given address.
    pub async fn run(self, addr: impl Into<SocketAddr>) -> std::io::Result<()> {
        let addr = addr.into();

        if let Some(bus) = &self.state.bus {
            spawn_update_logger(bus.subscribe());
        }

        let listener = tokio::net::TcpListener::bind(addr).await?;

        info!("Touchline API server listening on {}", addr);

        axum::serve(listener, self.router()).await
    }
}

/// Starts the API server with configuration from the environment.
pub async fn start_server(port: u16) -> std::io::Result<()> {
    let config = ApiConfig::from_env();
    let server = ApiServer::from_config(config)
        .await
        .map_err(std::io::Error::other)?;
    server.run(([0, 0, 0, 0], port)).await
}
