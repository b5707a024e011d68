//! App state: dashboard service, update bus, config.

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use touchline_cache::CacheMetrics;
use touchline_core::constants::*;
use touchline_core::error::{Result, TouchlineError};
use touchline_core::types::CachePolicy;
use touchline_notify::{BroadcastNotifier, RestProxyConfig, RestProxyNotifier};
use touchline_source::{FootballDataClient, SourceConfig};
use touchline_store::StoreConfig;

use crate::service::Dashboard;

/// Server configuration, usually read from the environment.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApiConfig {
    /// football-data.org token
    pub api_key: Option<String>,
    /// football-data.org base url
    pub base_url: String,
    /// Minimum spacing between outbound requests
    pub min_request_interval_secs: u64,
    /// Attempts for a rate-limited request
    pub max_retry_attempts: u32,
    /// Cache ttl for every category
    pub cache_ttl_seconds: u64,
    /// Envelope version for every category
    pub cache_version: String,
    /// Snapshot file; in-memory store when unset
    pub store_path: Option<PathBuf>,
    /// Kafka REST proxy; in-process broadcast when unset
    pub kafka_rest_url: Option<String>,
    /// Team highlighted in match analyses
    pub focus_team: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: FOOTBALL_DATA_BASE_URL.into(),
            min_request_interval_secs: MIN_REQUEST_INTERVAL_SECS,
            max_retry_attempts: MAX_RETRY_ATTEMPTS,
            cache_ttl_seconds: DEFAULT_CACHE_TTL_SECS,
            cache_version: DEFAULT_CACHE_VERSION.into(),
            store_path: None,
            kafka_rest_url: None,
            focus_team: DEFAULT_FOCUS_TEAM.into(),
        }
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    parse_or(name, std::env::var(name).ok(), default)
}

/// Parses a raw setting; a malformed value is logged and replaced by `default`.
fn parse_or<T: FromStr>(name: &str, raw: Option<String>, default: T) -> T {
    let Some(raw) = raw else {
        return default;
    };
    match raw.trim().parse() {
        Ok(value) => value,
        Err(_) => {
            warn!(setting = name, value = %raw, "Invalid setting, using default");
            default
        }
    }
}

impl ApiConfig {
    /// Reads the config from the environment (and `.env`, if present).
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        let defaults = Self::default();

        Self {
            api_key: std::env::var("FOOTBALL_DATA_API_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty()),
            base_url: std::env::var("FOOTBALL_DATA_BASE_URL").unwrap_or(defaults.base_url),
            min_request_interval_secs: env_or(
                "MIN_REQUEST_INTERVAL_SECS",
                defaults.min_request_interval_secs,
            ),
            max_retry_attempts: env_or("MAX_RETRY_ATTEMPTS", defaults.max_retry_attempts),
            cache_ttl_seconds: env_or("CACHE_TTL_SECONDS", defaults.cache_ttl_seconds),
            cache_version: std::env::var("CACHE_VERSION").unwrap_or(defaults.cache_version),
            store_path: std::env::var("TOUCHLINE_STORE_PATH").ok().map(PathBuf::from),
            kafka_rest_url: std::env::var("KAFKA_REST_URL").ok(),
            focus_team: std::env::var("FOCUS_TEAM").unwrap_or(defaults.focus_team),
        }
    }

    /// Remote source settings. Fails without an API key.
    pub fn source_config(&self) -> Result<SourceConfig> {
        let api_key = self.api_key.clone().ok_or_else(|| {
            TouchlineError::Configuration("FOOTBALL_DATA_API_KEY is not set".into())
        })?;

        let config = SourceConfig::new(api_key)
            .with_base_url(self.base_url.clone())
            .with_min_interval(Duration::from_secs(self.min_request_interval_secs))
            .with_max_attempts(self.max_retry_attempts)
            .with_focus_team(self.focus_team.clone());
        config.validate()?;
        Ok(config)
    }

    /// Uniform freshness policy with the default topics.
    pub fn cache_policy(&self) -> Result<CachePolicy> {
        CachePolicy::uniform(
            Duration::from_secs(self.cache_ttl_seconds),
            self.cache_version.clone(),
        )
    }

    /// Store settings.
    pub fn store_config(&self) -> StoreConfig {
        match &self.store_path {
            Some(path) => StoreConfig::file(path),
            None => StoreConfig::memory(),
        }
    }
}

/// Shared state behind every handler.
pub struct AppState {
    /// Effective config
    pub config: ApiConfig,
    /// Cached data access
    pub dashboard: Dashboard,
    /// In-process update bus, when no REST proxy is configured
    pub bus: Option<BroadcastNotifier>,
}

impl AppState {
    /// Wires the source, store, cache and notifier from `config`.
    pub async fn from_config(config: ApiConfig) -> Result<Self> {
        let client = FootballDataClient::with_config(config.source_config()?)?;
        let store = config.store_config().open().await?;
        let policy = config.cache_policy()?;

        let dashboard = Dashboard::new(
            store,
            Arc::new(client),
            policy,
            Arc::new(CacheMetrics::new()),
        );

        let (dashboard, bus) = match &config.kafka_rest_url {
            Some(url) => {
                info!(url = %url, "Publishing updates through REST proxy");
                let notifier = RestProxyNotifier::with_config(RestProxyConfig::new(url.clone()))?;
                (dashboard.with_notifier(Arc::new(notifier)), None)
            }
            None => {
                let bus = BroadcastNotifier::default();
                (dashboard.with_notifier(Arc::new(bus.clone())), Some(bus))
            }
        };

        Ok(Self {
            config,
            dashboard,
            bus,
        })
    }

    /// Assembles state from prebuilt parts.
    pub fn new(config: ApiConfig, dashboard: Dashboard) -> Self {
        Self {
            config,
            dashboard,
            bus: None,
        }
    }

    /// Attaches an update bus. The dashboard must already publish to it.
    pub fn with_bus(mut self, bus: BroadcastNotifier) -> Self {
        self.bus = Some(bus);
        self
    }
}
