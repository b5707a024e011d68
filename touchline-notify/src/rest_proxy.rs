//! Kafka REST proxy publisher.
//!
//! Produces JSON records with the v2 API:
//! `POST {base}/topics/{topic}` with content type
//! `application/vnd.kafka.json.v2+json`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use touchline_core::constants::REQUEST_TIMEOUT_SECS;
use touchline_core::error::{Result, TouchlineError};
use touchline_core::traits::Notifier;

const CONTENT_TYPE: &str = "application/vnd.kafka.json.v2+json";

/// REST proxy configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestProxyConfig {
    /// Proxy root, e.g. "http://localhost:8082"
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
}

impl RestProxyConfig {
    /// Creates config for the given proxy.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout_seconds: REQUEST_TIMEOUT_SECS,
        }
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }
}

/// Publishes updates to Kafka through a REST proxy.
pub struct RestProxyNotifier {
    config: RestProxyConfig,
    http_client: reqwest::Client,
}

impl RestProxyNotifier {
    /// Creates a notifier with the given config.
    pub fn with_config(config: RestProxyConfig) -> Result<Self> {
        url::Url::parse(&config.base_url).map_err(|e| {
            TouchlineError::Configuration(format!(
                "invalid REST proxy url '{}': {}",
                config.base_url, e
            ))
        })?;

        let http_client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| TouchlineError::Configuration(format!("HTTP client: {}", e)))?;

        Ok(Self {
            config,
            http_client,
        })
    }

    fn topic_url(&self, topic: &str) -> String {
        format!("{}/topics/{}", self.config.base_url.trim_end_matches('/'), topic)
    }
}

#[async_trait]
impl Notifier for RestProxyNotifier {
    #[instrument(skip(self, value))]
    async fn publish(&self, topic: &str, key: &str, value: &serde_json::Value) -> Result<()> {
        let notify_error = |reason: String| TouchlineError::Notify {
            topic: topic.to_string(),
            reason,
        };

        let body = serde_json::json!({
            "records": [{ "key": key, "value": value }]
        });

        let response = self
            .http_client
            .post(self.topic_url(topic))
            .header(reqwest::header::CONTENT_TYPE, CONTENT_TYPE)
            .body(body.to_string())
            .send()
            .await
            .map_err(|e| notify_error(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(notify_error(format!("HTTP {}: {}", status, text)));
        }

        debug!(topic, key, "Record produced");
        Ok(())
    }
}
