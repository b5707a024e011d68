//! football-data.org client configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use touchline_core::constants::{
    BACKOFF_MULTIPLIER, DEFAULT_COMPETITION, DEFAULT_FOCUS_TEAM, FOOTBALL_DATA_BASE_URL,
    MAX_BACKOFF_SECS, MAX_RETRY_ATTEMPTS, MIN_REQUEST_INTERVAL_SECS, REQUEST_TIMEOUT_SECS,
};
use touchline_core::error::{Result, TouchlineError};

/// Remote source configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// API token sent as `X-Auth-Token`
    pub api_key: String,
    /// API root, e.g. "https://api.football-data.org/v4"
    pub base_url: String,
    /// Competition code
    pub competition: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// Minimum spacing between two outbound requests
    pub min_request_interval: Duration,
    /// Attempts per request when rate limited (429)
    pub max_attempts: u32,
    /// Upper bound for the 429 backoff
    pub max_backoff: Duration,
    /// Team that gets its own section in match analyses
    pub focus_team: String,
}

impl SourceConfig {
    /// Creates config for the public API with the given token.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: FOOTBALL_DATA_BASE_URL.into(),
            competition: DEFAULT_COMPETITION.into(),
            timeout_seconds: REQUEST_TIMEOUT_SECS,
            min_request_interval: Duration::from_secs(MIN_REQUEST_INTERVAL_SECS),
            max_attempts: MAX_RETRY_ATTEMPTS,
            max_backoff: Duration::from_secs(MAX_BACKOFF_SECS),
            focus_team: DEFAULT_FOCUS_TEAM.into(),
        }
    }

    /// Points the client at another API root (mirrors, test servers).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Sets the competition code.
    pub fn with_competition(mut self, code: impl Into<String>) -> Self {
        self.competition = code.into();
        self
    }

    /// Sets the minimum spacing between requests.
    pub fn with_min_interval(mut self, interval: Duration) -> Self {
        self.min_request_interval = interval;
        self
    }

    /// Sets the attempt budget for rate-limited requests.
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Sets the backoff cap.
    pub fn with_max_backoff(mut self, cap: Duration) -> Self {
        self.max_backoff = cap;
        self
    }

    /// Sets the focus team.
    pub fn with_focus_team(mut self, team: impl Into<String>) -> Self {
        self.focus_team = team.into();
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    /// Checks the configuration before a client is built.
    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(TouchlineError::Configuration(
                "football-data.org API key is not set".into(),
            ));
        }
        url::Url::parse(&self.base_url).map_err(|e| {
            TouchlineError::Configuration(format!("invalid base url '{}': {}", self.base_url, e))
        })?;
        if self.competition.trim().is_empty() {
            return Err(TouchlineError::Configuration("competition code is empty".into()));
        }
        if self.max_attempts == 0 {
            return Err(TouchlineError::Configuration(
                "max_attempts must be at least 1".into(),
            ));
        }
        if self.timeout_seconds == 0 {
            return Err(TouchlineError::Configuration("timeout must be positive".into()));
        }
        Ok(())
    }

    /// Wait before retrying after the `attempt`-th rate-limited response.
    ///
    /// Starts at the minimum interval and doubles, capped at `max_backoff`.
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let factor = BACKOFF_MULTIPLIER.saturating_pow(attempt.saturating_sub(1));
        self.min_request_interval
            .saturating_mul(factor)
            .min(self.max_backoff)
    }
}
