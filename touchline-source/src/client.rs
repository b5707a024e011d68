//! football-data.org v4 client.
//!
//! All requests share one rate limiter, so concurrent callers queue behind
//! each other instead of tripping the API's per-minute quota.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use touchline_core::constants::{AUTH_HEADER, MATCH_STATUSES};
use touchline_core::error::{Result, TouchlineError};
use touchline_core::traits::RemoteSource;
use touchline_core::types::{
    full_team_name, Match, MatchAnalysis, MatchList, MatchWindow, MatchesResponse, Standings,
    TeamRecord,
};
use touchline_core::{Clock, SystemClock};

use crate::config::SourceConfig;

/// Rate-limited football-data.org client.
pub struct FootballDataClient {
    config: SourceConfig,
    http_client: reqwest::Client,
    /// Time of the last outbound request; held across the wait and the send.
    last_request: Mutex<Option<Instant>>,
    clock: Arc<dyn Clock>,
}

impl FootballDataClient {
    /// Creates a client with the given config.
    pub fn with_config(config: SourceConfig) -> Result<Self> {
        config.validate()?;

        let http_client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| TouchlineError::Configuration(format!("HTTP client: {}", e)))?;

        Ok(Self {
            config,
            http_client,
            last_request: Mutex::new(None),
            clock: Arc::new(SystemClock),
        })
    }

    /// Replaces the clock used to compute match windows.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Returns the configuration.
    pub fn config(&self) -> &SourceConfig {
        &self.config
    }

    /// Current league table.
    #[instrument(skip(self))]
    pub async fn standings(&self) -> Result<Option<Standings>> {
        let endpoint = format!("competitions/{}/standings", self.config.competition);
        let standings: Option<Standings> = self.get_json(&endpoint, &[]).await?;
        Ok(standings.filter(|s| !s.is_empty()))
    }

    /// Fixtures in the window, fetched in chunks of at most ten days.
    ///
    /// A failed chunk is skipped; the call fails only when every chunk
    /// failed, or immediately on an authentication error.
    #[instrument(skip(self), fields(days_back = window.days_back, days_forward = window.days_forward))]
    pub async fn matches(&self, window: MatchWindow) -> Result<Option<MatchList>> {
        window.validate()?;
        let today = self.clock.now().date_naive();
        let mut list = MatchList::new();
        let mut last_error = None;
        let mut succeeded = 0usize;

        for (from, to) in window.chunks(today) {
            let params = [
                ("dateFrom", from.format("%Y-%m-%d").to_string()),
                ("dateTo", to.format("%Y-%m-%d").to_string()),
                ("competitions", self.config.competition.clone()),
                ("status", MATCH_STATUSES.to_string()),
            ];
            debug!(%from, %to, "Fetching match chunk");

            match self.get_json::<MatchesResponse>("matches", &params).await {
                Ok(response) => {
                    succeeded += 1;
                    for m in response.map(|r| r.matches).unwrap_or_default() {
                        list.insert(m.id, m.summary());
                    }
                }
                Err(e @ TouchlineError::Unauthorized(_)) => return Err(e),
                Err(e) => {
                    warn!(error = %e, %from, %to, "Skipping match chunk");
                    last_error = Some(e);
                }
            }
        }

        if succeeded == 0 {
            if let Some(e) = last_error {
                return Err(e);
            }
        }
        if list.is_empty() {
            info!("No matches found in the window");
            return Ok(None);
        }
        Ok(Some(list))
    }

    /// Full detail of one match.
    #[instrument(skip(self))]
    pub async fn match_detail(&self, match_id: u64) -> Result<Option<Match>> {
        self.get_json(&format!("matches/{}", match_id), &[]).await
    }

    /// GETs `endpoint` and decodes the body.
    ///
    /// 404 is `Ok(None)`. 429 is retried with backoff up to the attempt
    /// budget, then reported as [`TouchlineError::RetryExhausted`].
    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<Option<T>> {
        let max_attempts = self.config.max_attempts;

        for attempt in 1..=max_attempts {
            let response = self.send(endpoint, params).await?;
            let status = response.status();
            debug!(endpoint, %status, attempt, "Response received");

            match status {
                s if s.is_success() => {
                    let body = response
                        .json::<T>()
                        .await
                        .map_err(|e| TouchlineError::transient(endpoint, e))?;
                    return Ok(Some(body));
                }
                StatusCode::NOT_FOUND => {
                    debug!(endpoint, "Resource not found");
                    return Ok(None);
                }
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    return Err(TouchlineError::Unauthorized(format!(
                        "{} returned {}; check the API key",
                        endpoint, status
                    )));
                }
                StatusCode::TOO_MANY_REQUESTS if attempt < max_attempts => {
                    let wait = self.config.backoff_for(attempt);
                    warn!(
                        endpoint,
                        attempt,
                        wait_ms = wait.as_millis() as u64,
                        "Rate limit exceeded, backing off"
                    );
                    tokio::time::sleep(wait).await;
                }
                StatusCode::TOO_MANY_REQUESTS => {
                    return Err(TouchlineError::RetryExhausted {
                        endpoint: endpoint.to_string(),
                        attempts: max_attempts,
                    });
                }
                _ => {
                    let text = response.text().await.unwrap_or_default();
                    return Err(TouchlineError::transient(
                        endpoint,
                        format!("HTTP {}: {}", status, text),
                    ));
                }
            }
        }

        Err(TouchlineError::RetryExhausted {
            endpoint: endpoint.to_string(),
            attempts: max_attempts,
        })
    }

    /// Sends one request, waiting out the minimum spacing first.
    async fn send(&self, endpoint: &str, params: &[(&str, String)]) -> Result<reqwest::Response> {
        let mut last = self.last_request.lock().await;
        if let Some(at) = *last {
            let elapsed = at.elapsed();
            if elapsed < self.config.min_request_interval {
                let wait = self.config.min_request_interval - elapsed;
                debug!(wait_ms = wait.as_millis() as u64, "Rate limiting");
                tokio::time::sleep(wait).await;
            }
        }

        let url = format!("{}/{}", self.config.base_url.trim_end_matches('/'), endpoint);
        let result = self
            .http_client
            .get(&url)
            .header(AUTH_HEADER, &self.config.api_key)
            .query(params)
            .send()
            .await;
        *last = Some(Instant::now());

        result.map_err(|e| TouchlineError::transient(endpoint, e))
    }
}

#[async_trait]
impl RemoteSource for FootballDataClient {
    async fn get_standings(&self) -> Result<Option<Standings>> {
        self.standings().await
    }

    async fn get_matches(&self, window: MatchWindow) -> Result<Option<MatchList>> {
        self.matches(window).await
    }

    /// Resolves short names ("Arsenal", "Spurs") and looks the team up in
    /// the current table.
    #[instrument(skip(self))]
    async fn get_team(&self, name: &str) -> Result<Option<TeamRecord>> {
        let full_name = full_team_name(name);
        let Some(standings) = self.standings().await? else {
            return Ok(None);
        };
        let row = standings.find_team(&full_name).cloned();
        if row.is_none() {
            info!(team = %full_name, "Team not found in standings");
        }
        Ok(row)
    }

    #[instrument(skip(self))]
    async fn analyze(&self, match_id: u64) -> Result<Option<MatchAnalysis>> {
        let analysis = self
            .match_detail(match_id)
            .await?
            .map(|m| MatchAnalysis::from_match(&m, &self.config.focus_team));
        if analysis.is_none() {
            info!(match_id, "Match not found");
        }
        Ok(analysis)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::{TimeZone, Utc};
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use touchline_core::ManualClock;

    use super::*;

    fn test_client(server: &MockServer) -> FootballDataClient {
        let config = SourceConfig::new("test-key")
            .with_base_url(server.uri())
            .with_min_interval(Duration::ZERO)
            .with_max_backoff(Duration::ZERO);
        FootballDataClient::with_config(config).unwrap()
    }

    fn standings_body() -> serde_json::Value {
        let row = |pos: u32, id: u64, name: &str, points: u32| {
            json!({
                "position": pos,
                "team": { "id": id, "name": name, "shortName": name, "tla": "XXX" },
                "playedGames": 28,
                "form": "W,W,D,L,W",
                "won": 20, "draw": 4, "lost": 4,
                "points": points,
                "goalsFor": 60, "goalsAgainst": 25, "goalDifference": 35
            })
        };
        json!({
            "competition": { "id": 2021, "name": "Premier League", "code": "PL" },
            "season": { "id": 1564, "currentMatchday": 28 },
            "standings": [{
                "stage": "REGULAR_SEASON",
                "type": "TOTAL",
                "table": [
                    row(1, 64, "Liverpool FC", 64),
                    row(2, 57, "Arsenal FC", 61),
                    row(6, 66, "Manchester United FC", 44)
                ]
            }]
        })
    }

    fn match_body(id: u64, status: &str) -> serde_json::Value {
        json!({
            "id": id,
            "utcDate": "2024-03-09T15:00:00Z",
            "status": status,
            "venue": "Old Trafford",
            "competition": { "name": "Premier League" },
            "homeTeam": { "id": 66, "name": "Manchester United FC" },
            "awayTeam": { "id": 73, "name": "Tottenham Hotspur FC" },
            "score": {
                "winner": "HOME_TEAM",
                "fullTime": { "home": 2, "away": 1 },
                "halfTime": { "home": 1, "away": 0 }
            },
            "goals": []
        })
    }

    #[tokio::test]
    async fn test_standings_sends_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/competitions/PL/standings"))
            .and(header("X-Auth-Token", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(standings_body()))
            .expect(1)
            .mount(&server)
            .await;

        let standings = test_client(&server).standings().await.unwrap().unwrap();
        assert_eq!(standings.table().len(), 3);
        assert_eq!(standings.table()[0].team.name, "Liverpool FC");
    }

    #[tokio::test]
    async fn test_not_found_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/matches/999"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let result = test_client(&server).analyze(999).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_persistent_rate_limit_exhausts_attempts() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/competitions/PL/standings"))
            .respond_with(ResponseTemplate::new(429))
            .expect(3)
            .mount(&server)
            .await;

        let err = test_client(&server).standings().await.unwrap_err();
        assert!(matches!(err, TouchlineError::RetryExhausted { attempts: 3, .. }));
    }

    #[tokio::test]
    async fn test_rate_limit_then_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/competitions/PL/standings"))
            .respond_with(ResponseTemplate::new(429))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/competitions/PL/standings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(standings_body()))
            .mount(&server)
            .await;

        let standings = test_client(&server).standings().await.unwrap();
        assert!(standings.is_some());
    }

    #[tokio::test]
    async fn test_forbidden_is_unauthorized() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let err = test_client(&server).standings().await.unwrap_err();
        assert!(matches!(err, TouchlineError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_server_error_is_transient() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let err = test_client(&server).standings().await.unwrap_err();
        assert!(matches!(err, TouchlineError::TransientFetch { .. }));
        assert!(err.to_string().contains("500"));
    }

    #[tokio::test]
    async fn test_malformed_body_is_transient() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let err = test_client(&server).standings().await.unwrap_err();
        assert!(matches!(err, TouchlineError::TransientFetch { .. }));
    }

    #[tokio::test]
    async fn test_matches_are_chunked_and_merged() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/matches"))
            .and(query_param("dateFrom", "2024-03-03"))
            .and(query_param("dateTo", "2024-03-12"))
            .and(query_param("competitions", "PL"))
            .and(query_param("status", MATCH_STATUSES))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "matches": [match_body(1, "FINISHED"), match_body(2, "FINISHED")]
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/matches"))
            .and(query_param("dateFrom", "2024-03-13"))
            .and(query_param("dateTo", "2024-03-17"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "matches": [match_body(2, "FINISHED"), match_body(3, "SCHEDULED")]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 3, 10, 9, 0, 0).unwrap()));
        let client = test_client(&server).with_clock(clock);

        let list = client.matches(MatchWindow::new(7, 7)).await.unwrap().unwrap();
        assert_eq!(list.keys().copied().collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(list[&3].status, "SCHEDULED");
        assert_eq!(list[&1].home_team, "Manchester United FC");
    }

    #[tokio::test]
    async fn test_failed_chunk_is_skipped() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/matches"))
            .and(query_param("dateFrom", "2024-03-03"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/matches"))
            .and(query_param("dateFrom", "2024-03-13"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "matches": [match_body(7, "SCHEDULED")]
            })))
            .mount(&server)
            .await;

        let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 3, 10, 9, 0, 0).unwrap()));
        let client = test_client(&server).with_clock(clock);

        let list = client.matches(MatchWindow::new(7, 7)).await.unwrap().unwrap();
        assert_eq!(list.len(), 1);
    }

    #[tokio::test]
    async fn test_all_chunks_failing_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/matches"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let err = test_client(&server).matches(MatchWindow::new(3, 3)).await.unwrap_err();
        assert!(err.is_fetch_error());
    }

    #[tokio::test]
    async fn test_empty_window_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/matches"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "matches": [] })))
            .mount(&server)
            .await;

        let list = test_client(&server).matches(MatchWindow::new(1, 1)).await.unwrap();
        assert!(list.is_none());
    }

    #[tokio::test]
    async fn test_oversized_window_sends_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/matches"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "matches": [] })))
            .expect(0)
            .mount(&server)
            .await;

        let err = test_client(&server)
            .matches(MatchWindow::new(100_000, 0))
            .await
            .unwrap_err();
        assert!(matches!(err, TouchlineError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_get_team_resolves_short_names() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/competitions/PL/standings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(standings_body()))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let team = client.get_team("manchester united").await.unwrap().unwrap();
        assert_eq!(team.team.id, 66);

        let team = client.get_team("Arsenal").await.unwrap().unwrap();
        assert_eq!(team.position, 2);

        assert!(client.get_team("Wrexham AFC").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_analyze_builds_focus_section() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/matches/42"))
            .respond_with(ResponseTemplate::new(200).set_body_json(match_body(42, "FINISHED")))
            .mount(&server)
            .await;

        let analysis = test_client(&server).analyze(42).await.unwrap().unwrap();
        assert_eq!(analysis.match_id, 42);
        assert_eq!(analysis.scoring.final_score, "2 - 1");
        assert!(analysis.focus_team.is_some());
        assert!(analysis.report.contains("Manchester United FC beat Tottenham Hotspur FC"));
    }

    #[tokio::test]
    async fn test_requests_are_spaced() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(standings_body()))
            .mount(&server)
            .await;

        let config = SourceConfig::new("test-key")
            .with_base_url(server.uri())
            .with_min_interval(Duration::from_millis(200));
        let client = FootballDataClient::with_config(config).unwrap();

        let started = Instant::now();
        client.standings().await.unwrap();
        client.standings().await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(200));
    }

    #[test]
    fn test_missing_api_key_rejected() {
        let result = FootballDataClient::with_config(SourceConfig::new(""));
        assert!(matches!(result, Err(TouchlineError::Configuration(_))));
    }
}
