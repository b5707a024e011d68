//! API route handlers.

use std::sync::{Arc, OnceLock};
use std::time::Instant;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use tracing::{debug, info};

use touchline_core::types::{BigSixComparison, MatchAnalysis, MatchWindow, Standings, TeamRecord};

use crate::dto::*;
use crate::error::ApiError;
use crate::service::MatchReport;
use crate::state::AppState;

type Result<T> = std::result::Result<T, ApiError>;

/// Default number of search results.
const DEFAULT_SEARCH_RESULTS: usize = 5;

static START_TIME: OnceLock<Instant> = OnceLock::new();

/// GET /api/v1/standings
pub async fn get_standings(State(state): State<Arc<AppState>>) -> Result<Json<Standings>> {
    let standings = state
        .dashboard
        .standings()
        .await?
        .ok_or_else(|| ApiError::unavailable("Standings"))?;

    debug!(teams = standings.table().len(), "Served standings");
    Ok(Json(standings))
}

/// GET /api/v1/matches?days_back=&days_forward=
pub async fn get_matches(
    State(state): State<Arc<AppState>>,
    Query(query): Query<MatchesQuery>,
) -> Result<Json<MatchReport>> {
    let window = MatchWindow::checked(query.days_back, query.days_forward)?;
    let report = state
        .dashboard
        .matches(window)
        .await?
        .ok_or_else(|| ApiError::unavailable("Match"))?;

    debug!(date_range = %report.date_range, count = report.matches.len(), "Served matches");
    Ok(Json(report))
}

/// GET /api/v1/matches/:id/analysis
pub async fn get_match_analysis(
    State(state): State<Arc<AppState>>,
    Path(match_id): Path<u64>,
) -> Result<Json<MatchAnalysis>> {
    let analysis = state
        .dashboard
        .analysis(match_id)
        .await?
        .ok_or_else(|| {
            ApiError::not_found(format!("No analysis available for match {}", match_id))
        })?;

    Ok(Json(analysis))
}

/// GET /api/v1/teams/:name
pub async fn get_team(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<TeamRecord>> {
    if name.trim().is_empty() {
        return Err(ApiError::bad_request("Team name is required"));
    }

    let team = state
        .dashboard
        .team(&name)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Team '{}' not found", name)))?;

    Ok(Json(team))
}

/// GET /api/v1/big-six
pub async fn get_big_six(State(state): State<Arc<AppState>>) -> Result<Json<BigSixComparison>> {
    let comparison = state
        .dashboard
        .big_six()
        .await?
        .ok_or_else(|| ApiError::unavailable("Big six"))?;

    Ok(Json(comparison))
}

/// GET /api/v1/search?collection=&q=&n=
pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<SearchResponse>> {
    if query.q.trim().is_empty() {
        return Err(ApiError::bad_request("Query text is required"));
    }

    let n = query.n.unwrap_or(DEFAULT_SEARCH_RESULTS);
    let results = state
        .dashboard
        .search(&query.collection, &query.q, n)
        .await?;

    info!(collection = %query.collection, results = results.len(), "Search");

    Ok(Json(SearchResponse {
        collection: query.collection,
        results: results.into_iter().map(SearchHit::from).collect(),
    }))
}

/// GET /api/v1/cache/stats
pub async fn cache_stats(State(state): State<Arc<AppState>>) -> Result<Json<CacheStatsResponse>> {
    let stats = state.dashboard.cache_stats();
    let collections = state.dashboard.collection_counts().await?;

    Ok(Json(CacheStatsResponse {
        hits: stats.hits,
        misses: stats.misses,
        api_calls: stats.api_calls,
        hit_rate: stats.hit_rate_display(),
        collections: collections.into_iter().collect(),
    }))
}

/// GET /health
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let start = START_TIME.get_or_init(Instant::now);
    let uptime = start.elapsed().as_secs();

    let documents = state
        .dashboard
        .collection_counts()
        .await
        .map(|counts| counts.iter().map(|(_, n)| n).sum())
        .unwrap_or(0);

    Json(HealthResponse {
        status: "ok".into(),
        version: env!("CARGO_PKG_VERSION").into(),
        uptime_seconds: uptime,
        documents_count: documents,
        subscribers: state.bus.as_ref().map_or(0, |b| b.subscriber_count()),
    })
}
