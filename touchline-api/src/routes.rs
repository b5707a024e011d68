//! API route configuration.

use std::sync::Arc;

use axum::{routing::get, Router};

use crate::handlers;
use crate::state::AppState;

/// Creates the API router with all routes configured.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))

        // League data
        .route("/api/v1/standings", get(handlers::get_standings))
        .route("/api/v1/big-six", get(handlers::get_big_six))
        .route("/api/v1/teams/:name", get(handlers::get_team))

        // Matches
        .route("/api/v1/matches", get(handlers::get_matches))
        .route("/api/v1/matches/:id/analysis", get(handlers::get_match_analysis))

        // Store
        .route("/api/v1/search", get(handlers::search))
        .route("/api/v1/cache/stats", get(handlers::cache_stats))

        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use touchline_cache::CacheMetrics;
    use touchline_core::types::CachePolicy;
    use touchline_store::MemoryStore;

    use crate::service::testing::FakeSource;
    use crate::service::Dashboard;
    use crate::state::ApiConfig;

    fn test_state(source: FakeSource) -> Arc<AppState> {
        let dashboard = Dashboard::new(
            Arc::new(MemoryStore::new()),
            Arc::new(source),
            CachePolicy::default(),
            Arc::new(CacheMetrics::new()),
        );
        Arc::new(AppState::new(ApiConfig::default(), dashboard))
    }

    fn test_app() -> Router {
        create_router(test_state(FakeSource::default()))
    }

    async fn call(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, body)
    }

    #[tokio::test]
    async fn test_health_check() {
        let (status, body) = call(test_app(), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["documents_count"], 0);
    }

    #[tokio::test]
    async fn test_standings() {
        let (status, body) = call(test_app(), "/api/v1/standings").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["standings"][0]["table"][0]["team"]["name"], "Liverpool FC");
    }

    #[tokio::test]
    async fn test_standings_unavailable() {
        let app = create_router(test_state(FakeSource {
            empty: true,
            ..Default::default()
        }));

        let (status, body) = call(app, "/api/v1/standings").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"]["code"], "DATA_UNAVAILABLE");
    }

    #[tokio::test]
    async fn test_matches() {
        let (status, body) = call(test_app(), "/api/v1/matches?days_back=3&days_forward=3").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["matches"]["101"]["home_team"], "Arsenal FC");
        assert!(body["date_range"].as_str().unwrap().contains(" to "));
    }

    #[tokio::test]
    async fn test_matches_window_limits() {
        let (status, _) = call(test_app(), "/api/v1/matches?days_back=365").await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, _) = call(test_app(), "/api/v1/matches?days_back=soon").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_match_analysis() {
        let (status, body) = call(test_app(), "/api/v1/matches/55/analysis").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["match_id"], 55);
        assert_eq!(body["focus_team"]["playing_at"], "home");

        let (status, _) = call(test_app(), "/api/v1/matches/404/analysis").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = call(test_app(), "/api/v1/matches/abc/analysis").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_team_lookup() {
        let (status, body) = call(test_app(), "/api/v1/teams/Arsenal").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["team"]["id"], 57);

        let (status, _) = call(test_app(), "/api/v1/teams/Leeds").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_big_six() {
        let (status, body) = call(test_app(), "/api/v1/big-six").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["tottenham"]["position"], 5);
        assert_eq!(body.as_object().unwrap().len(), 6);
    }

    #[tokio::test]
    async fn test_search() {
        let state = test_state(FakeSource::default());
        let app = create_router(state.clone());

        let (status, _) = call(app.clone(), "/api/v1/standings").await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) =
            call(app.clone(), "/api/v1/search?collection=epl_teams&q=Liverpool").await;
        assert_eq!(status, StatusCode::OK);
        let results = body["results"].as_array().unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0]["metadata"]["type"], "standings");
        assert!(results[0]["metadata"].get("standings_data").is_none());

        let (status, _) = call(app.clone(), "/api/v1/search?collection=nope&q=x").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = call(app, "/api/v1/search?collection=epl_teams&q=%20").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_cache_stats() {
        let app = test_app();
        call(app.clone(), "/api/v1/standings").await;
        call(app.clone(), "/api/v1/standings").await;

        let (status, body) = call(app, "/api/v1/cache/stats").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["hits"], 1);
        assert_eq!(body["misses"], 1);
        assert_eq!(body["api_calls"], 1);
        assert_eq!(body["hit_rate"], "50.0%");
        assert_eq!(body["collections"]["epl_teams"], 1);
    }
}
