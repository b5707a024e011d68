//! Constants for Touchline.
//!
//! Defaults for the cache policy, the football-data.org adapter, store
//! collections and notification topics.

// ═══════════════════════════════════════════════════════════════════════════════
// CACHE POLICY DEFAULTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Default time-to-live for every cache category, in seconds.
pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;

/// Default envelope schema version for every cache category.
pub const DEFAULT_CACHE_VERSION: &str = "1.0";

/// Number of store results the cache asks for when probing.
pub const CACHE_PROBE_TOP_K: usize = 1;

// ═══════════════════════════════════════════════════════════════════════════════
// REMOTE SOURCE (football-data.org v4)
// ═══════════════════════════════════════════════════════════════════════════════

/// Base endpoint of the football-data.org API.
pub const FOOTBALL_DATA_BASE_URL: &str = "https://api.football-data.org/v4";

/// Header carrying the API token.
pub const AUTH_HEADER: &str = "X-Auth-Token";

/// Minimum spacing between consecutive outbound requests, in seconds.
/// The free tier allows 10 requests per minute.
pub const MIN_REQUEST_INTERVAL_SECS: u64 = 6;

/// Maximum attempts for a request that keeps returning HTTP 429.
pub const MAX_RETRY_ATTEMPTS: u32 = 3;

/// Multiplier applied to the backoff after each rate-limited attempt.
pub const BACKOFF_MULTIPLIER: u32 = 2;

/// Upper bound for a single backoff sleep, in seconds.
pub const MAX_BACKOFF_SECS: u64 = 60;

/// HTTP request timeout, in seconds.
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Competition code used for league-wide queries (Premier League).
pub const DEFAULT_COMPETITION: &str = "PL";

/// The API rejects date ranges longer than this many days.
pub const MATCH_WINDOW_CHUNK_DAYS: i64 = 10;

/// Match statuses requested for match lists.
pub const MATCH_STATUSES: &str = "SCHEDULED,LIVE,IN_PLAY,PAUSED,FINISHED";

/// Widest match window accepted on either side of today, in days.
pub const MAX_WINDOW_DAYS: u32 = 90;

/// Default match window looking back, in days.
pub const DEFAULT_DAYS_BACK: u32 = 7;

/// Default match window looking forward, in days.
pub const DEFAULT_DAYS_FORWARD: u32 = 7;

// ═══════════════════════════════════════════════════════════════════════════════
// STORE COLLECTIONS
// ═══════════════════════════════════════════════════════════════════════════════

/// League standings and per-team records.
pub const COLLECTION_EPL_TEAMS: &str = "epl_teams";

/// Match lists.
pub const COLLECTION_MATCH_REPORTS: &str = "match_reports";

/// Match analyses.
pub const COLLECTION_TACTICAL_ANALYSIS: &str = "tactical_analysis";

/// Aggregate statistics (big-six comparison).
pub const COLLECTION_TEAM_STATS: &str = "team_stats";

/// Documents about the configured focus team.
pub const COLLECTION_FOCUS_TEAM: &str = "focus_team";

/// Every collection a store is created with.
pub const DEFAULT_COLLECTIONS: [&str; 5] = [
    COLLECTION_EPL_TEAMS,
    COLLECTION_MATCH_REPORTS,
    COLLECTION_TACTICAL_ANALYSIS,
    COLLECTION_TEAM_STATS,
    COLLECTION_FOCUS_TEAM,
];

// ═══════════════════════════════════════════════════════════════════════════════
// NOTIFICATION TOPICS
// ═══════════════════════════════════════════════════════════════════════════════

/// Topic for standings updates.
pub const TOPIC_STANDINGS: &str = "soccer_standings";

/// Topic for match list updates.
pub const TOPIC_MATCHES: &str = "soccer_matches";

/// Topic for team statistics updates.
pub const TOPIC_TEAM_STATS: &str = "soccer_team_stats";

/// Topic for match analysis updates.
pub const TOPIC_MATCH_ANALYSIS: &str = "soccer_match_analysis";

// ═══════════════════════════════════════════════════════════════════════════════
// TEAMS
// ═══════════════════════════════════════════════════════════════════════════════

/// Default focus team for match analysis.
pub const DEFAULT_FOCUS_TEAM: &str = "Manchester United FC";

/// football-data.org ids of the "big six" clubs.
pub const BIG_SIX: [(&str, u64); 6] = [
    ("manchester_united", 66),
    ("manchester_city", 65),
    ("liverpool", 64),
    ("chelsea", 61),
    ("arsenal", 57),
    ("tottenham", 73),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collections_unique() {
        for (i, a) in DEFAULT_COLLECTIONS.iter().enumerate() {
            for (j, b) in DEFAULT_COLLECTIONS.iter().enumerate() {
                if i != j {
                    assert_ne!(a, b, "Collection names must be unique");
                }
            }
        }
    }

    #[test]
    fn test_big_six_ids_unique() {
        let mut ids: Vec<u64> = BIG_SIX.iter().map(|(_, id)| *id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 6);
    }

    #[test]
    fn test_backoff_cap_exceeds_interval() {
        assert!(MAX_BACKOFF_SECS >= MIN_REQUEST_INTERVAL_SECS);
    }
}
