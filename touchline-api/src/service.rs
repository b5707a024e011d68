//! Dashboard reads, each going through the freshness cache.

use std::fmt::Write as _;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use touchline_cache::{CacheMetrics, CacheStats, FreshnessCache};
use touchline_core::error::Result;
use touchline_core::traits::{Notifier, PersistentStore, RemoteSource};
use touchline_core::types::{
    big_six_comparison, full_team_name, BigSixComparison, CacheCategory, CachePolicy,
    MatchAnalysis, MatchList, MatchWindow, QueryDescriptor, Standings, StoreRecord,
    StoredDocument, TeamRecord,
};
use touchline_core::{Clock, SystemClock};
use tracing::info;

/// Probe text for the league table.
const STANDINGS_QUERY: &str = "Premier League standings table";

/// Upper bound for free-text search results.
pub const MAX_SEARCH_RESULTS: usize = 50;

/// Fixtures of one date window, as cached.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatchReport {
    /// "YYYY-MM-DD to YYYY-MM-DD".
    pub date_range: String,
    /// Fixtures keyed by match id.
    pub matches: MatchList,
}

/// The dashboard's data access layer.
pub struct Dashboard {
    cache: FreshnessCache,
    source: Arc<dyn RemoteSource>,
    clock: Arc<dyn Clock>,
}

impl Dashboard {
    /// Creates a dashboard over the given store and source.
    pub fn new(
        store: Arc<dyn PersistentStore>,
        source: Arc<dyn RemoteSource>,
        policy: CachePolicy,
        metrics: Arc<CacheMetrics>,
    ) -> Self {
        Self {
            cache: FreshnessCache::new(store, policy, metrics),
            source,
            clock: Arc::new(SystemClock),
        }
    }

    /// Publishes fresh data through `notifier`.
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.cache = self.cache.with_notifier(notifier);
        self
    }

    /// Replaces the time source for freshness checks, ids and windows.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.cache = self.cache.with_clock(clock.clone());
        self.clock = clock;
        self
    }

    /// Current league table.
    pub async fn standings(&self) -> Result<Option<Standings>> {
        let now = self.clock.now();
        let source = self.source.clone();
        self.cache
            .fetch(
                CacheCategory::Standings,
                STANDINGS_QUERY,
                move || async move { source.get_standings().await },
                move |s: &Standings| standings_record(s, now),
            )
            .await
    }

    /// Fixtures in a window around today.
    pub async fn matches(&self, window: MatchWindow) -> Result<Option<MatchReport>> {
        let now = self.clock.now();
        let date_range = window.label(now.date_naive());
        let query = matches_key(&date_range);
        let source = self.source.clone();
        let range = date_range.clone();

        self.cache
            .fetch_where(
                CacheCategory::Matches,
                &query,
                move || async move {
                    source.get_matches(window).await.map(|matches| {
                        matches.map(|matches| MatchReport {
                            date_range: range,
                            matches,
                        })
                    })
                },
                move |r: &MatchReport| matches_record(r, now),
                |r: &MatchReport| r.date_range == date_range,
            )
            .await
    }

    /// One team's league record. Short names are resolved first; a miss is
    /// answered from the cached table.
    pub async fn team(&self, name: &str) -> Result<Option<TeamRecord>> {
        let now = self.clock.now();
        let full_name = full_team_name(name);
        let query = team_key(&full_name);
        let lookup = full_name.clone();

        self.cache
            .fetch_where(
                CacheCategory::TeamData,
                &query,
                || async move {
                    let standings = self.standings().await?;
                    let row = standings.and_then(|s| s.find_team(&lookup).cloned());
                    if row.is_none() {
                        info!(team = %lookup, "Team not found in standings");
                    }
                    Ok(row)
                },
                move |t: &TeamRecord| team_record(t, now),
                |t: &TeamRecord| names_match(&t.team.name, &full_name),
            )
            .await
    }

    /// Analysis of one match.
    pub async fn analysis(&self, match_id: u64) -> Result<Option<MatchAnalysis>> {
        let now = self.clock.now();
        let query = analysis_key(match_id);
        let source = self.source.clone();

        self.cache
            .fetch_where(
                CacheCategory::Analysis,
                &query,
                move || async move { source.analyze(match_id).await },
                move |a: &MatchAnalysis| analysis_record(a, now),
                |a: &MatchAnalysis| a.match_id == match_id,
            )
            .await
    }

    /// The six-club comparison, derived from the (cached) table.
    pub async fn big_six(&self) -> Result<Option<BigSixComparison>> {
        Ok(self
            .standings()
            .await?
            .map(|s| big_six_comparison(&s))
            .filter(|c| !c.is_empty()))
    }

    /// Free-text search over any collection.
    pub async fn search(
        &self,
        collection: &str,
        text: &str,
        n: usize,
    ) -> Result<Vec<StoredDocument>> {
        let query = QueryDescriptor::search(collection, text, n.clamp(1, MAX_SEARCH_RESULTS));
        self.cache.store().query(&query).await
    }

    /// Documents per collection.
    pub async fn collection_counts(&self) -> Result<Vec<(String, u64)>> {
        self.cache.store().collection_counts().await
    }

    /// Cache counters.
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

fn names_match(have: &str, wanted: &str) -> bool {
    let have = have.to_lowercase();
    let wanted = wanted.trim().to_lowercase();
    !wanted.is_empty() && (have == wanted || have.contains(&wanted) || wanted.contains(&have))
}

fn stamp(now: DateTime<Utc>) -> String {
    now.format("%Y%m%d%H%M%S").to_string()
}

fn matches_key(date_range: &str) -> String {
    format!("Premier League matches {}", date_range)
}

fn team_key(full_name: &str) -> String {
    format!("{} league record", full_name)
}

fn analysis_key(match_id: u64) -> String {
    format!("Match analysis {}", match_id)
}

// Each record's first document is the exact lookup text for its key, so
// every snapshot of one key ranks alike and the newest wins. Details follow
// in a second document.

fn standings_record(s: &Standings, now: DateTime<Utc>) -> StoreRecord {
    let mut table = format!("Table as of {}", now.format("%Y-%m-%d"));
    for row in s.table() {
        let _ = write!(
            table,
            "\n{}. {} {} points {} played",
            row.position, row.team.name, row.points, row.played_games
        );
    }
    StoreRecord::new(format!("standings_{}", stamp(now)), STANDINGS_QUERY)
        .with_document(table)
        .with_meta("type", "standings")
        .with_meta("date", now.format("%Y-%m-%d").to_string())
        .with_publish_key(now.format("%Y%m%d").to_string())
}

fn matches_record(r: &MatchReport, now: DateTime<Utc>) -> StoreRecord {
    let mut fixtures = format!("{} matches", r.matches.len());
    for (id, m) in &r.matches {
        let _ = write!(
            fixtures,
            "\n{} {} vs {} {} {}",
            id, m.home_team, m.away_team, m.status, m.date
        );
    }
    StoreRecord::new(format!("matches_{}", stamp(now)), matches_key(&r.date_range))
        .with_document(fixtures)
        .with_meta("type", "matches")
        .with_meta("date_range", r.date_range.clone())
        .with_meta("count", r.matches.len() as u64)
        .with_publish_key(r.date_range.clone())
}

fn team_record(t: &TeamRecord, now: DateTime<Utc>) -> StoreRecord {
    let details = format!(
        "position {} points {} won {} drawn {} lost {} goal difference {}",
        t.position, t.points, t.won, t.draw, t.lost, t.goal_difference
    );
    StoreRecord::new(format!("team_{}_{}", t.team.id, stamp(now)), team_key(&t.team.name))
        .with_document(details)
        .with_meta("type", "team")
        .with_meta("team_name", t.team.name.clone())
        .with_meta("team_id", t.team.id)
        .with_meta("date", now.format("%Y-%m-%d").to_string())
        .with_publish_key(t.team.id.to_string())
}

fn analysis_record(a: &MatchAnalysis, now: DateTime<Utc>) -> StoreRecord {
    StoreRecord::new(
        format!("analysis_{}_{}", a.match_id, stamp(now)),
        analysis_key(a.match_id),
    )
    .with_document(a.report.clone())
    .with_meta("type", "analysis")
    .with_meta("match_id", a.match_id)
    .with_meta("home_team", a.basic_info.home_team.clone())
    .with_meta("away_team", a.basic_info.away_team.clone())
    .with_publish_key(a.match_id.to_string())
}
