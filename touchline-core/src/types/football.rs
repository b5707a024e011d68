//! football-data.org v4 domain models.
//!
//! Only the fields the dashboard reads are modelled; unknown fields are
//! ignored on decode.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::constants::{BIG_SIX, MATCH_WINDOW_CHUNK_DAYS, MAX_WINDOW_DAYS};
use crate::error::{Result, TouchlineError};

/// Placeholder for names the API leaves empty (e.g. undecided fixtures).
pub const UNKNOWN: &str = "Unknown";

// ═══════════════════════════════════════════════════════════════════════════════
// SHARED
// ═══════════════════════════════════════════════════════════════════════════════

/// Competition reference.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Competition {
    /// Competition id.
    #[serde(default)]
    pub id: Option<u64>,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Short code, e.g. `PL`.
    #[serde(default)]
    pub code: Option<String>,
}

/// Season reference.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Season {
    /// Season id.
    #[serde(default)]
    pub id: Option<u64>,
    /// First day of the season.
    #[serde(default)]
    pub start_date: Option<String>,
    /// Last day of the season.
    #[serde(default)]
    pub end_date: Option<String>,
    /// Current matchday.
    #[serde(default)]
    pub current_matchday: Option<u32>,
}

/// Team reference as embedded in tables.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamRef {
    /// Team id.
    pub id: u64,
    /// Full club name, e.g. "Manchester United FC".
    pub name: String,
    /// Short name, e.g. "Man United".
    #[serde(default)]
    pub short_name: Option<String>,
    /// Three letter abbreviation.
    #[serde(default)]
    pub tla: Option<String>,
}

// ═══════════════════════════════════════════════════════════════════════════════
// STANDINGS
// ═══════════════════════════════════════════════════════════════════════════════

/// One row of a league table. This is also the cached team record.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableRow {
    /// League position.
    pub position: u32,
    /// Team.
    pub team: TeamRef,
    /// Matches played.
    pub played_games: u32,
    /// Recent form, e.g. "W,D,L,W,W".
    #[serde(default)]
    pub form: Option<String>,
    /// Wins.
    pub won: u32,
    /// Draws.
    pub draw: u32,
    /// Losses.
    pub lost: u32,
    /// Points.
    pub points: u32,
    /// Goals scored.
    pub goals_for: u32,
    /// Goals conceded.
    pub goals_against: u32,
    /// Goal difference.
    pub goal_difference: i32,
}

/// A team's league record.
pub type TeamRecord = TableRow;

/// One standings table (total, home or away).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StandingGroup {
    /// Stage, e.g. `REGULAR_SEASON`.
    #[serde(default)]
    pub stage: Option<String>,
    /// Table type: `TOTAL`, `HOME` or `AWAY`.
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    /// Rows.
    #[serde(default)]
    pub table: Vec<TableRow>,
}

/// Response of `competitions/{code}/standings`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Standings {
    /// Competition.
    #[serde(default)]
    pub competition: Option<Competition>,
    /// Season.
    #[serde(default)]
    pub season: Option<Season>,
    /// Tables.
    #[serde(default)]
    pub standings: Vec<StandingGroup>,
}

impl Standings {
    /// The overall table: the `TOTAL` group, or the first one.
    pub fn table(&self) -> &[TableRow] {
        self.standings
            .iter()
            .find(|g| g.kind.as_deref() == Some("TOTAL"))
            .or_else(|| self.standings.first())
            .map(|g| g.table.as_slice())
            .unwrap_or(&[])
    }

    /// Returns true when there is no table to show.
    pub fn is_empty(&self) -> bool {
        self.table().is_empty()
    }

    /// Finds a team by exact name, then by partial match in either direction.
    pub fn find_team(&self, name: &str) -> Option<&TableRow> {
        let wanted = name.trim().to_lowercase();
        if wanted.is_empty() {
            return None;
        }
        let table = self.table();
        table
            .iter()
            .find(|row| row.team.name.to_lowercase() == wanted)
            .or_else(|| {
                table.iter().find(|row| {
                    let have = row.team.name.to_lowercase();
                    have.contains(&wanted) || wanted.contains(&have)
                })
            })
    }

    /// Finds a team by id.
    pub fn find_team_by_id(&self, id: u64) -> Option<&TableRow> {
        self.table().iter().find(|row| row.team.id == id)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// MATCHES
// ═══════════════════════════════════════════════════════════════════════════════

/// Named reference (scorer, assist, team in a goal event).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NamedRef {
    /// Id, when known.
    #[serde(default)]
    pub id: Option<u64>,
    /// Name.
    #[serde(default)]
    pub name: Option<String>,
}

/// Side of a fixture.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchTeam {
    /// Team id, missing for undecided fixtures.
    #[serde(default)]
    pub id: Option<u64>,
    /// Team name.
    #[serde(default)]
    pub name: Option<String>,
    /// Per-team statistics (paid tiers only).
    #[serde(default)]
    pub statistics: BTreeMap<String, serde_json::Value>,
}

impl MatchTeam {
    /// Team name or [`UNKNOWN`].
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(UNKNOWN)
    }
}

/// Home/away goal pair.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreLine {
    /// Home goals.
    #[serde(default)]
    pub home: Option<u32>,
    /// Away goals.
    #[serde(default)]
    pub away: Option<u32>,
}

impl ScoreLine {
    /// Formats as "h - a", treating missing values as zero.
    pub fn display(&self) -> String {
        format!("{} - {}", self.home.unwrap_or(0), self.away.unwrap_or(0))
    }
}

/// Match score.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Score {
    /// `HOME_TEAM`, `AWAY_TEAM`, `DRAW` or absent.
    #[serde(default)]
    pub winner: Option<String>,
    /// Full-time score.
    #[serde(default)]
    pub full_time: ScoreLine,
    /// Half-time score.
    #[serde(default)]
    pub half_time: ScoreLine,
}

/// Goal event.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    /// Minute scored.
    #[serde(default)]
    pub minute: Option<u32>,
    /// Scoring team.
    #[serde(default)]
    pub team: Option<NamedRef>,
    /// Scorer.
    #[serde(default)]
    pub scorer: Option<NamedRef>,
    /// Assist provider.
    #[serde(default)]
    pub assist: Option<NamedRef>,
}

/// A fixture as returned by `matches/{id}` and inside match lists.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    /// Match id.
    pub id: u64,
    /// Kick-off time (UTC, RFC 3339).
    #[serde(default)]
    pub utc_date: Option<String>,
    /// Status, e.g. `FINISHED`.
    #[serde(default)]
    pub status: Option<String>,
    /// Matchday.
    #[serde(default)]
    pub matchday: Option<u32>,
    /// Venue.
    #[serde(default)]
    pub venue: Option<String>,
    /// Competition.
    #[serde(default)]
    pub competition: Option<Competition>,
    /// Home side.
    #[serde(default)]
    pub home_team: MatchTeam,
    /// Away side.
    #[serde(default)]
    pub away_team: MatchTeam,
    /// Score.
    #[serde(default)]
    pub score: Score,
    /// Goal events.
    #[serde(default)]
    pub goals: Vec<Goal>,
}

impl Match {
    /// Status or [`UNKNOWN`].
    pub fn status_str(&self) -> &str {
        self.status.as_deref().unwrap_or(UNKNOWN)
    }

    /// Returns true once the final whistle has gone.
    pub fn is_finished(&self) -> bool {
        self.status.as_deref() == Some("FINISHED")
    }

    /// Competition name or [`UNKNOWN`].
    pub fn competition_name(&self) -> &str {
        self.competition
            .as_ref()
            .map(|c| c.name.as_str())
            .filter(|n| !n.is_empty())
            .unwrap_or(UNKNOWN)
    }

    /// Condenses the fixture into a list entry.
    pub fn summary(&self) -> MatchSummary {
        MatchSummary {
            home_team: self.home_team.display_name().to_string(),
            away_team: self.away_team.display_name().to_string(),
            date: self.utc_date.clone().unwrap_or_else(|| UNKNOWN.into()),
            status: self.status_str().to_string(),
            competition: self.competition_name().to_string(),
        }
    }
}

/// Response of `matches` and `teams/{id}/matches`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchesResponse {
    /// Fixtures.
    #[serde(default)]
    pub matches: Vec<Match>,
}

/// Compact fixture entry.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchSummary {
    /// Home team name.
    pub home_team: String,
    /// Away team name.
    pub away_team: String,
    /// Kick-off time.
    pub date: String,
    /// Status.
    pub status: String,
    /// Competition name.
    pub competition: String,
}

/// Fixtures keyed by match id.
pub type MatchList = BTreeMap<u64, MatchSummary>;

/// Date window around today for match lists.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchWindow {
    /// Days to look back.
    pub days_back: u32,
    /// Days to look forward.
    pub days_forward: u32,
}

impl MatchWindow {
    /// Creates a window. See [`MatchWindow::checked`] for untrusted input.
    pub fn new(days_back: u32, days_forward: u32) -> Self {
        Self {
            days_back,
            days_forward,
        }
    }

    /// Creates a window, rejecting sides wider than [`MAX_WINDOW_DAYS`].
    pub fn checked(days_back: u32, days_forward: u32) -> Result<Self> {
        let window = Self::new(days_back, days_forward);
        window.validate()?;
        Ok(window)
    }

    /// Fails if either side exceeds [`MAX_WINDOW_DAYS`].
    pub fn validate(&self) -> Result<()> {
        if self.days_back > MAX_WINDOW_DAYS || self.days_forward > MAX_WINDOW_DAYS {
            return Err(TouchlineError::ValidationError(format!(
                "Match window cannot exceed {} days either side of today",
                MAX_WINDOW_DAYS
            )));
        }
        Ok(())
    }

    /// First and last day of the window. Each side is capped at
    /// [`MAX_WINDOW_DAYS`].
    pub fn range(&self, today: NaiveDate) -> (NaiveDate, NaiveDate) {
        let back = self.days_back.min(MAX_WINDOW_DAYS);
        let forward = self.days_forward.min(MAX_WINDOW_DAYS);
        (
            today - Duration::days(i64::from(back)),
            today + Duration::days(i64::from(forward)),
        )
    }

    /// "YYYY-MM-DD to YYYY-MM-DD".
    pub fn label(&self, today: NaiveDate) -> String {
        let (from, to) = self.range(today);
        format!("{} to {}", from.format("%Y-%m-%d"), to.format("%Y-%m-%d"))
    }

    /// Splits the window into inclusive chunks the API accepts.
    pub fn chunks(&self, today: NaiveDate) -> Vec<(NaiveDate, NaiveDate)> {
        let (mut current, end) = self.range(today);
        let mut chunks = Vec::new();
        while current <= end {
            let chunk_end = (current + Duration::days(MATCH_WINDOW_CHUNK_DAYS - 1)).min(end);
            chunks.push((current, chunk_end));
            current = chunk_end + Duration::days(1);
        }
        chunks
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// BIG SIX
// ═══════════════════════════════════════════════════════════════════════════════

/// Table figures for one big-six club.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BigSixEntry {
    /// Club name as listed in the table.
    pub team_name: String,
    /// League position.
    pub position: u32,
    /// Points.
    pub points: u32,
    /// Matches played.
    pub played: u32,
    /// Wins.
    pub won: u32,
    /// Draws.
    pub draw: u32,
    /// Losses.
    pub lost: u32,
    /// Goals scored.
    pub goals_for: u32,
    /// Goals conceded.
    pub goals_against: u32,
    /// Goal difference.
    pub goal_difference: i32,
    /// Recent form.
    pub form: String,
}

impl From<&TableRow> for BigSixEntry {
    fn from(row: &TableRow) -> Self {
        Self {
            team_name: row.team.name.clone(),
            position: row.position,
            points: row.points,
            played: row.played_games,
            won: row.won,
            draw: row.draw,
            lost: row.lost,
            goals_for: row.goals_for,
            goals_against: row.goals_against,
            goal_difference: row.goal_difference,
            form: row.form.clone().unwrap_or_default(),
        }
    }
}

/// Big-six figures keyed by club slug (e.g. `manchester_united`).
pub type BigSixComparison = BTreeMap<String, BigSixEntry>;

/// Extracts the big-six clubs from a standings table. Clubs missing from the
/// table are left out.
pub fn big_six_comparison(standings: &Standings) -> BigSixComparison {
    BIG_SIX
        .iter()
        .filter_map(|(slug, id)| {
            standings
                .find_team_by_id(*id)
                .map(|row| (slug.to_string(), BigSixEntry::from(row)))
        })
        .collect()
}
