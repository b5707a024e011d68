//! Match analysis derived from a fixture.
//!
//! Everything here is computed from the match detail the API returns; no
//! external model is involved.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::types::football::{Match, UNKNOWN};

/// Statistics the free tier may expose.
const TRACKED_STATS: [&str; 3] = ["possession", "shots", "shotsOnTarget"];

/// Placeholder for scores of unfinished matches.
const TBD: &str = "TBD";

/// Headline facts.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BasicInfo {
    /// Home team.
    pub home_team: String,
    /// Away team.
    pub away_team: String,
    /// Competition.
    pub competition: String,
    /// Kick-off.
    pub date: String,
    /// Venue.
    pub venue: String,
    /// Status.
    pub status: String,
}

/// A goal in the analysis.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GoalInfo {
    /// Minute.
    pub minute: u32,
    /// Scoring team.
    pub team: String,
    /// Scorer.
    pub scorer: String,
    /// Assist, if any.
    pub assist: Option<String>,
}

/// Scoring section.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Scoring {
    /// Final score, or "TBD".
    pub final_score: String,
    /// Half-time score, or "TBD".
    pub half_time: String,
    /// Goals in order.
    pub goals: Vec<GoalInfo>,
}

/// One statistic for both sides.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StatPair {
    /// Home value.
    pub home: serde_json::Value,
    /// Away value.
    pub away: serde_json::Value,
}

/// Result from the focus team's point of view.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchResult {
    /// Won.
    Win,
    /// Drew.
    Draw,
    /// Lost.
    Loss,
}

/// Section about the configured focus team.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FocusTeamAnalysis {
    /// Focus team name.
    pub team: String,
    /// "home" or "away".
    pub playing_at: String,
    /// Opponent name.
    pub opponent: String,
    /// Match status.
    pub status: String,
    /// Result, once finished.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<MatchResult>,
    /// "scored - conceded", once finished.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<String>,
    /// Goals scored.
    #[serde(default)]
    pub goals_scored: u32,
    /// Goals conceded.
    #[serde(default)]
    pub goals_conceded: u32,
    /// The focus team's own statistics.
    #[serde(default)]
    pub stats: BTreeMap<String, serde_json::Value>,
}

/// Cached analysis of one match.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatchAnalysis {
    /// Match id.
    pub match_id: u64,
    /// Headline facts.
    pub basic_info: BasicInfo,
    /// Scoring.
    pub scoring: Scoring,
    /// Statistics available for at least one side.
    pub statistics: BTreeMap<String, StatPair>,
    /// Focus team section, when the focus team played.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub focus_team: Option<FocusTeamAnalysis>,
    /// Human-readable report.
    pub report: String,
}

impl MatchAnalysis {
    /// Builds the analysis of `m`, with a section for `focus_team` if it played.
    pub fn from_match(m: &Match, focus_team: &str) -> Self {
        let basic_info = BasicInfo {
            home_team: m.home_team.display_name().to_string(),
            away_team: m.away_team.display_name().to_string(),
            competition: m.competition_name().to_string(),
            date: m.utc_date.clone().unwrap_or_else(|| UNKNOWN.into()),
            venue: m.venue.clone().unwrap_or_else(|| UNKNOWN.into()),
            status: m.status_str().to_string(),
        };

        let finished = m.is_finished();
        let scoring = Scoring {
            final_score: if finished { m.score.full_time.display() } else { TBD.into() },
            half_time: if finished { m.score.half_time.display() } else { TBD.into() },
            goals: m
                .goals
                .iter()
                .map(|g| GoalInfo {
                    minute: g.minute.unwrap_or(0),
                    team: name_or_unknown(g.team.as_ref().and_then(|t| t.name.clone())),
                    scorer: name_or_unknown(g.scorer.as_ref().and_then(|s| s.name.clone())),
                    assist: g.assist.as_ref().and_then(|a| a.name.clone()),
                })
                .collect(),
        };

        let mut statistics = BTreeMap::new();
        for stat in TRACKED_STATS {
            let home = m.home_team.statistics.get(stat);
            let away = m.away_team.statistics.get(stat);
            if home.is_some() || away.is_some() {
                statistics.insert(
                    stat.to_string(),
                    StatPair {
                        home: home.cloned().unwrap_or_else(|| "N/A".into()),
                        away: away.cloned().unwrap_or_else(|| "N/A".into()),
                    },
                );
            }
        }
        if statistics.is_empty() && finished {
            statistics.insert(
                "basic_summary".into(),
                StatPair {
                    home: format!("Goals: {}", m.score.full_time.home.unwrap_or(0)).into(),
                    away: format!("Goals: {}", m.score.full_time.away.unwrap_or(0)).into(),
                },
            );
        }

        let focus = focus_team_section(m, focus_team);

        let mut analysis = Self {
            match_id: m.id,
            basic_info,
            scoring,
            statistics,
            focus_team: focus,
            report: String::new(),
        };
        analysis.report = analysis.render_report();
        analysis
    }

    fn render_report(&self) -> String {
        let info = &self.basic_info;
        let mut out = String::new();
        let _ = writeln!(
            out,
            "{} vs {} ({}, {})",
            info.home_team, info.away_team, info.competition, info.date
        );
        let _ = writeln!(out, "Status: {}", info.status);
        if info.status == "FINISHED" {
            let _ = writeln!(
                out,
                "Final score: {} (half-time {})",
                self.scoring.final_score, self.scoring.half_time
            );
        }
        for goal in &self.scoring.goals {
            match &goal.assist {
                Some(assist) => {
                    let _ = writeln!(
                        out,
                        "  {}' {} ({}), assist {}",
                        goal.minute, goal.scorer, goal.team, assist
                    );
                }
                None => {
                    let _ = writeln!(out, "  {}' {} ({})", goal.minute, goal.scorer, goal.team);
                }
            }
        }
        for (name, pair) in &self.statistics {
            let _ = writeln!(out, "{}: {} / {}", name, plain(&pair.home), plain(&pair.away));
        }
        if let Some(focus) = &self.focus_team {
            match (focus.result, &focus.score) {
                (Some(result), Some(score)) => {
                    let verb = match result {
                        MatchResult::Win => "beat",
                        MatchResult::Draw => "drew with",
                        MatchResult::Loss => "lost to",
                    };
                    let _ = writeln!(
                        out,
                        "{} {} {} {} ({})",
                        focus.team, verb, focus.opponent, score, focus.playing_at
                    );
                }
                _ => {
                    let _ = writeln!(
                        out,
                        "{} face {} ({}), status {}",
                        focus.team, focus.opponent, focus.playing_at, focus.status
                    );
                }
            }
        }
        out.trim_end().to_string()
    }
}

fn focus_team_section(m: &Match, focus_team: &str) -> Option<FocusTeamAnalysis> {
    let home = m.home_team.display_name();
    let away = m.away_team.display_name();
    let is_home = if home == focus_team {
        true
    } else if away == focus_team {
        false
    } else {
        return None;
    };

    let (opponent, own, other) = if is_home {
        (away, &m.home_team, &m.away_team)
    } else {
        (home, &m.away_team, &m.home_team)
    };

    let mut section = FocusTeamAnalysis {
        team: focus_team.to_string(),
        playing_at: if is_home { "home" } else { "away" }.to_string(),
        opponent: opponent.to_string(),
        status: m.status_str().to_string(),
        result: None,
        score: None,
        goals_scored: 0,
        goals_conceded: 0,
        stats: BTreeMap::new(),
    };

    if m.is_finished() {
        let ft = m.score.full_time;
        let (scored, conceded) = if is_home {
            (ft.home.unwrap_or(0), ft.away.unwrap_or(0))
        } else {
            (ft.away.unwrap_or(0), ft.home.unwrap_or(0))
        };
        section.result = Some(match scored.cmp(&conceded) {
            std::cmp::Ordering::Greater => MatchResult::Win,
            std::cmp::Ordering::Equal => MatchResult::Draw,
            std::cmp::Ordering::Less => MatchResult::Loss,
        });
        section.score = Some(format!("{} - {}", scored, conceded));
        section.goals_scored = scored;
        section.goals_conceded = conceded;
        section.stats = TRACKED_STATS
            .iter()
            .filter(|s| own.statistics.contains_key(**s) || other.statistics.contains_key(**s))
            .map(|s| {
                (
                    s.to_string(),
                    own.statistics.get(*s).cloned().unwrap_or_else(|| "N/A".into()),
                )
            })
            .collect();
    }

    Some(section)
}

fn name_or_unknown(name: Option<String>) -> String {
    name.unwrap_or_else(|| UNKNOWN.into())
}

fn plain(v: &serde_json::Value) -> String {
    match v {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
