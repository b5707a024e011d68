//! Cache categories and the per-category freshness policy.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::error::{Result, TouchlineError};

/// The fixed kinds of data the cache knows about.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheCategory {
    /// League table.
    Standings,
    /// Match list for a date window.
    Matches,
    /// Analysis of a single match.
    Analysis,
    /// One team's league record.
    TeamData,
}

impl CacheCategory {
    /// All categories, in declaration order.
    pub const ALL: [CacheCategory; 4] = [
        CacheCategory::Standings,
        CacheCategory::Matches,
        CacheCategory::Analysis,
        CacheCategory::TeamData,
    ];

    /// Canonical lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheCategory::Standings => "standings",
            CacheCategory::Matches => "matches",
            CacheCategory::Analysis => "analysis",
            CacheCategory::TeamData => "team_data",
        }
    }

    /// Store collection holding this category's documents.
    pub fn collection(&self) -> &'static str {
        match self {
            CacheCategory::Standings | CacheCategory::TeamData => COLLECTION_EPL_TEAMS,
            CacheCategory::Matches => COLLECTION_MATCH_REPORTS,
            CacheCategory::Analysis => COLLECTION_TACTICAL_ANALYSIS,
        }
    }

    /// Metadata key under which the serialized envelope is stored.
    pub fn envelope_key(&self) -> &'static str {
        match self {
            CacheCategory::Standings => "standings_data",
            CacheCategory::Matches => "matches_data",
            CacheCategory::Analysis => "analysis_data",
            CacheCategory::TeamData => "team_data",
        }
    }

    /// Notification topic used by the default policy.
    pub fn default_topic(&self) -> &'static str {
        match self {
            CacheCategory::Standings => TOPIC_STANDINGS,
            CacheCategory::Matches => TOPIC_MATCHES,
            CacheCategory::Analysis => TOPIC_MATCH_ANALYSIS,
            CacheCategory::TeamData => TOPIC_TEAM_STATS,
        }
    }
}

impl fmt::Display for CacheCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CacheCategory {
    type Err = TouchlineError;

    fn from_str(s: &str) -> Result<Self> {
        CacheCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == s.trim())
            .ok_or_else(|| TouchlineError::Configuration(format!("unknown cache category '{}'", s)))
    }
}

/// Freshness rules for one category.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryPolicy {
    /// Maximum age of a valid entry.
    #[serde(with = "ttl_seconds")]
    pub ttl: Duration,
    /// Envelope version entries must carry.
    pub version: String,
    /// Topic to announce fresh data on, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
}

impl CategoryPolicy {
    /// Creates a policy without a notification topic.
    pub fn new(ttl: Duration, version: impl Into<String>) -> Self {
        Self {
            ttl,
            version: version.into(),
            topic: None,
        }
    }

    /// Sets the notification topic.
    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    fn validate(&self, category: CacheCategory) -> Result<()> {
        if self.ttl.is_zero() {
            return Err(TouchlineError::Configuration(format!(
                "ttl for '{}' must be greater than zero",
                category
            )));
        }
        if self.version.trim().is_empty() {
            return Err(TouchlineError::Configuration(format!(
                "version for '{}' cannot be empty",
                category
            )));
        }
        if matches!(&self.topic, Some(t) if t.trim().is_empty()) {
            return Err(TouchlineError::Configuration(format!(
                "topic for '{}' cannot be empty",
                category
            )));
        }
        Ok(())
    }
}

/// Typed, exhaustive mapping from category to policy.
///
/// Built once at startup; there is no way to mutate it afterwards. Serializes
/// as a map keyed by category name, and deserializing goes through the same
/// checks as [`CachePolicy::from_entries`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<CacheCategory, CategoryPolicy>",
    into = "BTreeMap<CacheCategory, CategoryPolicy>"
)]
pub struct CachePolicy {
    policies: [CategoryPolicy; 4],
}

impl CachePolicy {
    /// Builds a policy table, rejecting missing, duplicate or invalid entries.
    pub fn from_entries<I>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (CacheCategory, CategoryPolicy)>,
    {
        let mut slots: [Option<CategoryPolicy>; 4] = Default::default();

        for (category, policy) in entries {
            policy.validate(category)?;
            let slot = &mut slots[Self::index(category)];
            if slot.is_some() {
                return Err(TouchlineError::Configuration(format!(
                    "duplicate policy for '{}'",
                    category
                )));
            }
            *slot = Some(policy);
        }

        let missing: Vec<&str> = CacheCategory::ALL
            .iter()
            .filter(|c| slots[Self::index(**c)].is_none())
            .map(|c| c.as_str())
            .collect();
        if !missing.is_empty() {
            return Err(TouchlineError::Configuration(format!(
                "missing policy for: {}",
                missing.join(", ")
            )));
        }

        let [a, b, c, d] = slots;
        match (a, b, c, d) {
            (Some(a), Some(b), Some(c), Some(d)) => Ok(Self { policies: [a, b, c, d] }),
            _ => Err(TouchlineError::Configuration("incomplete cache policy".into())),
        }
    }

    /// Same ttl and version for every category, with the default topics.
    pub fn uniform(ttl: Duration, version: impl Into<String>) -> Result<Self> {
        let version = version.into();
        Self::from_entries(CacheCategory::ALL.into_iter().map(|c| {
            (
                c,
                CategoryPolicy::new(ttl, version.clone()).with_topic(c.default_topic()),
            )
        }))
    }

    /// Parses category names and builds the table. Unknown names are rejected.
    pub fn from_named<I, S>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, CategoryPolicy)>,
        S: AsRef<str>,
    {
        let parsed = entries
            .into_iter()
            .map(|(name, policy)| Ok((name.as_ref().parse::<CacheCategory>()?, policy)))
            .collect::<Result<Vec<_>>>()?;
        Self::from_entries(parsed)
    }

    /// Returns the policy for a category.
    pub fn get(&self, category: CacheCategory) -> &CategoryPolicy {
        &self.policies[Self::index(category)]
    }

    /// Iterates over all (category, policy) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (CacheCategory, &CategoryPolicy)> {
        CacheCategory::ALL.into_iter().map(move |c| (c, self.get(c)))
    }

    fn index(category: CacheCategory) -> usize {
        match category {
            CacheCategory::Standings => 0,
            CacheCategory::Matches => 1,
            CacheCategory::Analysis => 2,
            CacheCategory::TeamData => 3,
        }
    }
}

impl TryFrom<BTreeMap<CacheCategory, CategoryPolicy>> for CachePolicy {
    type Error = TouchlineError;

    fn try_from(map: BTreeMap<CacheCategory, CategoryPolicy>) -> Result<Self> {
        Self::from_entries(map)
    }
}

impl From<CachePolicy> for BTreeMap<CacheCategory, CategoryPolicy> {
    fn from(policy: CachePolicy) -> Self {
        CacheCategory::ALL.into_iter().zip(policy.policies).collect()
    }
}

impl Default for CachePolicy {
    fn default() -> Self {
        let policy = |c: CacheCategory| {
            CategoryPolicy::new(Duration::from_secs(DEFAULT_CACHE_TTL_SECS), DEFAULT_CACHE_VERSION)
                .with_topic(c.default_topic())
        };
        Self {
            policies: CacheCategory::ALL.map(policy),
        }
    }
}

mod ttl_seconds {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ttl: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(ttl.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_secs)
    }
}
