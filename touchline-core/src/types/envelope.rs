//! Versioned envelope stored alongside every cached payload.
//!
//! # Serialization contract
//!
//! ```text
//! {"data": <payload>, "version": "1.0", "timestamp": "2026-10-19T14:30:00Z"}
//! ```
//!
//! The envelope is stored as a JSON string inside a document's metadata,
//! under the category's envelope key (see [`CacheCategory::envelope_key`]).

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TouchlineError};
use crate::types::{CacheCategory, CategoryPolicy};

/// A payload wrapped with its schema version and production time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    /// The cached domain object.
    pub data: T,
    /// Schema version the entry was written with.
    pub version: String,
    /// When the payload was fetched.
    pub timestamp: DateTime<Utc>,
}

/// Outcome of checking an envelope against its category policy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Validity {
    /// Fresh and written with the expected version.
    Valid,
    /// Older than the category ttl.
    Expired {
        /// Age in whole seconds.
        age_secs: i64,
    },
    /// Written with another schema version.
    VersionMismatch {
        /// Version found in the envelope.
        found: String,
        /// Version the policy expects.
        expected: String,
    },
}

impl Validity {
    /// Returns true for [`Validity::Valid`].
    pub fn is_valid(&self) -> bool {
        matches!(self, Validity::Valid)
    }
}

impl<T> Envelope<T> {
    /// Wraps a payload.
    pub fn new(data: T, version: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            data,
            version: version.into(),
            timestamp,
        }
    }

    /// Age of the envelope at `now`. Timestamps in the future count as zero.
    pub fn age(&self, now: DateTime<Utc>) -> chrono::Duration {
        (now - self.timestamp).max(chrono::Duration::zero())
    }

    /// Checks the envelope against a category policy.
    ///
    /// Valid iff `now - timestamp < ttl` and `version == policy.version`.
    pub fn validity(&self, policy: &CategoryPolicy, now: DateTime<Utc>) -> Validity {
        if self.version != policy.version {
            return Validity::VersionMismatch {
                found: self.version.clone(),
                expected: policy.version.clone(),
            };
        }

        let age = self.age(now);
        let fresh = match chrono::Duration::from_std(policy.ttl) {
            Ok(ttl) => age < ttl,
            // ttl beyond chrono's range never expires
            Err(_) => true,
        };

        if fresh {
            Validity::Valid
        } else {
            Validity::Expired {
                age_secs: age.num_seconds(),
            }
        }
    }

    /// Shorthand for `validity(..).is_valid()`.
    pub fn is_valid(&self, policy: &CategoryPolicy, now: DateTime<Utc>) -> bool {
        self.validity(policy, now).is_valid()
    }
}

impl<T: Serialize> Envelope<T> {
    /// Serializes the envelope to its stored JSON string.
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Serializes the envelope to a JSON value (notification payload).
    pub fn to_json_value(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}

impl<T: DeserializeOwned> Envelope<T> {
    /// Decodes the envelope stored for `category`.
    ///
    /// Any decode failure is reported as [`TouchlineError::EnvelopeParse`].
    pub fn from_json_str(category: CacheCategory, raw: &str) -> Result<Self> {
        if raw.trim().is_empty() {
            return Err(TouchlineError::EnvelopeParse {
                key: category.envelope_key().into(),
                reason: "empty envelope".into(),
            });
        }
        serde_json::from_str(raw).map_err(|e| TouchlineError::EnvelopeParse {
            key: category.envelope_key().into(),
            reason: e.to_string(),
        })
    }
}
