//! Error types for Touchline.
//!
//! One error hierarchy shared by every crate, built with `thiserror`.
//! Each variant maps to a single recovery rule in the cache layer.

use thiserror::Error;

/// Result type alias using `TouchlineError`.
pub type Result<T> = std::result::Result<T, TouchlineError>;

/// Main error type for all Touchline operations.
#[derive(Debug, Error)]
pub enum TouchlineError {
    // ═══════════════════════════════════════════════════════════════════════════
    // CONFIGURATION ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Unknown category, unknown collection, or an invalid cache policy.
    ///
    /// Always surfaces to the caller.
    #[error("Configuration error: {0}")]
    Configuration(String),

    // ═══════════════════════════════════════════════════════════════════════════
    // REMOTE SOURCE ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Remote call failed (network, non-success status, malformed body).
    #[error("Remote fetch failed for '{endpoint}': {reason}")]
    TransientFetch { endpoint: String, reason: String },

    /// Remote source kept rate-limiting after every allowed attempt.
    #[error("Rate limit retries exhausted for '{endpoint}' after {attempts} attempts")]
    RetryExhausted { endpoint: String, attempts: u32 },

    /// The API rejected the configured credentials.
    #[error("Remote source rejected credentials: {0}")]
    Unauthorized(String),

    // ═══════════════════════════════════════════════════════════════════════════
    // CACHE ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// A stored envelope is missing or malformed.
    #[error("Envelope parse error in '{key}': {reason}")]
    EnvelopeParse { key: String, reason: String },

    /// Write-back to the persistent store failed.
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Publishing an update failed.
    #[error("Notify error on topic '{topic}': {reason}")]
    Notify { topic: String, reason: String },

    // ═══════════════════════════════════════════════════════════════════════════
    // SERIALIZATION & STORAGE ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// File I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Snapshot file is corrupted or has the wrong format.
    #[error("Store snapshot error: {0}")]
    Snapshot(String),

    /// Snapshot format version mismatch.
    #[error("Snapshot version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: u8, actual: u8 },

    // ═══════════════════════════════════════════════════════════════════════════
    // VALIDATION ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Input validation failed.
    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl TouchlineError {
    /// Shorthand for a transient fetch failure.
    pub fn transient(endpoint: impl Into<String>, reason: impl ToString) -> Self {
        TouchlineError::TransientFetch {
            endpoint: endpoint.into(),
            reason: reason.to_string(),
        }
    }

    /// Returns true if a later attempt may succeed.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            TouchlineError::TransientFetch { .. }
                | TouchlineError::RetryExhausted { .. }
                | TouchlineError::Persistence(_)
                | TouchlineError::Notify { .. }
        )
    }

    /// Returns true for programmer/configuration errors that must surface.
    pub fn is_configuration_error(&self) -> bool {
        matches!(self, TouchlineError::Configuration(_))
    }

    /// Returns true if this error came from the remote source.
    pub fn is_fetch_error(&self) -> bool {
        matches!(
            self,
            TouchlineError::TransientFetch { .. }
                | TouchlineError::RetryExhausted { .. }
                | TouchlineError::Unauthorized(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TouchlineError::RetryExhausted {
            endpoint: "competitions/PL/standings".into(),
            attempts: 3,
        };
        assert!(err.to_string().contains("competitions/PL/standings"));
        assert!(err.to_string().contains('3'));
    }

    #[test]
    fn test_error_classification() {
        assert!(TouchlineError::transient("x", "boom").is_recoverable());
        assert!(TouchlineError::Persistence("disk full".into()).is_recoverable());
        assert!(!TouchlineError::Configuration("bad".into()).is_recoverable());

        assert!(TouchlineError::Configuration("bad".into()).is_configuration_error());
        assert!(!TouchlineError::Persistence("x".into()).is_configuration_error());

        assert!(TouchlineError::Unauthorized("key".into()).is_fetch_error());
        assert!(!TouchlineError::Persistence("x".into()).is_fetch_error());
    }

    #[test]
    fn test_json_error_conversion() {
        let json_result: std::result::Result<serde_json::Value, _> = serde_json::from_str("invalid");
        let result: Result<serde_json::Value> = json_result.map_err(TouchlineError::from);
        assert!(matches!(result, Err(TouchlineError::JsonError(_))));
    }
}
