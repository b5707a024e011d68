//! In-process update bus.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::debug;

use touchline_core::error::Result;
use touchline_core::traits::Notifier;

/// Buffered updates per subscriber before it starts lagging.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// A published update.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    /// Topic, e.g. `soccer_standings`.
    pub topic: String,
    /// Record key.
    pub key: String,
    /// Payload (the cache envelope).
    pub value: serde_json::Value,
    /// When the update was published.
    pub published_at: DateTime<Utc>,
}

/// Notifier that broadcasts to every current subscriber.
///
/// Publishing never fails: with no subscribers the update is dropped, and
/// a slow subscriber misses updates rather than blocking publishers.
#[derive(Clone, Debug)]
pub struct BroadcastNotifier {
    tx: broadcast::Sender<Notification>,
}

impl BroadcastNotifier {
    /// Creates a bus buffering `capacity` updates per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Subscribes to all future updates.
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.tx.subscribe()
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for BroadcastNotifier {
    fn default() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }
}

#[async_trait]
impl Notifier for BroadcastNotifier {
    async fn publish(&self, topic: &str, key: &str, value: &serde_json::Value) -> Result<()> {
        let notification = Notification {
            topic: topic.to_string(),
            key: key.to_string(),
            value: value.clone(),
            published_at: Utc::now(),
        };
        match self.tx.send(notification) {
            Ok(receivers) => debug!(topic, key, receivers, "Broadcast update"),
            Err(_) => debug!(topic, key, "No subscribers for update"),
        }
        Ok(())
    }
}
