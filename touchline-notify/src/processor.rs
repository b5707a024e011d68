//! Background consumer for broadcast updates.

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use touchline_core::constants::{TOPIC_MATCHES, TOPIC_MATCH_ANALYSIS, TOPIC_STANDINGS, TOPIC_TEAM_STATS};

use crate::broadcast::Notification;

/// Spawns a task that logs every update it receives.
///
/// The task ends when the bus is dropped and returns the number of updates
/// it processed.
pub fn spawn_update_logger(mut rx: broadcast::Receiver<Notification>) -> JoinHandle<u64> {
    tokio::spawn(async move {
        let mut processed = 0u64;
        loop {
            match rx.recv().await {
                Ok(update) => {
                    log_update(&update);
                    processed += 1;
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Update logger lagged, some updates were dropped");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    info!(processed, "Update bus closed");
                    break;
                }
            }
        }
        processed
    })
}

fn log_update(update: &Notification) {
    let version = update.value.get("version").and_then(|v| v.as_str()).unwrap_or("?");
    match update.topic.as_str() {
        TOPIC_STANDINGS => info!(key = %update.key, version, "Processing standings update"),
        TOPIC_MATCHES => info!(key = %update.key, version, "Processing match update"),
        TOPIC_MATCH_ANALYSIS => info!(match_id = %update.key, version, "Processing match analysis"),
        TOPIC_TEAM_STATS => info!(team = %update.key, version, "Processing team stats update"),
        other => debug!(topic = other, key = %update.key, "Ignoring update"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BroadcastNotifier;
    use serde_json::json;
    use touchline_core::Notifier;

    #[tokio::test]
    async fn test_logger_counts_until_closed() {
        let bus = BroadcastNotifier::new(8);
        let handle = spawn_update_logger(bus.subscribe());

        bus.publish(TOPIC_STANDINGS, "20240301", &json!({"version": "1.0"}))
            .await
            .unwrap();
        bus.publish(TOPIC_MATCHES, "2024-03-01 to 2024-03-08", &json!({"version": "1.0"}))
            .await
            .unwrap();
        bus.publish("other", "x", &json!(null)).await.unwrap();
        drop(bus);

        assert_eq!(handle.await.unwrap(), 3);
    }
}
