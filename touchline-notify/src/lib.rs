//! Update publishing for Touchline.
//!
//! Two [`Notifier`](touchline_core::Notifier) implementations:
//!
//! - [`RestProxyNotifier`]: produces records through a Kafka REST proxy (v2 API)
//! - [`BroadcastNotifier`]: fans updates out to in-process subscribers
//!
//! [`spawn_update_logger`] consumes a broadcast subscription and logs
//! standings and match updates as they arrive.

mod broadcast;
mod processor;
mod rest_proxy;

pub use broadcast::{BroadcastNotifier, Notification, DEFAULT_CHANNEL_CAPACITY};
pub use processor::spawn_update_logger;
pub use rest_proxy::{RestProxyConfig, RestProxyNotifier};
