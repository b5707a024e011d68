//! Freshness-checked cache in front of the persistent store.

use std::future::Future;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, info, instrument, warn};

use touchline_core::{
    CacheCategory, CachePolicy, Clock, Envelope, MetadataValue, Notifier, PersistentStore,
    QueryDescriptor, Result, StoreRecord, SystemClock, TouchlineError, Validity,
};

use crate::metrics::{CacheMetrics, CacheStats};

/// Cache-through reader for dashboard data.
///
/// Stateless apart from its collaborators: the snapshots live in the store,
/// the counters in the shared [`CacheMetrics`].
pub struct FreshnessCache {
    store: Arc<dyn PersistentStore>,
    notifier: Option<Arc<dyn Notifier>>,
    policy: CachePolicy,
    metrics: Arc<CacheMetrics>,
    clock: Arc<dyn Clock>,
}

impl FreshnessCache {
    /// Creates a cache over `store` using the wall clock and no notifier.
    pub fn new(
        store: Arc<dyn PersistentStore>,
        policy: CachePolicy,
        metrics: Arc<CacheMetrics>,
    ) -> Self {
        Self {
            store,
            notifier: None,
            policy,
            metrics,
            clock: Arc::new(SystemClock),
        }
    }

    /// Publishes fresh data through `notifier`.
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Replaces the time source.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Per-category policy in effect.
    pub fn policy(&self) -> &CachePolicy {
        &self.policy
    }

    /// Shared counters.
    pub fn metrics(&self) -> &Arc<CacheMetrics> {
        &self.metrics
    }

    /// Snapshot of the counters.
    pub fn stats(&self) -> CacheStats {
        self.metrics.snapshot()
    }

    /// Underlying store, for search and statistics.
    pub fn store(&self) -> &Arc<dyn PersistentStore> {
        &self.store
    }

    /// Returns fresh data for `category`, from the store if a valid snapshot
    /// exists, otherwise from `fetch_fn`.
    ///
    /// On a miss the fetched payload is wrapped in an [`Envelope`], written
    /// with the record produced by `store_fn`, and published on the
    /// category topic. Remote, store-write and publish failures are logged
    /// and never surface: the result is `Ok(Some(_))` with fresh data,
    /// `Ok(None)` when nothing could be fetched, or a configuration error.
    pub async fn fetch<T, F, Fut, S>(
        &self,
        category: CacheCategory,
        query_key: &str,
        fetch_fn: F,
        store_fn: S,
    ) -> Result<Option<T>>
    where
        T: Serialize + DeserializeOwned + Send,
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<Option<T>>> + Send,
        S: FnOnce(&T) -> StoreRecord + Send,
    {
        self.fetch_where(category, query_key, fetch_fn, store_fn, |_: &T| true)
            .await
    }

    /// Like [`fetch`](Self::fetch), but a valid snapshot only counts as a hit
    /// if `accept` also holds for its payload.
    ///
    /// Store lookups are approximate; `accept` lets callers reject the
    /// nearest snapshot when it belongs to another key (another match id,
    /// another team).
    #[instrument(skip(self, fetch_fn, store_fn, accept), fields(category = %category))]
    pub async fn fetch_where<T, F, Fut, S, A>(
        &self,
        category: CacheCategory,
        query_key: &str,
        fetch_fn: F,
        store_fn: S,
        accept: A,
    ) -> Result<Option<T>>
    where
        T: Serialize + DeserializeOwned + Send,
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<Option<T>>> + Send,
        S: FnOnce(&T) -> StoreRecord + Send,
        A: FnOnce(&T) -> bool + Send,
    {
        if let Some(data) = self.probe::<T>(category, query_key).await? {
            if accept(&data) {
                self.metrics.record_hit();
                info!("Using cached {} data", category);
                return Ok(Some(data));
            }
            debug!("Nearest cached {} entry is for another key", category);
        }

        self.metrics.record_miss();
        self.metrics.record_api_call();
        info!("Fetching fresh {} data", category);

        let data = match fetch_fn().await {
            Ok(Some(data)) => data,
            Ok(None) => {
                info!("Remote source returned no {} data", category);
                return Ok(None);
            }
            Err(e) => {
                warn!(error = %e, "Remote fetch failed");
                return Ok(None);
            }
        };

        let payload = match serde_json::to_value(&data) {
            Ok(payload) if is_blank(&payload) => {
                info!("Remote source returned an empty {} payload", category);
                return Ok(None);
            }
            Ok(payload) => payload,
            Err(e) => {
                warn!(error = %e, "Fetched payload could not be serialized");
                return Ok(None);
            }
        };

        let policy = self.policy.get(category);
        let envelope = Envelope::new(payload, policy.version.clone(), self.clock.now());
        let record = store_fn(&data);
        let publish_key = record.publish_key.clone();

        if let Err(e) = self.persist(category, record, &envelope).await {
            error!(error = %e, "Failed to store fresh {} data", category);
        }

        if let (Some(topic), Some(notifier)) = (policy.topic.as_deref(), &self.notifier) {
            let value = envelope_value(&envelope);
            if let Err(e) = notifier.publish(topic, &publish_key, &value).await {
                let e = match e {
                    e @ TouchlineError::Notify { .. } => e,
                    other => TouchlineError::Notify {
                        topic: topic.to_string(),
                        reason: other.to_string(),
                    },
                };
                error!(error = %e, "Failed to publish {} update", category);
            } else {
                debug!(topic, key = %publish_key, "Published update");
            }
        }

        Ok(Some(data))
    }

    /// Like [`fetch`](Self::fetch) but takes the category by name.
    ///
    /// Unknown names fail with a configuration error before anything is
    /// probed or fetched.
    pub async fn fetch_named<T, F, Fut, S>(
        &self,
        category: &str,
        query_key: &str,
        fetch_fn: F,
        store_fn: S,
    ) -> Result<Option<T>>
    where
        T: Serialize + DeserializeOwned + Send,
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<Option<T>>> + Send,
        S: FnOnce(&T) -> StoreRecord + Send,
    {
        let category: CacheCategory = category.parse()?;
        self.fetch(category, query_key, fetch_fn, store_fn).await
    }

    /// Looks up the nearest snapshot and returns its payload if it is valid.
    async fn probe<T: DeserializeOwned>(
        &self,
        category: CacheCategory,
        query_key: &str,
    ) -> Result<Option<T>> {
        let query = QueryDescriptor::probe(category, query_key);
        let docs = match self.store.query(&query).await {
            Ok(docs) => docs,
            Err(e) if e.is_configuration_error() => return Err(e),
            Err(e) => {
                warn!(error = %e, "Store probe failed, treating as miss");
                return Ok(None);
            }
        };

        let Some(doc) = docs.into_iter().next() else {
            debug!("No cached {} document", category);
            return Ok(None);
        };

        let key = category.envelope_key();
        let Some(raw) = doc.meta_str(key) else {
            let e = TouchlineError::EnvelopeParse {
                key: key.into(),
                reason: "missing envelope field".into(),
            };
            warn!(error = %e, doc_id = %doc.id, "Cached document has no envelope");
            return Ok(None);
        };

        let envelope = match Envelope::<T>::from_json_str(category, raw) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(error = %e, doc_id = %doc.id, "Discarding unreadable cache entry");
                return Ok(None);
            }
        };

        match envelope.validity(self.policy.get(category), self.clock.now()) {
            Validity::Valid => Ok(Some(envelope.data)),
            Validity::Expired { age_secs } => {
                debug!(age_secs, "Cached {} data expired", category);
                Ok(None)
            }
            Validity::VersionMismatch { found, expected } => {
                debug!(%found, %expected, "Cached {} data has another version", category);
                Ok(None)
            }
        }
    }

    async fn persist(
        &self,
        category: CacheCategory,
        mut record: StoreRecord,
        envelope: &Envelope<Value>,
    ) -> Result<()> {
        let raw = envelope.to_json_string()?;
        record
            .metadata
            .insert(category.envelope_key().to_string(), MetadataValue::Str(raw));
        let id = record.id.clone();

        self.store
            .upsert(category, record)
            .await
            .map_err(|e| match e {
                e @ TouchlineError::Persistence(_) => e,
                other => TouchlineError::Persistence(other.to_string()),
            })?;

        debug!(id = %id, "Stored fresh {} data", category);
        Ok(())
    }
}

fn envelope_value(envelope: &Envelope<Value>) -> Value {
    serde_json::json!({
        "data": envelope.data,
        "version": envelope.version,
        "timestamp": envelope.timestamp,
    })
}

/// Null and empty containers/strings count as "no data".
fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Array(items) => items.is_empty(),
        Value::Object(fields) => fields.is_empty(),
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}
