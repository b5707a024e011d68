//! Store documents, records and query descriptors.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::constants::CACHE_PROBE_TOP_K;
use crate::types::CacheCategory;

/// Scalar metadata value. Stores only accept flat scalar metadata.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    /// Boolean flag.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Floating point value.
    Float(f64),
    /// String value (also used for serialized envelopes).
    Str(String),
}

impl MetadataValue {
    /// Returns the string content, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetadataValue::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for MetadataValue {
    fn from(v: &str) -> Self {
        MetadataValue::Str(v.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(v: String) -> Self {
        MetadataValue::Str(v)
    }
}

impl From<i64> for MetadataValue {
    fn from(v: i64) -> Self {
        MetadataValue::Int(v)
    }
}

impl From<u64> for MetadataValue {
    fn from(v: u64) -> Self {
        i64::try_from(v)
            .map(MetadataValue::Int)
            .unwrap_or_else(|_| MetadataValue::Str(v.to_string()))
    }
}

impl From<f64> for MetadataValue {
    fn from(v: f64) -> Self {
        MetadataValue::Float(v)
    }
}

impl From<bool> for MetadataValue {
    fn from(v: bool) -> Self {
        MetadataValue::Bool(v)
    }
}

/// Document metadata.
pub type Metadata = BTreeMap<String, MetadataValue>;

/// A write request produced by a cache `store_fn`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StoreRecord {
    /// Document id; an existing id is replaced.
    pub id: String,
    /// Searchable document text(s). The first one is the lookup key text;
    /// envelope lookups rank on it alone.
    pub documents: Vec<String>,
    /// Scalar metadata for filtering.
    pub metadata: Metadata,
    /// Key used when announcing the record on the notifier.
    pub publish_key: String,
}

impl StoreRecord {
    /// Creates a record with a single document. The publish key defaults to the id.
    pub fn new(id: impl Into<String>, document: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            publish_key: id.clone(),
            id,
            documents: vec![document.into()],
            metadata: Metadata::new(),
        }
    }

    /// Adds a metadata field.
    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<MetadataValue>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Appends a detail document after the key text.
    pub fn with_document(mut self, document: impl Into<String>) -> Self {
        self.documents.push(document.into());
        self
    }

    /// Overrides the notification key.
    pub fn with_publish_key(mut self, key: impl Into<String>) -> Self {
        self.publish_key = key.into();
        self
    }

    /// Text the store indexes for similarity lookup.
    pub fn text(&self) -> String {
        self.documents.join("\n")
    }
}

/// A document returned by a store query.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StoredDocument {
    /// Document id.
    pub id: String,
    /// Document text.
    pub document: String,
    /// Stored metadata.
    pub metadata: Metadata,
    /// Similarity to the query in `[0, 1]`, higher is closer.
    pub score: f64,
}

impl StoredDocument {
    /// Returns a string metadata field.
    pub fn meta_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(MetadataValue::as_str)
    }
}

/// What the cache asks the store for.
///
/// The store performs an approximate lookup, so the result may not be the
/// document written for `text`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryDescriptor {
    /// Collection to search.
    pub collection: String,
    /// Free-text query.
    pub text: String,
    /// Number of results wanted.
    pub top_k: usize,
    /// Only consider documents carrying this metadata key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_key: Option<String>,
}

impl QueryDescriptor {
    /// Probe for the single nearest document holding a category's envelope.
    pub fn probe(category: CacheCategory, text: impl Into<String>) -> Self {
        Self {
            collection: category.collection().to_string(),
            text: text.into(),
            top_k: CACHE_PROBE_TOP_K,
            has_key: Some(category.envelope_key().to_string()),
        }
    }

    /// Free-text search over any collection.
    pub fn search(collection: impl Into<String>, text: impl Into<String>, top_k: usize) -> Self {
        Self {
            collection: collection.into(),
            text: text.into(),
            top_k,
            has_key: None,
        }
    }
}
