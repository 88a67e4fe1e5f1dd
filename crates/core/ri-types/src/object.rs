//! Stored objects as returned by a listing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Key/value tags attached to an object.
pub type Tags = BTreeMap<String, String>;

/// One stored artifact from an object-storage listing.
///
/// Tags start empty and are attached once via [`Object::with_tags`] before the
/// object is placed into a tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Object {
    /// The object key (full `/`-delimited path within the bucket)
    key: String,

    /// Size of the object in bytes
    size: u64,

    /// Last modified timestamp
    #[serde(skip_serializing_if = "Option::is_none")]
    last_modified: Option<DateTime<Utc>>,

    /// Tags fetched for the object
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    tags: Tags,
}

impl Object {
    /// Create an untagged object.
    pub fn new(key: impl Into<String>, size: u64, last_modified: Option<DateTime<Utc>>) -> Self {
        Self {
            key: key.into(),
            size,
            last_modified,
            tags: Tags::new(),
        }
    }

    /// Create an object with only a key, mostly useful in tests.
    pub fn from_key(key: impl Into<String>) -> Self {
        Self::new(key, 0, None)
    }

    /// Attach fetched tags, consuming the untagged object.
    pub fn with_tags(mut self, tags: Tags) -> Self {
        self.tags = tags;
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn last_modified(&self) -> Option<DateTime<Utc>> {
        self.last_modified
    }

    pub fn tags(&self) -> &Tags {
        &self.tags
    }

    /// Look up a single tag value.
    pub fn tag(&self, name: &str) -> Option<&str> {
        self.tags.get(name).map(String::as_str)
    }

    /// The last path segment of the key.
    pub fn base_name(&self) -> &str {
        self.key
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or(&self.key)
    }
}
