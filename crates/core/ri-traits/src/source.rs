//! Object source trait.

use async_trait::async_trait;
use ri_error::Result;
use ri_types::{Object, Tags};

/// A backing store that can list objects and fetch their tags.
///
/// # Implementations
///
/// - S3 bucket: paginated `ListObjectsV2` plus `GetObjectTagging`
/// - In-memory source: used by tests and local runs
#[async_trait]
pub trait ObjectSource: Send + Sync {
    /// Lists every object under `prefix`, following pagination internally.
    ///
    /// Returned objects carry key, size and last-modified but no tags.
    /// An error means the listing could not be completed.
    async fn list_objects(&self, prefix: &str) -> Result<Vec<Object>>;

    /// Fetches the tag set for a single key.
    async fn fetch_tags(&self, key: &str) -> Result<Tags>;
}
