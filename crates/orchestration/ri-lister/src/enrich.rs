//! Listing with concurrent tag enrichment.

use std::sync::Arc;
use std::time::Instant;

use ri_error::{Result, RiError};
use ri_traits::ObjectSource;
use ri_types::{Object, Tags};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::retry::{RetryConfig, with_retry};

/// Configuration for tag enrichment.
#[derive(Debug, Clone)]
pub struct EnrichConfig {
    /// Maximum number of tag fetches in flight
    pub max_concurrent_fetches: usize,

    /// Retry policy for each fetch
    pub retry: RetryConfig,
}

impl Default for EnrichConfig {
    fn default() -> Self {
        Self {
            max_concurrent_fetches: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
            retry: RetryConfig::default(),
        }
    }
}

impl EnrichConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the fetch concurrency. Zero is treated as one.
    pub fn with_max_concurrent_fetches(mut self, max: usize) -> Self {
        self.max_concurrent_fetches = max.max(1);
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }
}

/// Lists objects and attaches their tags.
pub struct Enricher {
    source: Arc<dyn ObjectSource>,
    config: EnrichConfig,
}

impl Enricher {
    pub fn new(source: Arc<dyn ObjectSource>, config: EnrichConfig) -> Self {
        Self { source, config }
    }

    pub fn config(&self) -> &EnrichConfig {
        &self.config
    }

    /// List `prefix` without fetching tags.
    pub async fn list_objects(&self, prefix: &str) -> Result<Vec<Object>> {
        self.source.list_objects(prefix).await.map_err(listing_error)
    }

    /// List `prefix` and fetch tags for every object.
    ///
    /// All fetches are awaited before returning, even when some fail. Any
    /// failed object turns the whole call into [`RiError::Enrichment`]; the
    /// listing order is preserved on success.
    pub async fn list_objects_with_tags(
        &self,
        prefix: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<Object>> {
        let started = Instant::now();
        let objects = self.list_objects(prefix).await?;
        let total = objects.len();

        debug!(
            prefix,
            total,
            concurrency = self.config.max_concurrent_fetches,
            "Fetching tags"
        );

        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent_fetches.max(1)));
        let mut tasks: JoinSet<(usize, Result<Tags>)> = JoinSet::new();
        let mut failures: Vec<(usize, RiError)> = Vec::new();

        for (idx, obj) in objects.iter().enumerate() {
            let permit = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                permit = Arc::clone(&semaphore).acquire_owned() => permit.ok(),
            };

            let Some(permit) = permit else {
                failures.push((idx, tag_fetch_error(obj.key(), RiError::Cancelled)));
                continue;
            };

            let source = Arc::clone(&self.source);
            let retry = self.config.retry.clone();
            let cancel = cancel.clone();
            let key = obj.key().to_string();

            tasks.spawn(async move {
                let _permit = permit;

                let result = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => Err(RiError::Cancelled),
                    result = with_retry(&retry, "fetch_tags", || source.fetch_tags(&key)) => result,
                };

                match &result {
                    Ok(tags) => debug!(key = %key, tags = tags.len(), "Fetched tags"),
                    Err(e) => warn!(key = %key, error = %e, "Tag fetch failed"),
                }

                (idx, result.map_err(|e| tag_fetch_error(&key, e)))
            });
        }

        let mut fetched: Vec<Option<Tags>> = vec![None; total];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((idx, Ok(tags))) => fetched[idx] = Some(tags),
                Ok((idx, Err(e))) => failures.push((idx, e)),
                Err(e) => failures.push((
                    total,
                    RiError::TagFetch {
                        key: String::new(),
                        message: format!("fetch task failed: {e}"),
                    },
                )),
            }
        }

        if !failures.is_empty() {
            failures.sort_by_key(|(idx, _)| *idx);
            let failed = failures.len();
            let first = failures.swap_remove(0).1.to_string();

            warn!(
                prefix,
                failed,
                total,
                elapsed_ms = started.elapsed().as_millis(),
                "Tag enrichment incomplete"
            );
            return Err(RiError::Enrichment {
                failed,
                total,
                first,
            });
        }

        info!(
            prefix,
            objects = total,
            elapsed_ms = started.elapsed().as_millis(),
            "Tag enrichment complete"
        );

        Ok(objects
            .into_iter()
            .zip(fetched)
            .map(|(obj, tags)| obj.with_tags(tags.unwrap_or_default()))
            .collect())
    }
}

fn listing_error(e: RiError) -> RiError {
    match e {
        RiError::Listing(_) => e,
        other => RiError::Listing(other.to_string()),
    }
}

fn tag_fetch_error(key: &str, e: RiError) -> RiError {
    match e {
        RiError::TagFetch { .. } => e,
        other => RiError::TagFetch {
            key: key.to_string(),
            message: other.to_string(),
        },
    }
}
