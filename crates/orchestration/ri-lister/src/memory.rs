//! In-memory object source.
//!
//! Serves a fixed set of objects and tags. Faults and latency can be injected
//! per key, and the number of concurrent tag fetches is tracked.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use ri_error::{Result, RiError};
use ri_traits::ObjectSource;
use ri_types::{Object, Tags};

#[derive(Debug, Clone)]
enum Fault {
    /// Fail this many times with `message`, then succeed
    Failing { remaining: u32, message: String },
    Permanent,
}

/// An [`ObjectSource`] backed by memory.
#[derive(Debug, Default)]
pub struct MemorySource {
    objects: BTreeMap<String, (Object, Tags)>,
    faults: Mutex<HashMap<String, Fault>>,
    list_failure: Option<String>,
    fetch_delay: Option<Duration>,
    fetch_calls: Mutex<HashMap<String, u32>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an untagged object.
    pub fn with_object(self, key: impl Into<String>) -> Self {
        self.with_tagged_object(key, Tags::new())
    }

    /// Add an object whose tags are served by `fetch_tags`.
    pub fn with_tagged_object(mut self, key: impl Into<String>, tags: Tags) -> Self {
        let key = key.into();
        self.objects
            .insert(key.clone(), (Object::from_key(key), tags));
        self
    }

    /// Add many untagged objects.
    pub fn with_objects<I, S>(self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        keys.into_iter().fold(self, |source, key| source.with_object(key))
    }

    /// Fail the first `times` tag fetches for `key` with a throttling error.
    pub fn with_transient_failures(self, key: impl Into<String>, times: u32) -> Self {
        self.with_failures(key, times, "SlowDown: please reduce your request rate")
    }

    /// Fail the first `times` tag fetches for `key` with `message`.
    pub fn with_failures(
        self,
        key: impl Into<String>,
        times: u32,
        message: impl Into<String>,
    ) -> Self {
        self.faults.lock().insert(
            key.into(),
            Fault::Failing {
                remaining: times,
                message: message.into(),
            },
        );
        self
    }

    /// Fail every tag fetch for `key` with an access error.
    pub fn with_permanent_failure(self, key: impl Into<String>) -> Self {
        self.faults.lock().insert(key.into(), Fault::Permanent);
        self
    }

    /// Make every listing fail with `message`.
    pub fn with_list_failure(mut self, message: impl Into<String>) -> Self {
        self.list_failure = Some(message.into());
        self
    }

    /// Sleep this long inside every tag fetch.
    pub fn with_fetch_delay(mut self, delay: Duration) -> Self {
        self.fetch_delay = Some(delay);
        self
    }

    /// Highest number of tag fetches observed running at once.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Number of tag fetch attempts made for `key`.
    pub fn fetch_calls(&self, key: &str) -> u32 {
        self.fetch_calls.lock().get(key).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    fn check_fault(&self, key: &str) -> Result<()> {
        let mut faults = self.faults.lock();
        match faults.get_mut(key) {
            Some(Fault::Permanent) => Err(RiError::TagFetch {
                key: key.to_string(),
                message: "AccessDenied: tagging not permitted".to_string(),
            }),
            Some(Fault::Failing { remaining, message }) if *remaining > 0 => {
                *remaining -= 1;
                Err(RiError::TagFetch {
                    key: key.to_string(),
                    message: message.clone(),
                })
            }
            _ => Ok(()),
        }
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl ObjectSource for MemorySource {
    async fn list_objects(&self, prefix: &str) -> Result<Vec<Object>> {
        if let Some(message) = &self.list_failure {
            return Err(RiError::Listing(message.clone()));
        }

        Ok(self
            .objects
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(_, (obj, _))| obj.clone())
            .collect())
    }

    async fn fetch_tags(&self, key: &str) -> Result<Tags> {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        let _guard = InFlight(&self.in_flight);
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        *self.fetch_calls.lock().entry(key.to_string()).or_default() += 1;

        if let Some(delay) = self.fetch_delay {
            tokio::time::sleep(delay).await;
        }

        self.check_fault(key)?;

        self.objects
            .get(key)
            .map(|(_, tags)| tags.clone())
            .ok_or_else(|| RiError::TagFetch {
                key: key.to_string(),
                message: "NoSuchKey".to_string(),
            })
    }
}
