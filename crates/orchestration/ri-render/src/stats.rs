//! Statistics for render runs.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters updated concurrently while a tree is rendered.
#[derive(Debug, Default)]
pub struct RenderStats {
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,

    /// Directories whose index files were attempted
    directories: AtomicU64,

    files_written: AtomicU64,
    bytes_written: AtomicU64,

    /// Directory creations and file writes that failed
    failures: AtomicU64,
}

impl RenderStats {
    /// Create a new stats tracker with the current time as start time.
    pub fn new() -> Self {
        Self {
            started_at: Some(Utc::now()),
            ..Default::default()
        }
    }

    pub fn complete(&mut self) {
        self.completed_at = Some(Utc::now());
    }

    pub fn record_directory(&self) {
        self.directories.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_file(&self, bytes: u64) {
        self.files_written.fetch_add(1, Ordering::Relaxed);
        self.bytes_written.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn directories(&self) -> u64 {
        self.directories.load(Ordering::Relaxed)
    }

    pub fn files_written(&self) -> u64 {
        self.files_written.load(Ordering::Relaxed)
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written.load(Ordering::Relaxed)
    }

    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    pub fn duration(&self) -> Option<Duration> {
        match (self.started_at, self.completed_at) {
            (Some(start), Some(end)) => Some(end - start),
            (Some(start), None) => Some(Utc::now() - start),
            _ => None,
        }
    }

    pub fn summary(&self) -> RenderSummary {
        RenderSummary {
            started_at: self.started_at,
            completed_at: self.completed_at,
            directories: self.directories(),
            files_written: self.files_written(),
            bytes_written: self.bytes_written(),
            failures: self.failures(),
        }
    }
}

/// A serializable snapshot of render statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderSummary {
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub directories: u64,
    pub files_written: u64,
    pub bytes_written: u64,
    pub failures: u64,
}

impl RenderSummary {
    pub fn duration_secs(&self) -> f64 {
        match (self.started_at, self.completed_at) {
            (Some(start), Some(end)) => (end - start).num_milliseconds() as f64 / 1000.0,
            _ => 0.0,
        }
    }
}
