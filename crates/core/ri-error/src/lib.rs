//! Error types and classification for release-indexer.
//!
//! This crate provides:
//! - [`RiError`] - Top-level error enum for listing, enrichment and rendering
//! - [`ErrorCategory`] for retry decision making
//! - [`classify_message`] mapping object-store error text to a category
//! - [`Retryable`] for errors that carry such text next to other context

use thiserror::Error;

/// Top-level error type for release-indexer.
#[derive(Error, Debug)]
pub enum RiError {
    /// Listing the backing store failed; fatal to the whole run.
    #[error("Listing failed: {0}")]
    Listing(String),

    /// Fetching tags for a single object failed after retries.
    #[error("Tag fetch failed for {key}: {message}")]
    TagFetch { key: String, message: String },

    /// One or more objects could not be enriched with tags.
    #[error("Enrichment failed for {failed} of {total} objects (first: {first})")]
    Enrichment {
        failed: usize,
        total: usize,
        first: String,
    },

    /// One or more subtrees failed to render.
    #[error("Rendering failed for {failed} targets (first: {first})")]
    Render { failed: usize, first: String },

    /// Destination filesystem operation failed
    #[error("Filesystem error at '{path}': {message}")]
    Fs { path: String, message: String },

    /// Template lookup or execution failed
    #[error("Template error: {0}")]
    Template(String),

    /// Index document serialization failed
    #[error("Serialization failed: {0}")]
    Serialize(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// The governing cancellation token fired.
    #[error("Operation cancelled")]
    Cancelled,

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic errors (wrapped anyhow)
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RiError {
    /// Build a filesystem error for the given path.
    pub fn fs(path: impl Into<String>, message: impl ToString) -> Self {
        Self::Fs {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Build an aggregate render error from collected failures.
    ///
    /// Returns `None` when nothing failed.
    pub fn render_aggregate(errors: &[RiError]) -> Option<Self> {
        let first = errors.first()?;
        Some(Self::Render {
            failed: errors.len(),
            first: first.to_string(),
        })
    }
}

/// Error classification for retry decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Transient error - retry with exponential backoff
    ///
    /// Examples: network timeout, S3 throttling, 503
    Transient,

    /// Permanent error - never retry
    ///
    /// Examples: access denied, missing key, bad configuration
    Permanent,
}

/// Classify a raw error message coming back from the object store.
///
/// Unknown errors are treated as transient.
pub fn classify_message(message: &str) -> ErrorCategory {
    let lower = message.to_lowercase();

    if lower.contains("slowdown")
        || lower.contains("toomanyrequests")
        || lower.contains("throttl")
        || lower.contains("service unavailable")
        || lower.contains("500")
        || lower.contains("502")
        || lower.contains("503")
        || lower.contains("504")
        || lower.contains("timeout")
        || lower.contains("connection reset")
        || lower.contains("connection refused")
    {
        return ErrorCategory::Transient;
    }

    if lower.contains("nosuchkey")
        || lower.contains("nosuchbucket")
        || lower.contains("accessdenied")
        || lower.contains("invalidrequest")
        || lower.contains("403")
        || lower.contains("404")
        || lower.contains("400")
    {
        return ErrorCategory::Permanent;
    }

    ErrorCategory::Transient
}

/// Errors that know whether retrying them can help.
pub trait Retryable {
    fn category(&self) -> ErrorCategory;
}

impl Retryable for RiError {
    /// Only the store's own message is classified. Keys and prefixes carried
    /// alongside it are never inspected.
    fn category(&self) -> ErrorCategory {
        match self {
            Self::Listing(message)
            | Self::TagFetch { message, .. }
            | Self::Fs { message, .. } => classify_message(message),
            Self::Io(e) => match e.kind() {
                std::io::ErrorKind::TimedOut
                | std::io::ErrorKind::Interrupted
                | std::io::ErrorKind::ConnectionReset => ErrorCategory::Transient,
                _ => ErrorCategory::Permanent,
            },
            Self::Enrichment { .. }
            | Self::Render { .. }
            | Self::Template(_)
            | Self::Serialize(_)
            | Self::Config(_)
            | Self::Cancelled => ErrorCategory::Permanent,
            Self::Other(e) => classify_message(&e.to_string()),
        }
    }
}

impl Retryable for String {
    fn category(&self) -> ErrorCategory {
        classify_message(self)
    }
}

impl Retryable for &str {
    fn category(&self) -> ErrorCategory {
        classify_message(self)
    }
}

/// Result type alias using RiError.
pub type Result<T> = std::result::Result<T, RiError>;
