//! ri-lister - object listing and tag enrichment for release-indexer.
//!
//! This crate provides the read side of an indexing run:
//!
//! - [`S3Bucket`]: paginated S3 listing and object tagging lookups
//! - [`MemorySource`]: in-memory object source with fault injection
//! - [`Enricher`]: lists a prefix and fetches tags for every object with
//!   bounded concurrency, retries and cancellation
//! - [`RetryConfig`] / [`with_retry`]: exponential backoff with jitter and an
//!   overall time ceiling

pub mod enrich;
pub mod memory;
pub mod retry;
pub mod s3;

pub use enrich::{EnrichConfig, Enricher};
pub use memory::MemorySource;
pub use retry::{RetryConfig, with_retry};
pub use s3::{S3Bucket, S3Config, create_s3_client};
