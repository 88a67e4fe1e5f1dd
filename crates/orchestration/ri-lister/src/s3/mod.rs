//! S3-backed object source.
//!
//! - Client configuration with LocalStack support
//! - Paginated object listing with streaming
//! - Object tag lookups

mod bucket;
mod client;

pub use bucket::S3Bucket;
pub use client::{S3Config, create_s3_client};
