//! Integration tests for release-indexer.
//!
//! The pipeline tests run entirely in memory. Tests that talk to S3 need
//! LocalStack and are marked `#[ignore]`.
//!
//! ## Running the S3 tests
//!
//! ```bash
//! LOCALSTACK_ENDPOINT=http://localhost:4566 cargo test -p integration-tests -- --ignored
//! ```

mod common;
mod pipeline_test;
mod s3_test;
