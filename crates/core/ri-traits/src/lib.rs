//! Capability traits for release-indexer.
//!
//! - [`ObjectSource`] - lists objects and fetches their tags from a backing store
//! - [`OutputFs`] - destination filesystem for rendered index artifacts
//!
//! The tree and render engines depend only on these traits, so the same code
//! runs against S3, local disk, or in-memory test doubles.

pub mod output;
pub mod source;

pub use output::{OutputFs, join_path};
pub use source::ObjectSource;
