//! Core data types for release-indexer.
//!
//! - [`Object`] - one entry of an object-storage listing plus its tags
//! - [`IndexConfig`] / [`MetadataSource`] - how release metadata is derived

pub mod config;
pub mod object;

pub use config::{DEFAULT_KEY_PATTERN, IndexConfig, MetadataSource, TagNames};
pub use object::{Object, Tags};
