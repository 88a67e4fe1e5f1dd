//! Shared utilities for release-indexer CLI binaries.

pub mod args;
pub mod format;
pub mod logging;

pub use args::LogLevel;
pub use format::{format_bytes, format_count, format_duration};
pub use logging::init_logging;
