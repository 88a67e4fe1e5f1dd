//! Destination filesystem trait.

use async_trait::async_trait;
use ri_error::Result;

/// Filesystem abstraction receiving rendered index files.
///
/// Paths are `/`-separated and relative to the filesystem root. An empty path
/// refers to the root itself.
#[async_trait]
pub trait OutputFs: Send + Sync {
    /// Create a directory and all of its parents. Idempotent.
    async fn mkdir_all(&self, path: &str) -> Result<()>;

    /// Create or truncate `path` and write `contents` to it.
    async fn write_file(&self, path: &str, contents: Vec<u8>) -> Result<()>;

    /// Human-readable description for logging.
    fn description(&self) -> String;
}

/// Join two relative paths with a single `/`, ignoring empty components.
pub fn join_path(base: &str, path: &str) -> String {
    let base = base.trim_matches('/');
    let path = path.trim_matches('/');

    match (base.is_empty(), path.is_empty()) {
        (true, _) => path.to_string(),
        (false, true) => base.to_string(),
        (false, false) => format!("{base}/{path}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_path() {
        assert_eq!(join_path("", "index.html"), "index.html");
        assert_eq!(join_path("a", ""), "a");
        assert_eq!(join_path("a/", "/b"), "a/b");
        assert_eq!(join_path("/", "a"), "a");
        assert_eq!(join_path("a/b", "c/index.json"), "a/b/c/index.json");
    }
}
