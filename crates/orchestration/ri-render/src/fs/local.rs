//! Local directory output.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use ri_error::{Result, RiError};
use ri_traits::OutputFs;
use tracing::debug;

/// Writes index files below a local root directory.
#[derive(Debug, Clone)]
pub struct LocalFs {
    root: PathBuf,
}

impl LocalFs {
    /// Use `root` as the output directory, creating it if needed.
    pub async fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root)
            .await
            .map_err(|e| RiError::fs(root.display().to_string(), e))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> Result<PathBuf> {
        let relative = Path::new(path.trim_start_matches('/'));
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return Err(RiError::fs(path, "path escapes output directory"));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl OutputFs for LocalFs {
    async fn mkdir_all(&self, path: &str) -> Result<()> {
        let dir = self.resolve(path)?;
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| RiError::fs(path, e))
    }

    async fn write_file(&self, path: &str, contents: Vec<u8>) -> Result<()> {
        let file = self.resolve(path)?;
        let len = contents.len();
        tokio::fs::write(&file, contents)
            .await
            .map_err(|e| RiError::fs(path, e))?;

        debug!(path = %file.display(), bytes = len, "Wrote file");
        Ok(())
    }

    fn description(&self) -> String {
        self.root.display().to_string()
    }
}
