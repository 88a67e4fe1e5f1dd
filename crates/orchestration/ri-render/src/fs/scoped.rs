//! Subdirectory view over another filesystem.

use std::sync::Arc;

use async_trait::async_trait;
use ri_error::Result;
use ri_traits::{OutputFs, join_path};

/// Resolves every path relative to `base` inside the wrapped filesystem.
#[derive(Clone)]
pub struct ScopedFs {
    inner: Arc<dyn OutputFs>,
    base: String,
}

impl ScopedFs {
    pub fn new(inner: Arc<dyn OutputFs>, base: impl AsRef<str>) -> Self {
        Self {
            inner,
            base: base.as_ref().trim_matches('/').to_string(),
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }
}

#[async_trait]
impl OutputFs for ScopedFs {
    async fn mkdir_all(&self, path: &str) -> Result<()> {
        self.inner.mkdir_all(&join_path(&self.base, path)).await
    }

    async fn write_file(&self, path: &str, contents: Vec<u8>) -> Result<()> {
        self.inner
            .write_file(&join_path(&self.base, path), contents)
            .await
    }

    fn description(&self) -> String {
        format!("{}/{}", self.inner.description().trim_end_matches('/'), self.base)
    }
}
