//! S3 bucket output.

use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::ServerSideEncryption;
use ri_error::{Result, RiError};
use ri_traits::{OutputFs, join_path};
use tracing::debug;

/// Cache lifetime attached to every uploaded index file.
pub const DEFAULT_CACHE_CONTROL: &str = "max-age=300";

/// Upload settings for [`S3OutputFs`].
#[derive(Debug, Clone)]
pub struct S3OutputConfig {
    pub bucket: String,

    /// Key prefix all files are written under
    pub prefix: String,

    /// Server-side encryption algorithm, e.g. `aws:kms` or `AES256`
    pub server_side_encryption: Option<String>,

    pub cache_control: String,
}

impl S3OutputConfig {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            prefix: String::new(),
            server_side_encryption: None,
            cache_control: DEFAULT_CACHE_CONTROL.to_string(),
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Enable server-side encryption. An empty value disables it.
    pub fn with_server_side_encryption(mut self, sse: impl Into<String>) -> Self {
        let sse = sse.into();
        self.server_side_encryption = (!sse.is_empty()).then_some(sse);
        self
    }

    pub fn with_cache_control(mut self, cache_control: impl Into<String>) -> Self {
        self.cache_control = cache_control.into();
        self
    }
}

/// Writes index files as S3 objects.
///
/// Directories do not exist in S3, so `mkdir_all` succeeds without a request.
#[derive(Debug, Clone)]
pub struct S3OutputFs {
    client: Client,
    config: S3OutputConfig,
}

impl S3OutputFs {
    pub fn new(client: Client, config: S3OutputConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &S3OutputConfig {
        &self.config
    }

    fn key(&self, path: &str) -> String {
        join_path(&self.config.prefix, path)
    }
}

#[async_trait]
impl OutputFs for S3OutputFs {
    async fn mkdir_all(&self, _path: &str) -> Result<()> {
        Ok(())
    }

    async fn write_file(&self, path: &str, contents: Vec<u8>) -> Result<()> {
        let key = self.key(path);
        let len = contents.len();

        let mut req = self
            .client
            .put_object()
            .bucket(&self.config.bucket)
            .key(&key)
            .content_type(content_type(&key))
            .cache_control(&self.config.cache_control)
            .body(ByteStream::from(contents));

        if let Some(sse) = &self.config.server_side_encryption {
            req = req
                .server_side_encryption(ServerSideEncryption::from(sse.as_str()))
                .bucket_key_enabled(true);
        }

        req.send().await.map_err(|e| {
            RiError::fs(
                format!("s3://{}/{key}", self.config.bucket),
                DisplayErrorContext(&e),
            )
        })?;

        debug!(bucket = %self.config.bucket, key = %key, bytes = len, "Uploaded file");
        Ok(())
    }

    fn description(&self) -> String {
        format!("s3://{}/{}", self.config.bucket, self.config.prefix.trim_matches('/'))
    }
}

/// MIME type for an index or asset file name.
pub fn content_type(path: &str) -> &'static str {
    let ext = path.rsplit_once('.').map(|(_, ext)| ext).unwrap_or_default();
    match ext.to_ascii_lowercase().as_str() {
        "html" | "htm" => "text/html; charset=utf-8",
        "json" => "application/json",
        "css" => "text/css; charset=utf-8",
        "js" => "text/javascript; charset=utf-8",
        "svg" => "image/svg+xml",
        "png" => "image/png",
        "ico" => "image/x-icon",
        "txt" => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type() {
        assert_eq!(content_type("a/index.html"), "text/html; charset=utf-8");
        assert_eq!(content_type("index.JSON"), "application/json");
        assert_eq!(content_type("README"), "application/octet-stream");
    }

    #[test]
    fn test_output_config() {
        let config = S3OutputConfig::new("site")
            .with_prefix("releases/")
            .with_server_side_encryption("aws:kms");

        assert_eq!(config.cache_control, "max-age=300");
        assert_eq!(config.server_side_encryption.as_deref(), Some("aws:kms"));

        let config = config.with_server_side_encryption("");
        assert!(config.server_side_encryption.is_none());
    }
}
