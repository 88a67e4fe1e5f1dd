//! Static asset copying.
//!
//! Stylesheets, scripts and images referenced by custom templates live under
//! a `static/` directory of an asset root. Before rendering, every file below
//! that directory is copied to the destination, keeping its `static/...` path.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::error::DisplayErrorContext;
use futures::stream::{self, StreamExt};
use ri_error::{Result, RiError};
use ri_traits::{OutputFs, join_path};
use tracing::{debug, info};
use walkdir::WalkDir;

/// Subdirectory of an asset root that gets copied.
pub const STATIC_DIR: &str = "static";

/// A tree of asset files addressed by `/`-separated relative paths.
#[async_trait]
pub trait AssetSource: Send + Sync {
    /// Relative paths of every file below `dir`, including the `dir` prefix.
    async fn list_files(&self, dir: &str) -> Result<Vec<String>>;

    async fn read_file(&self, path: &str) -> Result<Vec<u8>>;

    fn description(&self) -> String;
}

/// Assets read from a local directory.
#[derive(Debug, Clone)]
pub struct LocalAssets {
    root: PathBuf,
}

impl LocalAssets {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl AssetSource for LocalAssets {
    async fn list_files(&self, dir: &str) -> Result<Vec<String>> {
        let root = self.root.clone();
        let start = root.join(dir.trim_matches('/'));
        if !start.is_dir() {
            return Ok(Vec::new());
        }

        tokio::task::spawn_blocking(move || -> Result<Vec<String>> {
            let mut files = Vec::new();
            for entry in WalkDir::new(&start).sort_by_file_name() {
                let entry = entry.map_err(|e| RiError::fs(start.display().to_string(), e))?;
                if !entry.file_type().is_file() {
                    continue;
                }
                let Ok(relative) = entry.path().strip_prefix(&root) else {
                    continue;
                };
                let path: Vec<String> = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect();
                files.push(path.join("/"));
            }
            Ok(files)
        })
        .await
        .map_err(|e| RiError::Io(std::io::Error::other(e)))?
    }

    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        tokio::fs::read(self.root.join(path))
            .await
            .map_err(|e| RiError::fs(path, e))
    }

    fn description(&self) -> String {
        self.root.display().to_string()
    }
}

/// Assets read from a bucket prefix.
#[derive(Debug, Clone)]
pub struct S3Assets {
    client: Client,
    bucket: String,
    prefix: String,
}

impl S3Assets {
    pub fn new(client: Client, bucket: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            prefix: prefix.into().trim_matches('/').to_string(),
        }
    }

    /// Build from an `s3://bucket/prefix` URL.
    pub fn from_url(client: Client, url: &str) -> Result<Self> {
        let (bucket, prefix) = parse_s3_url(url)?;
        Ok(Self::new(client, bucket, prefix))
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn key(&self, path: &str) -> String {
        join_path(&self.prefix, path)
    }
}

#[async_trait]
impl AssetSource for S3Assets {
    async fn list_files(&self, dir: &str) -> Result<Vec<String>> {
        let list_prefix = format!("{}/", self.key(dir));
        let strip = if self.prefix.is_empty() {
            String::new()
        } else {
            format!("{}/", self.prefix)
        };

        let mut files = Vec::new();
        let mut continuation: Option<String> = None;
        loop {
            let resp = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(&list_prefix)
                .set_continuation_token(continuation.take())
                .send()
                .await
                .map_err(|e| {
                    RiError::Listing(format!(
                        "s3://{}/{list_prefix}: {}",
                        self.bucket,
                        DisplayErrorContext(&e)
                    ))
                })?;

            for obj in resp.contents() {
                let Some(key) = obj.key() else { continue };
                if key.ends_with('/') {
                    continue;
                }
                if let Some(relative) = key.strip_prefix(&strip) {
                    files.push(relative.to_string());
                }
            }

            match resp.next_continuation_token() {
                Some(token) if resp.is_truncated() == Some(true) => {
                    continuation = Some(token.to_string());
                }
                _ => break,
            }
        }
        Ok(files)
    }

    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let key = self.key(path);
        let location = format!("s3://{}/{key}", self.bucket);

        let resp = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(&key)
            .send()
            .await
            .map_err(|e| RiError::fs(&location, DisplayErrorContext(&e)))?;
        let body = resp
            .body
            .collect()
            .await
            .map_err(|e| RiError::fs(&location, e))?;
        Ok(body.into_bytes().to_vec())
    }

    fn description(&self) -> String {
        format!("s3://{}/{}", self.bucket, self.prefix)
    }
}

/// Split `s3://bucket/some/prefix` into bucket and prefix.
pub fn parse_s3_url(url: &str) -> Result<(String, String)> {
    let rest = url
        .strip_prefix("s3://")
        .ok_or_else(|| RiError::Config(format!("'{url}' is not an s3:// URL")))?;
    let (bucket, prefix) = rest.split_once('/').unwrap_or((rest, ""));
    if bucket.is_empty() {
        return Err(RiError::Config(format!("'{url}' has no bucket")));
    }
    Ok((bucket.to_string(), prefix.trim_matches('/').to_string()))
}

/// Copy everything under `static/` of `source` into `dest`.
///
/// Returns the number of files copied. Any failed file fails the whole copy.
pub async fn copy_static_assets(
    source: &dyn AssetSource,
    dest: &dyn OutputFs,
    max_concurrent: usize,
) -> Result<usize> {
    let files = source.list_files(STATIC_DIR).await?;
    if files.is_empty() {
        debug!(source = %source.description(), "No static assets to copy");
        return Ok(0);
    }

    let mut dirs: Vec<&str> = files
        .iter()
        .filter_map(|f| f.rsplit_once('/').map(|(dir, _)| dir))
        .collect();
    dirs.sort_unstable();
    dirs.dedup();
    for dir in dirs {
        dest.mkdir_all(dir).await?;
    }

    let copies = files.iter().map(|path| async move {
        let contents = source.read_file(path).await?;
        dest.write_file(path, contents).await
    });
    let results: Vec<Result<()>> = stream::iter(copies)
        .buffer_unordered(max_concurrent.max(1))
        .collect()
        .await;
    results.into_iter().collect::<Result<()>>()?;

    info!(
        source = %source.description(),
        dest = %dest.description(),
        files = files.len(),
        "Copied static assets"
    );
    Ok(files.len())
}
