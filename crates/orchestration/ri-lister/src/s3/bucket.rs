//! S3 bucket listing and tagging.

use async_stream::try_stream;
use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::error::DisplayErrorContext;
use chrono::DateTime;
use futures::{Stream, TryStreamExt};
use ri_error::{Result, RiError};
use ri_traits::ObjectSource;
use ri_types::{Object, Tags};
use tracing::debug;

use crate::retry::{RetryConfig, with_retry};

/// An S3 bucket exposed as an [`ObjectSource`].
#[derive(Debug, Clone)]
pub struct S3Bucket {
    client: Client,
    bucket: String,
    retry: RetryConfig,
}

impl S3Bucket {
    pub fn new(client: Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            retry: RetryConfig::default(),
        }
    }

    /// Retry policy applied to each listing page.
    pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Stream every object under `prefix`, following continuation tokens.
    ///
    /// Directory markers (keys ending with `/`) and empty keys are skipped.
    pub fn list_stream<'a>(&'a self, prefix: &'a str) -> impl Stream<Item = Result<Object>> + 'a {
        try_stream! {
            let mut continuation_token: Option<String> = None;
            let mut page = 0usize;

            loop {
                let token = continuation_token.clone();
                let resp = with_retry(&self.retry, "list_objects_v2", || {
                    let mut req = self.client.list_objects_v2().bucket(&self.bucket);
                    if !prefix.is_empty() {
                        req = req.prefix(prefix);
                    }
                    if let Some(token) = &token {
                        req = req.continuation_token(token);
                    }
                    async move {
                        req.send()
                            .await
                            .map_err(|e| RiError::Listing(DisplayErrorContext(&e).to_string()))
                    }
                })
                .await
                .map_err(|e| match e {
                    RiError::Listing(message) => {
                        RiError::Listing(format!("s3://{}/{prefix}: {message}", self.bucket))
                    }
                    other => other,
                })?;

                page += 1;
                let count = resp.contents.as_ref().map_or(0, Vec::len);
                debug!(bucket = %self.bucket, prefix, page, count, "Listed page");

                for obj in resp.contents.unwrap_or_default() {
                    let key = obj.key.unwrap_or_default();

                    if key.is_empty() || key.ends_with('/') {
                        continue;
                    }

                    let last_modified = obj
                        .last_modified
                        .and_then(|t| DateTime::from_timestamp(t.secs(), t.subsec_nanos()));

                    yield Object::new(key, obj.size.unwrap_or(0).max(0) as u64, last_modified);
                }

                if resp.is_truncated == Some(true) {
                    continuation_token = resp.next_continuation_token;
                    if continuation_token.is_none() {
                        break;
                    }
                } else {
                    break;
                }
            }
        }
    }
}

#[async_trait]
impl ObjectSource for S3Bucket {
    async fn list_objects(&self, prefix: &str) -> Result<Vec<Object>> {
        self.list_stream(prefix).try_collect().await
    }

    async fn fetch_tags(&self, key: &str) -> Result<Tags> {
        let resp = self
            .client
            .get_object_tagging()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| RiError::TagFetch {
                key: key.to_string(),
                message: DisplayErrorContext(&e).to_string(),
            })?;

        Ok(resp
            .tag_set()
            .iter()
            .map(|tag| (tag.key().to_string(), tag.value().to_string()))
            .collect())
    }
}
