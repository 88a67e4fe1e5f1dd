//! LocalStack test context.

use aws_sdk_s3::Client as S3Client;
use aws_sdk_s3::types::{Tag, Tagging};
use ri_lister::{S3Config, create_s3_client};

/// LocalStack context holding an S3 client.
pub struct LocalStackTestContext {
    pub s3: S3Client,
    pub endpoint: String,
}

impl LocalStackTestContext {
    /// Uses `LOCALSTACK_ENDPOINT` if set, otherwise `http://localhost:4566`.
    pub async fn new() -> Self {
        let endpoint = std::env::var("LOCALSTACK_ENDPOINT")
            .unwrap_or_else(|_| "http://localhost:4566".to_string());

        let config = S3Config::new()
            .with_endpoint(&endpoint)
            .with_region("us-east-1")
            .with_timeout(10);

        Self {
            s3: create_s3_client(&config).await.unwrap(),
            endpoint,
        }
    }

    /// Check if LocalStack answers at all.
    pub async fn is_available(&self) -> bool {
        self.s3.list_buckets().send().await.is_ok()
    }

    pub async fn create_bucket(&self, name: &str) -> Result<(), aws_sdk_s3::Error> {
        let buckets = self.s3.list_buckets().send().await?;
        let exists = buckets
            .buckets()
            .iter()
            .any(|b| b.name().unwrap_or_default() == name);

        if !exists {
            self.s3.create_bucket().bucket(name).send().await?;
        }
        Ok(())
    }

    /// Upload a small object, optionally tagged.
    pub async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        tags: &[(&str, &str)],
    ) -> Result<(), aws_sdk_s3::Error> {
        self.s3
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(key.as_bytes().to_vec().into())
            .send()
            .await?;

        if !tags.is_empty() {
            let tag_set = tags
                .iter()
                .map(|(k, v)| Tag::builder().key(*k).value(*v).build().unwrap())
                .collect();
            self.s3
                .put_object_tagging()
                .bucket(bucket)
                .key(key)
                .tagging(Tagging::builder().set_tag_set(Some(tag_set)).build().unwrap())
                .send()
                .await?;
        }
        Ok(())
    }

    pub async fn get_object_string(&self, bucket: &str, key: &str) -> Option<String> {
        let output = self.s3.get_object().bucket(bucket).key(key).send().await.ok()?;
        let bytes = output.body.collect().await.ok()?.into_bytes();
        String::from_utf8(bytes.to_vec()).ok()
    }

    /// Delete every object under `prefix`.
    pub async fn clear_prefix(&self, bucket: &str, prefix: &str) -> Result<(), aws_sdk_s3::Error> {
        let listed = self
            .s3
            .list_objects_v2()
            .bucket(bucket)
            .prefix(prefix)
            .send()
            .await?;

        for obj in listed.contents() {
            if let Some(key) = obj.key() {
                self.s3.delete_object().bucket(bucket).key(key).send().await?;
            }
        }
        Ok(())
    }
}
