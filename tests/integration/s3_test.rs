//! S3 listing, tag fetching and upload against LocalStack.

use std::sync::Arc;

use ri_lister::{EnrichConfig, Enricher, S3Bucket};
use ri_render::fs::{S3OutputConfig, S3OutputFs};
use ri_render::MULTIPAGE_TEMPLATE;
use ri_traits::ObjectSource;
use ri_tree::{Exclusions, ObjectTree, TreeConfig, VersionIndex};
use ri_types::{IndexConfig, TagNames};
use tokio_util::sync::CancellationToken;

use crate::common::{LocalStackTestContext, fast_retry, render};

const BUCKET: &str = "release-indexer-test";

async fn context() -> Option<LocalStackTestContext> {
    let ctx = LocalStackTestContext::new().await;
    if !ctx.is_available().await {
        eprintln!("LocalStack not available at {}, skipping", ctx.endpoint);
        return None;
    }
    ctx.create_bucket(BUCKET).await.unwrap();
    Some(ctx)
}

#[tokio::test]
#[ignore = "requires LocalStack"]
async fn test_s3_listing_skips_directory_markers() {
    let Some(ctx) = context().await else { return };
    ctx.clear_prefix(BUCKET, "listing/").await.unwrap();

    ctx.put_object(BUCKET, "listing/p/1.0.0/p_linux_amd64.zip", &[])
        .await
        .unwrap();
    ctx.put_object(BUCKET, "listing/p/1.0.0/", &[]).await.unwrap();

    let bucket = S3Bucket::new(ctx.s3.clone(), BUCKET).with_retry_config(fast_retry());
    let objects = bucket.list_objects("listing/").await.unwrap();

    let keys: Vec<&str> = objects.iter().map(|o| o.key()).collect();
    assert_eq!(keys, vec!["listing/p/1.0.0/p_linux_amd64.zip"]);
    assert!(objects[0].last_modified().is_some());
}

#[tokio::test]
#[ignore = "requires LocalStack"]
async fn test_s3_tags_to_s3_index() {
    let Some(ctx) = context().await else { return };
    ctx.clear_prefix(BUCKET, "tagged/").await.unwrap();

    let names = TagNames::default();
    ctx.put_object(
        BUCKET,
        "tagged/tool/2.0.0/tool.tar.gz",
        &[
            (names.product.as_str(), "tool"),
            (names.version.as_str(), "2.0.0"),
            (names.os.as_str(), "linux"),
            (names.arch.as_str(), "amd64"),
        ],
    )
    .await
    .unwrap();

    let source = Arc::new(S3Bucket::new(ctx.s3.clone(), BUCKET).with_retry_config(fast_retry()));
    let enricher = Enricher::new(source, EnrichConfig::new().with_retry(fast_retry()));
    let objects = enricher
        .list_objects_with_tags("tagged/", &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(objects[0].tag(&names.version), Some("2.0.0"));

    let tree = ObjectTree::with_objects(
        TreeConfig::new()
            .with_prefix_to_strip("tagged")
            .with_exclusions(Exclusions::default_site()),
        objects,
    );

    let dest = Arc::new(S3OutputFs::new(
        ctx.s3.clone(),
        S3OutputConfig::new(BUCKET).with_prefix("tagged"),
    ));
    let config = IndexConfig::new().with_tags(names);
    render(&tree, &config, MULTIPAGE_TEMPLATE, true, dest)
        .await
        .unwrap();

    let json = ctx
        .get_object_string(BUCKET, "tagged/tool/2.0.0/index.json")
        .await
        .unwrap();
    let version: VersionIndex = serde_json::from_str(&json).unwrap();
    assert_eq!(version.builds.len(), 1);
    assert_eq!(version.builds[0].url, "/tagged/tool/2.0.0/tool.tar.gz");

    assert!(
        ctx.get_object_string(BUCKET, "tagged/index.html")
            .await
            .is_some()
    );
}
