//! End-to-end runs: listing, optional tag enrichment, tree building and
//! rendering, all against in-memory or temp-dir backends.

use std::sync::Arc;

use ri_error::RiError;
use ri_lister::MemorySource;
use ri_render::fs::{LocalFs, MemoryFs};
use ri_render::{LocalAssets, MULTIPAGE_TEMPLATE, SINGLEPAGE_TEMPLATE, copy_static_assets};
use ri_tree::{ArchiveIndex, Exclusions, ObjectTree, ProductIndex, TreeConfig, VersionIndex};
use ri_types::{IndexConfig, TagNames, Tags};
use serde_json::Value;

use crate::common::{RELEASE_KEYS, index_into_memory, list, render};

fn read_json(fs: &MemoryFs, path: &str) -> Value {
    let text = fs
        .read_to_string(path)
        .unwrap_or_else(|| panic!("{path} not written"));
    serde_json::from_str(&text).unwrap()
}

#[tokio::test]
async fn test_multipage_writes_index_pair_per_directory() {
    let (tree, fs) = index_into_memory(RELEASE_KEYS, "releases").await;

    let dirs = [
        "",
        "connect/",
        "connect/0.9.0/",
        "connect/1.0.0/",
        "connect/1.10.0-rc.1/",
        "hub/",
        "hub/v2.1/",
    ];
    for dir in dirs {
        assert!(fs.read(&format!("{dir}index.html")).is_some(), "{dir}index.html");
        assert!(fs.read(&format!("{dir}index.json")).is_some(), "{dir}index.json");
    }
    assert_eq!(fs.file_count(), dirs.len() * 2);
    assert_eq!(tree.directory_count(), dirs.len());
}

#[tokio::test]
async fn test_default_exclusions_and_prefix_stripping() {
    let (tree, fs) = index_into_memory(RELEASE_KEYS, "releases").await;

    assert!(tree.child("releases").is_none());
    assert!(tree.child(".well-known").is_none());
    assert!(tree.objects().is_empty(), "releases/index.html should be excluded");
    assert!(!fs.is_dir(".well-known"));

    // Keys keep their full path even though the tree is rooted below the prefix.
    let version = tree.child("connect").and_then(|c| c.child("1.0.0")).unwrap();
    assert!(
        version
            .objects()
            .iter()
            .all(|o| o.key().starts_with("releases/connect/1.0.0/"))
    );
}

#[tokio::test]
async fn test_archive_index_tracks_latest_per_product() {
    let (_, fs) = index_into_memory(RELEASE_KEYS, "releases").await;

    let archive: ArchiveIndex = serde_json::from_value(read_json(&fs, "index.json")).unwrap();
    assert_eq!(
        archive.product.keys().collect::<Vec<_>>(),
        vec!["connect", "hub"]
    );

    let connect = &archive.product["connect"];
    assert_eq!(connect.versions.len(), 3);
    assert_eq!(connect.latest.as_ref().unwrap().version, "1.10.0-rc.1");

    let hub = &archive.product["hub"];
    assert_eq!(hub.latest.as_ref().unwrap().version, "2.1.0");
}

#[tokio::test]
async fn test_product_and_version_documents() {
    let (_, fs) = index_into_memory(RELEASE_KEYS, "releases").await;

    let product: ProductIndex =
        serde_json::from_value(read_json(&fs, "connect/index.json")).unwrap();
    assert_eq!(product.name, "connect");
    assert!(product.versions.contains_key("0.9.0"));

    let version: VersionIndex =
        serde_json::from_value(read_json(&fs, "connect/1.0.0/index.json")).unwrap();
    assert_eq!(version.name, "connect");
    assert_eq!(version.version, "1.0.0");
    assert_eq!(version.shasums, "releases/connect/1.0.0/connect_1.0.0_SHA256SUMS");
    assert_eq!(version.builds.len(), 2);

    let linux = version.builds.iter().find(|b| b.os == "linux").unwrap();
    assert_eq!(linux.arch, "amd64");
    assert_eq!(linux.filename, "connect_linux_amd64.zip");
    assert_eq!(linux.url, "/releases/connect/1.0.0/connect_linux_amd64.zip");
}

#[tokio::test]
async fn test_html_pages_link_objects_and_parent() {
    let (_, fs) = index_into_memory(RELEASE_KEYS, "releases").await;

    let root = fs.read_to_string("index.html").unwrap();
    assert!(root.contains(r#"href="connect/""#));
    assert!(root.contains(r#"href="hub/""#));
    assert!(!root.contains(r#"href="../""#));

    let version = fs.read_to_string("connect/1.0.0/index.html").unwrap();
    assert!(version.contains(r#"href="../""#));
    assert!(version.contains("/releases/connect/1.0.0/connect_darwin_arm64.zip"));
}

#[tokio::test]
async fn test_unclassified_directory_gets_null_index() {
    let keys = ["docs/guide/intro.md", "docs/readme.txt"];
    let (_, fs) = index_into_memory(&keys, "").await;

    assert_eq!(read_json(&fs, "docs/index.json"), Value::Null);
    assert_eq!(read_json(&fs, "docs/guide/index.json"), Value::Null);
}

#[tokio::test]
async fn test_singlepage_writes_one_document() {
    let config = IndexConfig::new();
    let objects = list(
        MemorySource::new().with_objects(RELEASE_KEYS.iter().copied()),
        &config,
        "releases/",
    )
    .await
    .unwrap();
    let tree = ObjectTree::with_objects(
        TreeConfig::new()
            .with_prefix_to_strip("releases")
            .with_exclusions(Exclusions::default_site()),
        objects,
    );

    let fs = Arc::new(MemoryFs::new());
    let stats = render(&tree, &config, SINGLEPAGE_TEMPLATE, false, fs.clone())
        .await
        .unwrap();

    assert_eq!(fs.files(), vec!["index.html".to_string()]);
    assert_eq!(stats.files_written(), 1);

    let html = fs.read_to_string("index.html").unwrap();
    assert!(html.contains("<details"));
    assert!(html.contains("connect_linux_amd64.zip"));
    assert!(html.contains("hub_windows_amd64.zip"));
}

fn release_tags(product: &str, version: &str, os: &str, arch: &str) -> Tags {
    let names = TagNames::default();
    [
        (names.product, product),
        (names.version, version),
        (names.os, os),
        (names.arch, arch),
    ]
    .into_iter()
    .map(|(k, v)| (k, v.to_string()))
    .collect()
}

#[tokio::test]
async fn test_tag_metadata_drives_version_index() {
    let source = MemorySource::new()
        .with_tagged_object(
            "tool/1.2.0/tool-linux.tar.gz",
            release_tags("tool", "1.2.0", "linux", "arm64"),
        )
        .with_tagged_object(
            "tool/1.2.0/tool-mac.tar.gz",
            release_tags("tool", "1.2.0", "darwin", "amd64"),
        )
        .with_object("tool/1.2.0/NOTES.txt")
        .with_transient_failures("tool/1.2.0/tool-mac.tar.gz", 2);

    let config = IndexConfig::new().with_tags(TagNames::default());
    let objects = list(source, &config, "").await.unwrap();
    assert_eq!(objects.len(), 3);

    let tree = ObjectTree::with_objects(TreeConfig::new(), objects);
    let fs = Arc::new(MemoryFs::new());
    render(&tree, &config, MULTIPAGE_TEMPLATE, true, fs.clone())
        .await
        .unwrap();

    let version: VersionIndex =
        serde_json::from_value(read_json(&fs, "tool/1.2.0/index.json")).unwrap();
    assert_eq!(version.builds.len(), 2, "untagged notes have no version");

    let linux = version.builds.iter().find(|b| b.os == "linux").unwrap();
    assert_eq!(linux.arch, "arm64");
    assert_eq!(linux.name, "tool");
    assert_eq!(linux.url, "/tool/1.2.0/tool-linux.tar.gz");
}

#[tokio::test]
async fn test_enrichment_failure_aborts_before_render() {
    let source = MemorySource::new()
        .with_objects(["a/1.0.0/a_linux_amd64.zip", "a/1.0.0/a_darwin_amd64.zip"])
        .with_permanent_failure("a/1.0.0/a_darwin_amd64.zip");

    let config = IndexConfig::new().with_tags(TagNames::default());
    let err = list(source, &config, "").await.unwrap_err();

    match err {
        RiError::Enrichment { failed, total, first } => {
            assert_eq!(failed, 1);
            assert_eq!(total, 2);
            assert!(first.contains("a_darwin_amd64.zip"), "{first}");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_listing_failure_is_fatal() {
    let source = MemorySource::new()
        .with_object("a/1.0.0/a_linux_amd64.zip")
        .with_list_failure("AccessDenied");

    let err = list(source, &IndexConfig::new(), "").await.unwrap_err();
    assert!(matches!(err, RiError::Listing(_)), "{err}");
}

#[tokio::test]
async fn test_local_output_directory() {
    let dir = tempfile::tempdir().unwrap();
    let config = IndexConfig::new();
    let objects = list(
        MemorySource::new().with_objects(RELEASE_KEYS.iter().copied()),
        &config,
        "",
    )
    .await
    .unwrap();
    let tree = ObjectTree::with_objects(
        TreeConfig::new()
            .with_prefix_to_strip("releases")
            .with_exclusions(Exclusions::default_site()),
        objects,
    );

    let fs = Arc::new(LocalFs::new(dir.path().join("site")).await.unwrap());
    let stats = render(&tree, &config, MULTIPAGE_TEMPLATE, true, fs)
        .await
        .unwrap();

    assert_eq!(stats.failures(), 0);
    let site = dir.path().join("site");
    assert!(site.join("index.html").is_file());
    assert!(site.join("hub/v2.1/index.html").is_file());

    let text = std::fs::read_to_string(site.join("connect/index.json")).unwrap();
    let product: ProductIndex = serde_json::from_str(&text).unwrap();
    assert_eq!(product.latest.unwrap().version, "1.10.0-rc.1");
}

#[tokio::test]
async fn test_static_assets_copied_next_to_indexes() {
    let assets = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(assets.path().join("static/css")).unwrap();
    std::fs::write(assets.path().join("static/css/site.css"), "body {}").unwrap();

    let fs = Arc::new(MemoryFs::new());
    let copied = copy_static_assets(&LocalAssets::new(assets.path()), fs.as_ref(), 4)
        .await
        .unwrap();
    assert_eq!(copied, 1);

    let config = IndexConfig::new();
    let objects = list(
        MemorySource::new().with_objects(RELEASE_KEYS.iter().copied()),
        &config,
        "",
    )
    .await
    .unwrap();
    let tree = ObjectTree::with_objects(
        TreeConfig::new()
            .with_prefix_to_strip("releases")
            .with_exclusions(Exclusions::default_site()),
        objects,
    );
    render(&tree, &config, MULTIPAGE_TEMPLATE, true, fs.clone())
        .await
        .unwrap();

    assert_eq!(fs.read_to_string("static/css/site.css").as_deref(), Some("body {}"));
    assert!(fs.read("index.html").is_some());
    assert!(tree.child("static").is_none());
}
