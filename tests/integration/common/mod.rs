//! Shared fixtures for integration tests.

pub mod localstack;

use std::sync::Arc;

use ri_error::Result;
use ri_lister::{EnrichConfig, Enricher, MemorySource, RetryConfig};
use ri_render::fs::MemoryFs;
use ri_render::{
    BuiltinTemplates, HtmlRenderer, IndexRenderer, JsonRenderer, RenderStats, TreeRenderer,
};
use ri_traits::OutputFs;
use ri_tree::{ObjectTree, ReleaseExtractor, TreeConfig};
use ri_types::{IndexConfig, Object};
use tokio_util::sync::CancellationToken;

pub use localstack::LocalStackTestContext;

/// A small release bucket under `releases/`.
pub const RELEASE_KEYS: &[&str] = &[
    "releases/connect/0.9.0/connect_linux_amd64.zip",
    "releases/connect/1.0.0/connect_darwin_arm64.zip",
    "releases/connect/1.0.0/connect_linux_amd64.zip",
    "releases/connect/1.0.0/connect_1.0.0_SHA256SUMS",
    "releases/connect/1.10.0-rc.1/connect_linux_amd64.zip",
    "releases/hub/v2.1/hub_windows_amd64.zip",
    "releases/index.html",
    "releases/.well-known/security.txt",
];

/// Retries fast enough for tests.
pub fn fast_retry() -> RetryConfig {
    RetryConfig::new()
        .with_max_retries(3)
        .with_initial_backoff_ms(1)
        .with_max_backoff_ms(5)
}

/// List `source` through an enricher, fetching tags when the config needs them.
pub async fn list(
    source: MemorySource,
    config: &IndexConfig,
    prefix: &str,
) -> Result<Vec<Object>> {
    let enricher = Enricher::new(
        Arc::new(source),
        EnrichConfig::new()
            .with_max_concurrent_fetches(4)
            .with_retry(fast_retry()),
    );

    if config.requires_tags() {
        enricher
            .list_objects_with_tags(prefix, &CancellationToken::new())
            .await
    } else {
        enricher.list_objects(prefix).await
    }
}

/// Render `tree` with the HTML and JSON renderers.
pub async fn render(
    tree: &ObjectTree,
    config: &IndexConfig,
    template: &str,
    recursive: bool,
    dest: Arc<dyn OutputFs>,
) -> Result<RenderStats> {
    let extractor = Arc::new(ReleaseExtractor::new(config)?);
    let mut renderers: Vec<Arc<dyn IndexRenderer>> = vec![Arc::new(HtmlRenderer::new(
        Arc::new(BuiltinTemplates::new()),
        template,
    ))];
    if recursive {
        renderers.push(Arc::new(JsonRenderer::new(extractor)));
    }

    TreeRenderer::new(renderers)
        .with_recursive(recursive)
        .with_max_concurrent_children(4)
        .render(Arc::new(tree.clone()), dest)
        .await
}

/// Full in-memory run over `keys` with default site exclusions and `prefix` stripped.
pub async fn index_into_memory(keys: &[&str], prefix: &str) -> (ObjectTree, Arc<MemoryFs>) {
    let config = IndexConfig::new();
    let objects = list(MemorySource::new().with_objects(keys.iter().copied()), &config, prefix)
        .await
        .unwrap();

    let tree = ObjectTree::with_objects(
        TreeConfig::new()
            .with_prefix_to_strip(prefix)
            .with_exclusions(ri_tree::Exclusions::default_site()),
        objects,
    );

    let fs = Arc::new(MemoryFs::new());
    render(&tree, &config, ri_render::MULTIPAGE_TEMPLATE, true, fs.clone())
        .await
        .unwrap();

    (tree, fs)
}
