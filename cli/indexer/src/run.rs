//! Main execution logic for ri-indexer.

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use ri_lister::{EnrichConfig, Enricher, S3Bucket, S3Config, create_s3_client};
use ri_render::fs::{LocalFs, S3OutputConfig, S3OutputFs};
use ri_render::{
    AssetSource, BuiltinTemplates, HtmlRenderer, IndexRenderer, JsonRenderer, LocalAssets,
    RenderSummary, S3Assets, TemplateEngine, TreeRenderer, copy_static_assets,
};
use ri_traits::{ObjectSource, OutputFs};
use ri_tree::{Exclusions, Inclusions, ObjectTree, Predicate, ReleaseExtractor, TreeConfig};
use ri_types::{IndexConfig, TagNames};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::args::{Cli, MetadataSourceArg};

/// Outcome of a successful run.
#[derive(Debug)]
pub struct RunSummary {
    pub objects_listed: usize,
    pub objects_indexed: usize,
    pub assets_copied: usize,
    pub render: RenderSummary,
}

/// Execute one indexing run with the provided arguments.
pub async fn execute(args: Cli, cancel: CancellationToken) -> Result<RunSummary> {
    let index_config = build_index_config(&args);
    let extractor = Arc::new(ReleaseExtractor::new(&index_config)?);

    let templates = Arc::new(BuiltinTemplates::new());
    let template = args.template_name();
    if !templates.contains(&template) {
        bail!(
            "unknown index template '{template}' (available: {})",
            templates.names().join(", ")
        );
    }

    let mut s3_config = S3Config::new();
    if let Some(region) = &args.region {
        s3_config = s3_config.with_region(region);
    }
    if let Some(endpoint) = &args.s3_endpoint {
        s3_config = s3_config.with_endpoint(endpoint);
    }
    if let Some(profile) = &args.profile {
        s3_config = s3_config.with_profile(profile);
    }
    let client = create_s3_client(&s3_config).await?;

    let source: Arc<dyn ObjectSource> = Arc::new(S3Bucket::new(client.clone(), &args.bucket));

    let mut enrich_config = EnrichConfig::new();
    if let Some(n) = args.tag_concurrency {
        enrich_config = enrich_config.with_max_concurrent_fetches(n);
    }
    let enricher = Enricher::new(source, enrich_config);

    info!(bucket = %args.bucket, prefix = %args.object_prefix, "Listing objects");
    let objects = if extractor.uses_tags() {
        enricher
            .list_objects_with_tags(&args.object_prefix, &cancel)
            .await?
    } else {
        enricher.list_objects(&args.object_prefix).await?
    };
    let objects_listed = objects.len();

    if cancel.is_cancelled() {
        bail!("cancelled before rendering");
    }

    let tree = Arc::new(ObjectTree::with_objects(build_tree_config(&args), objects));
    let objects_indexed = tree.object_count();
    info!(
        listed = objects_listed,
        indexed = objects_indexed,
        directories = tree.directory_count(),
        "Built object tree"
    );

    let dest: Arc<dyn OutputFs> = match &args.output_dir {
        Some(dir) => Arc::new(
            LocalFs::new(dir)
                .await
                .with_context(|| format!("cannot use output directory {}", dir.display()))?,
        ),
        None => {
            let bucket = args.destination_bucket.as_deref().unwrap_or(&args.bucket);
            let mut config = S3OutputConfig::new(bucket).with_prefix(args.destination_prefix());
            if let Some(sse) = &args.sse {
                config = config.with_server_side_encryption(sse);
            }
            Arc::new(S3OutputFs::new(client.clone(), config))
        }
    };

    let assets: Option<Box<dyn AssetSource>> = match (&args.static_dir, &args.static_bucket_url) {
        (Some(dir), _) => Some(Box::new(LocalAssets::new(dir))),
        (None, Some(url)) => Some(Box::new(S3Assets::from_url(client, url)?)),
        (None, None) => None,
    };
    let assets_copied = match assets {
        Some(source) => {
            copy_static_assets(source.as_ref(), dest.as_ref(), args.render_concurrency).await?
        }
        None => 0,
    };

    let renderers: Vec<Arc<dyn IndexRenderer>> = vec![
        Arc::new(HtmlRenderer::new(templates, template)),
        Arc::new(JsonRenderer::new(extractor)),
    ];
    let renderer = TreeRenderer::new(renderers)
        .with_recursive(args.index_type.is_recursive())
        .with_max_concurrent_children(args.render_concurrency);

    let stats = renderer.render(tree, dest).await?;

    Ok(RunSummary {
        objects_listed,
        objects_indexed,
        assets_copied,
        render: stats.summary(),
    })
}

/// Release metadata configuration from CLI arguments.
pub fn build_index_config(args: &Cli) -> IndexConfig {
    match args.metadata_source {
        MetadataSourceArg::Tags => IndexConfig::new().with_tags(TagNames::default()),
        MetadataSourceArg::Key if args.key_patterns.is_empty() => IndexConfig::new(),
        MetadataSourceArg::Key => IndexConfig::new().with_key_patterns(args.key_patterns.clone()),
    }
}

/// Tree construction settings from CLI arguments.
pub fn build_tree_config(args: &Cli) -> TreeConfig {
    let mut exclusions = if args.no_default_exclusions {
        Exclusions::new()
    } else {
        Exclusions::default_site()
    };
    for key in &args.exclude_keys {
        exclusions.push(Predicate::key(key));
    }
    for prefix in &args.exclude_prefixes {
        exclusions.push(Predicate::prefix(prefix));
    }
    for suffix in &args.exclude_suffixes {
        exclusions.push(Predicate::suffix(suffix));
    }

    let mut config = TreeConfig::new()
        .with_prefix_to_strip(&args.object_prefix)
        .with_exclusions(exclusions);

    if !args.include_prefixes.is_empty() {
        let inclusions = args
            .include_prefixes
            .iter()
            .fold(Inclusions::new(), |inc, p| inc.with(Predicate::prefix(p)));
        config = config.with_inclusions(inclusions);
    }

    config
}
