//! Recursive tree rendering.

use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt, join_all};
use futures::stream::{self, StreamExt};
use ri_error::{Result, RiError};
use ri_traits::OutputFs;
use ri_tree::ObjectTree;
use tokio::sync::Semaphore;
use tracing::{debug, error, info};

use crate::fs::ScopedFs;
use crate::renderer::IndexRenderer;
use crate::stats::RenderStats;

/// Default number of sibling subtrees rendered at once.
pub const DEFAULT_MAX_CONCURRENT_CHILDREN: usize = 10;

/// Renders every configured index file for a node and, when recursive,
/// for all of its descendants.
///
/// Each node gets its own directory in the destination. Templates and JSON
/// are produced on the blocking thread pool, at most
/// `max_concurrent_renders` at a time across the whole tree. Failures are
/// collected rather than aborting siblings and are reported together once
/// the whole tree has been visited.
#[derive(Clone)]
pub struct TreeRenderer {
    renderers: Vec<Arc<dyn IndexRenderer>>,
    max_concurrent_children: usize,
    max_concurrent_renders: usize,
    recursive: bool,
}

impl TreeRenderer {
    pub fn new(renderers: Vec<Arc<dyn IndexRenderer>>) -> Self {
        Self {
            renderers,
            max_concurrent_children: DEFAULT_MAX_CONCURRENT_CHILDREN,
            max_concurrent_renders: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
            recursive: true,
        }
    }

    /// Limit concurrent subtree renders per level. Zero is treated as one.
    pub fn with_max_concurrent_children(mut self, max: usize) -> Self {
        self.max_concurrent_children = max.max(1);
        self
    }

    /// Limit index files being rendered at once. Zero is treated as one.
    pub fn with_max_concurrent_renders(mut self, max: usize) -> Self {
        self.max_concurrent_renders = max.max(1);
        self
    }

    /// Render only the root when `false`.
    pub fn with_recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    pub fn is_recursive(&self) -> bool {
        self.recursive
    }

    /// Render `tree` into `dest`.
    ///
    /// Returns [`RiError::Render`] if any directory or file failed.
    pub async fn render(
        &self,
        tree: Arc<ObjectTree>,
        dest: Arc<dyn OutputFs>,
    ) -> Result<RenderStats> {
        let mut stats = RenderStats::new();
        let permits = Arc::new(Semaphore::new(self.max_concurrent_renders));

        info!(
            destination = %dest.description(),
            directories = tree.directory_count(),
            recursive = self.recursive,
            concurrency = self.max_concurrent_renders,
            "Rendering index files"
        );

        let job = RenderJob {
            root: &tree,
            permits: &permits,
            stats: &stats,
        };
        let errors = self.render_node(job, &tree, Vec::new(), dest).await;
        stats.complete();

        if let Some(err) = RiError::render_aggregate(&errors) {
            error!(
                failed = errors.len(),
                files_written = stats.files_written(),
                "Rendering incomplete"
            );
            return Err(err);
        }

        info!(
            directories = stats.directories(),
            files_written = stats.files_written(),
            bytes_written = stats.bytes_written(),
            "Rendering complete"
        );
        Ok(stats)
    }

    fn render_node<'a>(
        &'a self,
        job: RenderJob<'a>,
        node: &'a ObjectTree,
        path: Vec<String>,
        dest: Arc<dyn OutputFs>,
    ) -> BoxFuture<'a, Vec<RiError>> {
        async move {
            let dir = path.last().map(String::as_str).unwrap_or_default();

            if let Err(e) = dest.mkdir_all(dir).await {
                error!(path = node.full_path(), error = %e, "Failed to create directory");
                job.stats.record_failure();
                return vec![e];
            }

            let scoped: Arc<dyn OutputFs> = Arc::new(ScopedFs::new(dest, dir));
            job.stats.record_directory();

            let files = join_all(
                self.renderers
                    .iter()
                    .map(|r| self.render_file(job, Arc::clone(r), &path, node, scoped.as_ref())),
            );

            let children: Vec<BoxFuture<'a, Vec<RiError>>> = if self.recursive {
                node.children()
                    .iter()
                    .map(|(name, child)| {
                        let mut child_path = path.clone();
                        child_path.push(name.clone());
                        self.render_node(job, child, child_path, Arc::clone(&scoped))
                    })
                    .collect()
            } else {
                Vec::new()
            };
            let children = stream::iter(children)
                .buffer_unordered(self.max_concurrent_children)
                .concat();

            let (file_results, mut errors) = futures::join!(files, children);
            errors.extend(file_results.into_iter().filter_map(|r| r.err()));
            errors
        }
        .boxed()
    }

    async fn render_file(
        &self,
        job: RenderJob<'_>,
        renderer: Arc<dyn IndexRenderer>,
        path: &[String],
        node: &ObjectTree,
        dest: &dyn OutputFs,
    ) -> Result<()> {
        let file = renderer.index_file().to_string();
        let written = match self.render_blocking(job, renderer, path).await {
            Ok(buf) => {
                let len = buf.len() as u64;
                dest.write_file(&file, buf).await.map(|()| len)
            }
            Err(e) => Err(e),
        };

        match written {
            Ok(len) => {
                job.stats.record_file(len);
                debug!(path = node.full_path(), file = %file, bytes = len, "Rendered");
                Ok(())
            }
            Err(e) => {
                job.stats.record_failure();
                error!(
                    path = node.full_path(),
                    file = %file,
                    error = %e,
                    "Failed to render index file"
                );
                Err(e)
            }
        }
    }

    /// Run one renderer for the node at `path` on the blocking pool.
    async fn render_blocking(
        &self,
        job: RenderJob<'_>,
        renderer: Arc<dyn IndexRenderer>,
        path: &[String],
    ) -> Result<Vec<u8>> {
        let _permit = Arc::clone(job.permits)
            .acquire_owned()
            .await
            .map_err(|e| RiError::Io(std::io::Error::other(e)))?;

        let root = Arc::clone(job.root);
        let path = path.to_vec();

        tokio::task::spawn_blocking(move || -> Result<Vec<u8>> {
            let node = root
                .descendant(&path)
                .ok_or_else(|| RiError::Config(format!("no node at '{}'", path.join("/"))))?;
            let mut buf = Vec::new();
            renderer.render(&mut buf, node)?;
            Ok(buf)
        })
        .await
        .map_err(|e| RiError::Io(std::io::Error::other(e)))?
    }
}

/// State shared by every node of one render call.
#[derive(Clone, Copy)]
struct RenderJob<'a> {
    root: &'a Arc<ObjectTree>,
    permits: &'a Arc<Semaphore>,
    stats: &'a RenderStats,
}

impl std::fmt::Debug for TreeRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TreeRenderer")
            .field(
                "renderers",
                &self.renderers.iter().map(|r| r.index_file()).collect::<Vec<_>>(),
            )
            .field("max_concurrent_children", &self.max_concurrent_children)
            .field("max_concurrent_renders", &self.max_concurrent_renders)
            .field("recursive", &self.recursive)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MemoryFs;
    use crate::html::HtmlRenderer;
    use crate::json::JsonRenderer;
    use crate::templates::{BuiltinTemplates, MULTIPAGE_TEMPLATE, SINGLEPAGE_TEMPLATE};
    use async_trait::async_trait;
    use ri_tree::{ReleaseExtractor, TreeConfig};
    use ri_types::{IndexConfig, Object};
    use std::io::Write;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn tree() -> Arc<ObjectTree> {
        Arc::new(ObjectTree::with_objects(
            TreeConfig::new(),
            [
                "a/b/c/fileA",
                "a/b/c/fileB",
                "a/b/fileC",
                "p/1.0.0/p_linux_amd64.zip",
            ]
            .map(Object::from_key),
        ))
    }

    fn renderers(template: &str) -> Vec<Arc<dyn IndexRenderer>> {
        let extractor = Arc::new(ReleaseExtractor::new(&IndexConfig::new()).unwrap());
        vec![
            Arc::new(HtmlRenderer::new(Arc::new(BuiltinTemplates::new()), template)),
            Arc::new(JsonRenderer::new(extractor)),
        ]
    }

    #[tokio::test]
    async fn test_recursive_writes_index_per_directory() {
        let tree = tree();
        let fs = Arc::new(MemoryFs::new());

        let stats = TreeRenderer::new(renderers(MULTIPAGE_TEMPLATE))
            .render(Arc::clone(&tree), fs.clone())
            .await
            .unwrap();

        let dirs = ["", "a/", "a/b/", "a/b/c/", "p/", "p/1.0.0/"];
        for dir in dirs {
            assert!(fs.read(&format!("{dir}index.html")).is_some(), "{dir}index.html");
            assert!(fs.read(&format!("{dir}index.json")).is_some(), "{dir}index.json");
        }
        assert_eq!(fs.file_count(), dirs.len() * 2);
        assert_eq!(stats.directories(), tree.directory_count() as u64);
        assert_eq!(stats.files_written(), (dirs.len() * 2) as u64);

        let version = fs.read_to_string("p/1.0.0/index.json").unwrap();
        assert!(version.contains(r#""version":"1.0.0""#));
    }

    #[tokio::test]
    async fn test_single_page_writes_only_root() {
        let tree = tree();
        let fs = Arc::new(MemoryFs::new());
        let html_only: Vec<Arc<dyn IndexRenderer>> = vec![Arc::new(HtmlRenderer::new(
            Arc::new(BuiltinTemplates::new()),
            SINGLEPAGE_TEMPLATE,
        ))];

        TreeRenderer::new(html_only)
            .with_recursive(false)
            .render(Arc::clone(&tree), fs.clone())
            .await
            .unwrap();

        assert_eq!(fs.files(), vec!["index.html".to_string()]);
        let html = fs.read_to_string("index.html").unwrap();
        assert!(html.contains("fileA"));
        assert!(html.contains("p_linux_amd64.zip"));
    }

    struct FailingRenderer;

    impl IndexRenderer for FailingRenderer {
        fn index_file(&self) -> &str {
            "broken.txt"
        }

        fn render(&self, out: &mut dyn Write, tree: &ObjectTree) -> Result<()> {
            if tree.dir_name() == "c" {
                return Err(RiError::Template("boom".to_string()));
            }
            out.write_all(b"ok")?;
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_failure_does_not_block_siblings() {
        let tree = tree();
        let fs = Arc::new(MemoryFs::new());
        let mut all = renderers(MULTIPAGE_TEMPLATE);
        all.push(Arc::new(FailingRenderer));

        let err = TreeRenderer::new(all)
            .render(Arc::clone(&tree), fs.clone())
            .await
            .unwrap_err();

        match err {
            RiError::Render { failed, first } => {
                assert_eq!(failed, 1);
                assert!(first.contains("boom"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(fs.read("a/b/c/index.html").is_some());
        assert!(fs.read("a/b/c/broken.txt").is_none());
        assert!(fs.read("p/1.0.0/broken.txt").is_some());
    }

    struct NoMkdirFs(MemoryFs);

    #[async_trait]
    impl OutputFs for NoMkdirFs {
        async fn mkdir_all(&self, path: &str) -> Result<()> {
            if path.ends_with('p') {
                return Err(RiError::fs(path, "read-only"));
            }
            self.0.mkdir_all(path).await
        }

        async fn write_file(&self, path: &str, contents: Vec<u8>) -> Result<()> {
            self.0.write_file(path, contents).await
        }

        fn description(&self) -> String {
            "no-mkdir".to_string()
        }
    }

    #[tokio::test]
    async fn test_directory_failure_skips_subtree() {
        let tree = tree();
        let fs = Arc::new(NoMkdirFs(MemoryFs::new()));

        let err = TreeRenderer::new(renderers(MULTIPAGE_TEMPLATE))
            .render(Arc::clone(&tree), fs.clone())
            .await
            .unwrap_err();

        assert!(matches!(err, RiError::Render { failed: 1, .. }));
        assert!(fs.0.read("a/b/c/index.json").is_some());
        assert!(fs.0.read("p/1.0.0/index.json").is_none());
    }

    #[tokio::test]
    async fn test_concurrency_limit_of_one_still_renders_everything() {
        let tree = tree();
        let fs = Arc::new(MemoryFs::new());

        TreeRenderer::new(renderers(MULTIPAGE_TEMPLATE))
            .with_max_concurrent_children(0)
            .render(Arc::clone(&tree), fs.clone())
            .await
            .unwrap();

        assert_eq!(fs.file_count(), 12);
    }

    /// Sleeps while rendering and records how many renders overlap.
    #[derive(Default)]
    struct SlowRenderer {
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl IndexRenderer for SlowRenderer {
        fn index_file(&self) -> &str {
            "slow.txt"
        }

        fn render(&self, out: &mut dyn Write, tree: &ObjectTree) -> Result<()> {
            let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(current, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(20));
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            out.write_all(tree.full_path().as_bytes())?;
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_renders_run_in_parallel_within_limit() {
        let keys: Vec<Object> = (0..20)
            .map(|i| Object::from_key(format!("d{i}/file.zip")))
            .collect();
        let tree = Arc::new(ObjectTree::with_objects(TreeConfig::new(), keys));
        let fs = Arc::new(MemoryFs::new());
        let slow = Arc::new(SlowRenderer::default());

        let stats = TreeRenderer::new(vec![slow.clone() as Arc<dyn IndexRenderer>])
            .with_max_concurrent_renders(4)
            .render(Arc::clone(&tree), fs.clone())
            .await
            .unwrap();

        assert_eq!(stats.files_written(), 21);
        assert_eq!(fs.read_to_string("d7/slow.txt").unwrap(), "/d7");

        let max = slow.max_in_flight.load(Ordering::SeqCst);
        assert!(max > 1, "renders never overlapped");
        assert!(max <= 4, "limit exceeded: {max}");
    }
}
