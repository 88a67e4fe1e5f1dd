//! Hierarchical object tree built from flat keys.

use std::collections::BTreeMap;
use std::sync::Arc;

use ri_error::{Result, RiError};
use ri_traits::ObjectSource;
use ri_types::Object;
use tracing::{debug, trace};

use crate::filter::{Exclusions, Inclusions, PathFilter};

/// Settings shared by every node of a tree.
#[derive(Debug, Clone, Default)]
pub struct TreeConfig {
    /// Leading key segments dropped before insertion
    prefix_segments: Vec<String>,

    /// Applied to directory names and to full object keys
    exclusions: Exclusions,

    /// Optional whitelist applied to full object keys before insertion
    inclusions: Option<Inclusions>,
}

impl TreeConfig {
    /// Create a configuration with no prefix stripping and no filters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Strip a shared root prefix (e.g. `releases` or `releases/prod/`) from keys.
    pub fn with_prefix_to_strip(mut self, prefix: impl AsRef<str>) -> Self {
        self.prefix_segments = prefix
            .as_ref()
            .split('/')
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        self
    }

    /// Set the exclusion predicates.
    pub fn with_exclusions(mut self, exclusions: Exclusions) -> Self {
        self.exclusions = exclusions;
        self
    }

    /// Only ingest keys matched by one of these predicates.
    pub fn with_inclusions(mut self, inclusions: Inclusions) -> Self {
        self.inclusions = Some(inclusions);
        self
    }

    /// The prefix being stripped, joined with `/`.
    pub fn prefix_to_strip(&self) -> String {
        self.prefix_segments.join("/")
    }

    pub fn exclusions(&self) -> &Exclusions {
        &self.exclusions
    }

    pub fn inclusions(&self) -> Option<&Inclusions> {
        self.inclusions.as_ref()
    }
}

/// A directory-equivalent node holding direct objects and child nodes.
///
/// Nodes are created on demand while keys are inserted. The root owns all
/// descendants; once built the tree is only read.
#[derive(Debug, Clone)]
pub struct ObjectTree {
    full_path: String,
    dir_name: String,
    objects: Vec<Object>,
    children: BTreeMap<String, ObjectTree>,
    config: Arc<TreeConfig>,
}

impl ObjectTree {
    /// Create an empty root node at `/`.
    pub fn root(config: TreeConfig) -> Self {
        Self::node(Arc::new(config), "/".to_string())
    }

    /// Create a root and insert the given objects.
    pub fn with_objects<I, O>(config: TreeConfig, objects: I) -> Self
    where
        I: IntoIterator<Item = O>,
        O: Into<Option<Object>>,
    {
        let mut tree = Self::root(config);
        tree.add_objects(objects);
        tree
    }

    /// Create a root populated from an object source.
    pub async fn from_source<S>(config: TreeConfig, source: &S, prefix: &str) -> Result<Self>
    where
        S: ObjectSource + ?Sized,
    {
        let mut tree = Self::root(config);
        tree.add_objects_from_source(source, prefix).await?;
        Ok(tree)
    }

    fn node(config: Arc<TreeConfig>, full_path: String) -> Self {
        let dir_name = base_name(&full_path).to_string();
        Self {
            full_path,
            dir_name,
            objects: Vec::new(),
            children: BTreeMap::new(),
            config,
        }
    }

    pub fn full_path(&self) -> &str {
        &self.full_path
    }

    pub fn dir_name(&self) -> &str {
        &self.dir_name
    }

    /// Objects stored directly in this node.
    pub fn objects(&self) -> &[Object] {
        &self.objects
    }

    /// Child nodes keyed by directory name.
    pub fn children(&self) -> &BTreeMap<String, ObjectTree> {
        &self.children
    }

    pub fn child(&self, name: &str) -> Option<&ObjectTree> {
        self.children.get(name)
    }

    /// Follow `path` (one directory name per element) down from this node.
    pub fn descendant<S: AsRef<str>>(&self, path: &[S]) -> Option<&ObjectTree> {
        path.iter()
            .try_fold(self, |node, name| node.child(name.as_ref()))
    }

    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    pub fn is_root(&self) -> bool {
        self.full_path == "/"
    }

    /// Path relative to the root, without a leading `/` (empty for the root).
    pub fn relative_path(&self) -> &str {
        self.full_path.trim_start_matches('/')
    }

    /// Full path of the parent node (`/` for the root and its children).
    pub fn parent_full_path(&self) -> &str {
        match self.full_path.rfind('/') {
            Some(0) | None => "/",
            Some(idx) => &self.full_path[..idx],
        }
    }

    /// Directory name of the parent node.
    pub fn parent_name(&self) -> &str {
        base_name(self.parent_full_path())
    }

    /// Get or create the child named `name`.
    ///
    /// Returns `None` when the name is empty or excluded by the tree's filter.
    pub fn add_child(&mut self, name: &str) -> Option<&mut ObjectTree> {
        if name.is_empty() {
            return None;
        }
        if !self.config.exclusions.include(name) {
            trace!(path = %self.full_path, name, "Excluded directory");
            return None;
        }

        let full_path = if self.is_root() {
            format!("/{name}")
        } else {
            format!("{}/{name}", self.full_path)
        };
        let config = Arc::clone(&self.config);

        Some(
            self.children
                .entry(name.to_string())
                .or_insert_with(|| ObjectTree::node(config, full_path)),
        )
    }

    /// Insert an object, creating intermediate nodes as needed.
    ///
    /// Excluded keys and keys below an excluded directory are dropped.
    pub fn add_object(&mut self, obj: Object) {
        if obj.key().is_empty() {
            return;
        }

        if let Some(inclusions) = &self.config.inclusions {
            if !inclusions.include(obj.key()) {
                trace!(key = obj.key(), "Key not in inclusion list");
                return;
            }
        }

        let key = obj.key().to_string();
        let Some((leaf, dirs)) = key.rsplit_once('/').map(|(d, l)| (l, d)) else {
            self.add_direct_object(obj);
            return;
        };
        // Empty directory segments (`a//b`) collapse; an empty leaf (`a/`) stays.
        let mut parts: Vec<&str> = dirs.split('/').filter(|s| !s.is_empty()).collect();
        parts.push(leaf);

        let strip = &self.config.prefix_segments;
        if !strip.is_empty()
            && parts.len() > strip.len()
            && parts.iter().zip(strip.iter()).all(|(p, s)| *p == s)
        {
            parts.drain(..strip.len());
        }

        self.add_path(&parts, obj);
    }

    fn add_path(&mut self, parts: &[&str], obj: Object) {
        match parts {
            [first, rest @ ..] if !rest.is_empty() => {
                if let Some(child) = self.add_child(first) {
                    child.add_path(rest, obj);
                }
            }
            _ => self.add_direct_object(obj),
        }
    }

    fn add_direct_object(&mut self, obj: Object) {
        if self.config.exclusions.include(obj.key()) {
            self.objects.push(obj);
        } else {
            trace!(key = obj.key(), "Excluded object");
        }
    }

    /// Insert many objects. `None` entries are skipped.
    pub fn add_objects<I, O>(&mut self, objects: I)
    where
        I: IntoIterator<Item = O>,
        O: Into<Option<Object>>,
    {
        for obj in objects.into_iter().filter_map(Into::into) {
            self.add_object(obj);
        }
    }

    /// List `prefix` through `source` and insert every returned object.
    ///
    /// Returns the number of objects listed. A listing failure leaves the
    /// tree untouched.
    pub async fn add_objects_from_source<S>(&mut self, source: &S, prefix: &str) -> Result<usize>
    where
        S: ObjectSource + ?Sized,
    {
        let objects = source.list_objects(prefix).await.map_err(|e| match e {
            RiError::Listing(_) => e,
            other => RiError::Listing(other.to_string()),
        })?;

        let listed = objects.len();
        self.add_objects(objects);

        debug!(
            prefix,
            listed,
            stored = self.object_count(),
            "Added objects from source"
        );

        Ok(listed)
    }

    /// Total number of objects in this subtree.
    pub fn object_count(&self) -> usize {
        self.objects.len()
            + self
                .children
                .values()
                .map(ObjectTree::object_count)
                .sum::<usize>()
    }

    /// Number of nodes in this subtree, including this one.
    pub fn directory_count(&self) -> usize {
        1 + self
            .children
            .values()
            .map(ObjectTree::directory_count)
            .sum::<usize>()
    }

    /// Visit every node in pre-order.
    pub fn walk<F>(&self, f: &mut F)
    where
        F: FnMut(&ObjectTree),
    {
        f(self);
        for child in self.children.values() {
            child.walk(f);
        }
    }
}

fn base_name(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return "/";
    }
    trimmed.rsplit('/').next().unwrap_or(trimmed)
}
