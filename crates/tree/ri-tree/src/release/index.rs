//! Archive, product and version index views.

use std::collections::BTreeMap;

use ri_types::Object;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::{ReleaseExtractor, is_archive_tree, is_product_tree, is_version_tree};
use crate::tree::ObjectTree;
use crate::version::parse_semver;

const SHASUMS_SUFFIX: &str = "_SHA256SUMS";

/// All products found below an archive node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArchiveIndex {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub product: BTreeMap<String, ProductIndex>,
}

impl ArchiveIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the index for an archive node, or `None` if it is not one.
    pub fn for_tree(extractor: &ReleaseExtractor, tree: &ObjectTree) -> Option<Self> {
        if !is_archive_tree(tree) {
            return None;
        }

        let mut index = Self::new();
        for child in tree.children().values() {
            if let Some(product) = ProductIndex::for_tree(extractor, child) {
                index.add_product(product);
            }
        }
        Some(index)
    }

    /// Insert a product, replacing any product with the same name.
    pub fn add_product(&mut self, product: ProductIndex) {
        self.product.insert(product.name.clone(), product);
    }
}

/// Every version of one product plus the latest one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductIndex {
    pub name: String,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub versions: BTreeMap<String, VersionIndex>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest: Option<VersionIndex>,

    /// Parsed versions in ascending order, paired with their map key
    #[serde(skip)]
    sorted: Vec<(semver::Version, String)>,
}

impl ProductIndex {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Build the index for a product node, or `None` if it is not one.
    pub fn for_tree(extractor: &ReleaseExtractor, tree: &ObjectTree) -> Option<Self> {
        if !is_product_tree(tree) {
            return None;
        }

        let mut index = Self::new(tree.dir_name());
        for child in tree.children().values() {
            let Some(version) = VersionIndex::for_tree(extractor, child) else {
                continue;
            };

            // `1.2` and `v1.2` both normalize to `1.2.0`.
            match index.versions.get(&version.version) {
                Some(existing) => {
                    warn!(
                        product = %index.name,
                        version = %version.version,
                        dir = child.dir_name(),
                        "Version directories collide, merging builds"
                    );
                    let mut merged = existing.clone();
                    merged.merge(version);
                    index.add_version(merged);
                }
                None => index.add_version(version),
            }
        }
        Some(index)
    }

    /// Insert a version keyed by its version string.
    ///
    /// Versions that parse as semver take part in `latest`; others are stored
    /// but never become latest.
    pub fn add_version(&mut self, version: VersionIndex) {
        let key = version.version.clone();
        self.versions.insert(key.clone(), version);

        let Ok(parsed) = parse_semver(&key) else {
            return;
        };

        self.sorted.retain(|(_, k)| *k != key);
        let pos = self.sorted.partition_point(|(v, _)| *v <= parsed);
        self.sorted.insert(pos, (parsed, key));

        self.latest = self
            .sorted
            .last()
            .and_then(|(_, k)| self.versions.get(k))
            .cloned();
    }

    /// Version strings in ascending semver order.
    pub fn sorted_versions(&self) -> impl Iterator<Item = &str> {
        self.sorted.iter().map(|(_, k)| k.as_str())
    }
}

/// The builds published under one version directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionIndex {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub builds: Vec<IndexEntry>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub shasums: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,
}

impl VersionIndex {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            ..Self::default()
        }
    }

    /// Build the index for a version node, or `None` if it is not one.
    ///
    /// The product name is the parent directory name. Only direct objects
    /// are considered.
    pub fn for_tree(extractor: &ReleaseExtractor, tree: &ObjectTree) -> Option<Self> {
        if !is_version_tree(tree) {
            return None;
        }

        let mut index = Self::new(
            tree.parent_name(),
            crate::version::normalize_version(tree.dir_name()),
        );

        for obj in tree.objects() {
            if let Some(entry) = IndexEntry::from_object(extractor, obj) {
                index.add_build(entry);
            }
            if obj.key().ends_with(SHASUMS_SUFFIX) {
                index.shasums = obj.key().to_string();
            }
        }
        index.builds.sort_by(|a, b| a.filename.cmp(&b.filename));
        Some(index)
    }

    pub fn add_build(&mut self, entry: IndexEntry) {
        self.builds.push(entry);
    }

    /// Fold in the builds of another directory carrying the same version.
    ///
    /// Existing shasums win; builds stay sorted by file name.
    pub fn merge(&mut self, other: VersionIndex) {
        self.builds.extend(other.builds);
        self.builds.sort_by(|a, b| a.filename.cmp(&b.filename));
        if self.shasums.is_empty() {
            self.shasums = other.shasums;
        }
    }
}

/// One downloadable build.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub arch: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub filename: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub os: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub url: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,
}

impl IndexEntry {
    /// Build an entry from an object, or `None` if no version can be extracted.
    pub fn from_object(extractor: &ReleaseExtractor, obj: &Object) -> Option<Self> {
        let details = extractor.extract(obj)?;

        Some(Self {
            arch: details.arch().to_string(),
            filename: obj.base_name().to_string(),
            name: details.product().to_string(),
            os: details.os().to_string(),
            url: object_url(obj.key()),
            version: details.version().to_string(),
        })
    }
}

/// Absolute URL path for a key: leading `/`, no empty segments.
fn object_url(key: &str) -> String {
    let segments: Vec<&str> = key.split('/').filter(|s| !s.is_empty()).collect();
    format!("/{}", segments.join("/"))
}
