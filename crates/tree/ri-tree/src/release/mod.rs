//! Release classification of tree nodes.
//!
//! A *version* node is named `build` or after a semantic version. A
//! *product* node has at least one version child, and an *archive* node has
//! at least one product child.

mod extract;
mod index;

pub use extract::{ReleaseDetails, ReleaseExtractor};
pub use index::{ArchiveIndex, IndexEntry, ProductIndex, VersionIndex};

use serde::Serialize;
use tracing::warn;

use crate::tree::ObjectTree;
use crate::version::is_version_label;

const BUILD_DIR: &str = "build";

pub fn is_version_tree(tree: &ObjectTree) -> bool {
    tree.dir_name() == BUILD_DIR || is_version_label(tree.dir_name())
}

pub fn is_product_tree(tree: &ObjectTree) -> bool {
    tree.children().values().any(is_version_tree)
}

pub fn is_archive_tree(tree: &ObjectTree) -> bool {
    tree.children().values().any(is_product_tree)
}

/// The index document for one node.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ReleaseIndex {
    Archive(ArchiveIndex),
    Product(ProductIndex),
    Version(VersionIndex),
}

impl ReleaseIndex {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Archive(_) => "archive",
            Self::Product(_) => "product",
            Self::Version(_) => "version",
        }
    }
}

/// Build the index for a node, or `None` if the node is unclassified.
///
/// A node can satisfy several classifiers at once. Version wins over
/// archive, which wins over product.
pub fn index_for_tree(extractor: &ReleaseExtractor, tree: &ObjectTree) -> Option<ReleaseIndex> {
    let version = is_version_tree(tree);
    let archive = is_archive_tree(tree);
    let product = is_product_tree(tree);

    if [version, archive, product].into_iter().filter(|m| *m).count() > 1 {
        warn!(
            path = tree.full_path(),
            version, archive, product, "Ambiguous release classification"
        );
    }

    if version {
        VersionIndex::for_tree(extractor, tree).map(ReleaseIndex::Version)
    } else if archive {
        ArchiveIndex::for_tree(extractor, tree).map(ReleaseIndex::Archive)
    } else if product {
        ProductIndex::for_tree(extractor, tree).map(ReleaseIndex::Product)
    } else {
        None
    }
}
