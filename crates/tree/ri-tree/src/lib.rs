//! ri-tree - object tree engine for release-indexer.
//!
//! This crate turns a flat listing of object keys into a navigable hierarchy
//! and derives release metadata from it:
//!
//! - Composable path inclusion/exclusion predicates
//! - Tree construction with prefix stripping and exclusion filtering
//! - Semantic-version normalization
//! - Release metadata extraction from keys or tags
//! - Archive / product / version index views over a subtree
//!
//! # Example
//!
//! ```
//! use ri_tree::{Exclusions, ObjectTree, Predicate, TreeConfig};
//! use ri_types::Object;
//!
//! let config = TreeConfig::new()
//!     .with_exclusions(Exclusions::new().with(Predicate::suffix("index.html")));
//!
//! let mut tree = ObjectTree::root(config);
//! tree.add_objects(vec![
//!     Object::from_key("product/1.0.0/product_linux_amd64.zip"),
//!     Object::from_key("product/index.html"),
//! ]);
//!
//! assert_eq!(tree.object_count(), 1);
//! ```

pub mod filter;
pub mod release;
pub mod version;
pub mod tree;

pub use filter::{Exclusions, Inclusions, PathFilter, Predicate};
pub use release::{
    ArchiveIndex, IndexEntry, ProductIndex, ReleaseDetails, ReleaseExtractor, ReleaseIndex,
    VersionIndex, index_for_tree, is_archive_tree, is_product_tree, is_version_tree,
};
pub use version::{is_version_label, normalize_version, parse_semver};
pub use tree::{ObjectTree, TreeConfig};
