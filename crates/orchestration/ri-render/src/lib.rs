//! ri-render - index rendering for release-indexer.
//!
//! Walks an [`ObjectTree`](ri_tree::ObjectTree) and writes one set of index
//! files per directory into an [`OutputFs`](ri_traits::OutputFs):
//!
//! - [`JsonRenderer`]: `index.json` holding the release index of the node
//! - [`HtmlRenderer`]: `index.html` produced from a named template
//! - [`TreeRenderer`]: bounded-concurrency recursive driver
//! - [`fs`]: local, S3, in-memory and scoped output filesystems
//! - [`assets`]: copies `static/` assets into the destination

pub mod assets;
pub mod engine;
pub mod fs;
pub mod html;
pub mod json;
pub mod renderer;
pub mod stats;
pub mod templates;

pub use assets::{AssetSource, LocalAssets, S3Assets, copy_static_assets};
pub use engine::TreeRenderer;
pub use html::{HtmlRenderer, Page};
pub use json::JsonRenderer;
pub use renderer::IndexRenderer;
pub use stats::{RenderStats, RenderSummary};
pub use templates::{BuiltinTemplates, MULTIPAGE_TEMPLATE, SINGLEPAGE_TEMPLATE, TemplateEngine};
