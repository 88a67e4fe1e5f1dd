//! Index renderer trait.

use std::io::Write;

use ri_error::Result;
use ri_tree::ObjectTree;

/// Produces one index file for a tree node.
///
/// Rendering is synchronous and writes into a caller-provided buffer; the
/// caller is responsible for persisting the bytes under [`index_file`].
///
/// [`index_file`]: IndexRenderer::index_file
pub trait IndexRenderer: Send + Sync {
    /// File name written in every rendered directory, e.g. `index.json`.
    fn index_file(&self) -> &str;

    fn render(&self, out: &mut dyn Write, tree: &ObjectTree) -> Result<()>;
}
