//! `index.json` renderer.

use std::io::Write;
use std::sync::Arc;

use ri_error::{Result, RiError};
use ri_tree::{ObjectTree, ReleaseExtractor, index_for_tree};

use crate::renderer::IndexRenderer;

pub const JSON_INDEX_FILE: &str = "index.json";

/// Writes the node's release index as JSON, or `null` when unclassified.
#[derive(Debug, Clone)]
pub struct JsonRenderer {
    extractor: Arc<ReleaseExtractor>,
}

impl JsonRenderer {
    pub fn new(extractor: Arc<ReleaseExtractor>) -> Self {
        Self { extractor }
    }
}

impl IndexRenderer for JsonRenderer {
    fn index_file(&self) -> &str {
        JSON_INDEX_FILE
    }

    fn render(&self, out: &mut dyn Write, tree: &ObjectTree) -> Result<()> {
        let index = index_for_tree(&self.extractor, tree);

        serde_json::to_writer(&mut *out, &index).map_err(|e| {
            RiError::Serialize(format!("index for {}: {e}", tree.full_path()))
        })?;
        out.write_all(b"\n")?;
        Ok(())
    }
}
