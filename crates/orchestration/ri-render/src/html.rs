//! `index.html` renderer.

use std::io::Write;
use std::sync::Arc;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use rand::RngCore;
use ri_error::Result;
use ri_tree::ObjectTree;

use crate::renderer::IndexRenderer;
use crate::templates::TemplateEngine;

pub const HTML_INDEX_FILE: &str = "index.html";

const NONCE_BYTES: usize = 6;

/// Data handed to an HTML template.
#[derive(Debug, Clone, Copy)]
pub struct Page<'a> {
    /// Per-page value for the Content-Security-Policy header
    pub nonce: &'a str,
    pub tree: &'a ObjectTree,
}

/// Renders a node through a named template.
#[derive(Clone)]
pub struct HtmlRenderer {
    engine: Arc<dyn TemplateEngine>,
    template: String,
}

impl HtmlRenderer {
    pub fn new(engine: Arc<dyn TemplateEngine>, template: impl Into<String>) -> Self {
        Self {
            engine,
            template: template.into(),
        }
    }

    pub fn template(&self) -> &str {
        &self.template
    }
}

impl std::fmt::Debug for HtmlRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HtmlRenderer")
            .field("template", &self.template)
            .finish()
    }
}

impl IndexRenderer for HtmlRenderer {
    fn index_file(&self) -> &str {
        HTML_INDEX_FILE
    }

    fn render(&self, out: &mut dyn Write, tree: &ObjectTree) -> Result<()> {
        let nonce = nonce();
        let page = Page {
            nonce: &nonce,
            tree,
        };
        self.engine.render(&self.template, &page, out)
    }
}

/// Random base64 token, fresh for every page.
pub fn nonce() -> String {
    let mut bytes = [0u8; NONCE_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    STANDARD.encode(bytes)
}
