//! HTML templates.
//!
//! Two templates are built in and addressed by name:
//!
//! - [`MULTIPAGE_TEMPLATE`]: a listing of a single directory, rendered once
//!   per directory
//! - [`SINGLEPAGE_TEMPLATE`]: a nested listing of the whole tree, rendered
//!   once at the root

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::io::Write;

use ri_error::{Result, RiError};
use ri_tree::ObjectTree;
use ri_types::Object;

use crate::html::Page;

pub const MULTIPAGE_TEMPLATE: &str = "multipage.index.html.tmpl";
pub const SINGLEPAGE_TEMPLATE: &str = "singlepage.index.html.tmpl";

/// Looks up templates by name and executes them against a [`Page`].
pub trait TemplateEngine: Send + Sync {
    /// Render `name` into `out`. Unknown names are [`RiError::Template`].
    fn render(&self, name: &str, page: &Page<'_>, out: &mut dyn Write) -> Result<()>;

    /// Names of all available templates.
    fn names(&self) -> Vec<String>;

    fn contains(&self, name: &str) -> bool {
        self.names().iter().any(|n| n == name)
    }
}

/// Signature of a built-in template.
pub type TemplateFn = fn(&Page<'_>, &mut dyn Write) -> Result<()>;

/// Templates compiled into the binary.
#[derive(Clone)]
pub struct BuiltinTemplates {
    templates: BTreeMap<String, TemplateFn>,
}

impl Default for BuiltinTemplates {
    fn default() -> Self {
        Self::new()
    }
}

impl BuiltinTemplates {
    pub fn new() -> Self {
        let mut templates: BTreeMap<String, TemplateFn> = BTreeMap::new();
        templates.insert(MULTIPAGE_TEMPLATE.to_string(), render_multipage);
        templates.insert(SINGLEPAGE_TEMPLATE.to_string(), render_singlepage);
        Self { templates }
    }

    /// Register an additional template, replacing any with the same name.
    pub fn with_template(mut self, name: impl Into<String>, template: TemplateFn) -> Self {
        self.templates.insert(name.into(), template);
        self
    }
}

impl fmt::Debug for BuiltinTemplates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuiltinTemplates")
            .field("templates", &self.templates.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl TemplateEngine for BuiltinTemplates {
    fn render(&self, name: &str, page: &Page<'_>, out: &mut dyn Write) -> Result<()> {
        let template = self
            .templates
            .get(name)
            .ok_or_else(|| RiError::Template(format!("template '{name}' not found")))?;
        template(page, out)
    }

    fn names(&self) -> Vec<String> {
        self.templates.keys().cloned().collect()
    }
}

const STYLE: &str = "body{font-family:system-ui,sans-serif;margin:2rem auto;max-width:60rem;padding:0 1rem}\
table{border-collapse:collapse;width:100%}\
th,td{padding:.25rem .75rem;text-align:left}\
td.size,th.size{text-align:right}\
tbody tr:nth-child(even){background:#f4f4f4}\
ul.tree{list-style:none;padding-left:1rem}\
summary{cursor:pointer;font-weight:600}\
.meta{color:#666;font-size:.85em;margin-left:.5rem}";

fn write_head(out: &mut dyn Write, nonce: &str, title: &str) -> Result<()> {
    let nonce = escape(nonce);
    let title = escape(title);
    write!(
        out,
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n\
         <meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <meta http-equiv=\"Content-Security-Policy\" content=\"default-src 'none'; style-src 'nonce-{nonce}'; img-src 'self'\">\n\
         <title>{title}</title>\n\
         <style nonce=\"{nonce}\">{STYLE}</style>\n\
         </head>\n<body>\n<h1>{title}</h1>\n"
    )?;
    Ok(())
}

fn write_foot(out: &mut dyn Write) -> Result<()> {
    out.write_all(b"</body>\n</html>\n")?;
    Ok(())
}

fn render_multipage(page: &Page<'_>, out: &mut dyn Write) -> Result<()> {
    let tree = page.tree;
    write_head(out, page.nonce, &format!("Index of {}", tree.full_path()))?;

    out.write_all(
        b"<table>\n<thead><tr><th>Name</th><th>Last modified</th><th class=\"size\">Size</th></tr></thead>\n<tbody>\n",
    )?;

    if !tree.is_root() {
        out.write_all(b"<tr><td><a href=\"../\">../</a></td><td></td><td class=\"size\">-</td></tr>\n")?;
    }

    for name in tree.children().keys() {
        writeln!(
            out,
            "<tr><td><a href=\"{}/\">{}/</a></td><td></td><td class=\"size\">-</td></tr>",
            escape(&url_escape(name)),
            escape(name)
        )?;
    }

    for obj in sorted_objects(tree) {
        writeln!(
            out,
            "<tr><td><a href=\"{}\">{}</a></td><td>{}</td><td class=\"size\">{}</td></tr>",
            escape(&object_href(obj)),
            escape(obj.base_name()),
            modified(obj),
            obj.size()
        )?;
    }

    out.write_all(b"</tbody>\n</table>\n")?;
    write_foot(out)
}

fn render_singlepage(page: &Page<'_>, out: &mut dyn Write) -> Result<()> {
    write_head(out, page.nonce, &format!("Index of {}", page.tree.full_path()))?;
    write_tree(out, page.tree)?;
    write_foot(out)
}

fn write_tree(out: &mut dyn Write, tree: &ObjectTree) -> Result<()> {
    out.write_all(b"<ul class=\"tree\">\n")?;

    for (name, child) in tree.children() {
        writeln!(
            out,
            "<li class=\"dir\"><details open><summary>{}/</summary>",
            escape(name)
        )?;
        write_tree(out, child)?;
        out.write_all(b"</details></li>\n")?;
    }

    for obj in sorted_objects(tree) {
        writeln!(
            out,
            "<li class=\"file\"><a href=\"{}\">{}</a><span class=\"meta\">{} {}</span></li>",
            escape(&object_href(obj)),
            escape(obj.base_name()),
            obj.size(),
            modified(obj)
        )?;
    }

    out.write_all(b"</ul>\n")?;
    Ok(())
}

/// Objects of one directory ordered by base name.
fn sorted_objects(tree: &ObjectTree) -> Vec<&Object> {
    let mut objects: Vec<&Object> = tree.objects().iter().collect();
    objects.sort_by(|a, b| a.base_name().cmp(b.base_name()));
    objects
}

fn object_href(obj: &Object) -> String {
    let path: Vec<Cow<'_, str>> = obj
        .key()
        .split('/')
        .filter(|s| !s.is_empty())
        .map(url_escape)
        .collect();
    format!("/{}", path.join("/"))
}

fn modified(obj: &Object) -> String {
    obj.last_modified()
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default()
}

/// Escape text for use in HTML content and quoted attributes.
pub fn escape(s: &str) -> Cow<'_, str> {
    if !s.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(s);
    }

    let mut escaped = String::with_capacity(s.len() + 8);
    for c in s.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&#34;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    Cow::Owned(escaped)
}

/// Percent-encode a single path segment.
fn url_escape(segment: &str) -> Cow<'_, str> {
    let unreserved = |b: u8| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'_' | b'~' | b'+');
    if segment.bytes().all(unreserved) {
        return Cow::Borrowed(segment);
    }

    let mut encoded = String::with_capacity(segment.len() * 3);
    for b in segment.bytes() {
        if unreserved(b) {
            encoded.push(b as char);
        } else {
            encoded.push_str(&format!("%{b:02X}"));
        }
    }
    Cow::Owned(encoded)
}
