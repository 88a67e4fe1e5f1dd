//! Release metadata extraction from object keys or tags.

use std::collections::BTreeMap;

use regex::Regex;
use ri_error::{Result, RiError};
use ri_types::{IndexConfig, MetadataSource, Object, TagNames};
use serde::Serialize;
use tracing::trace;

use crate::version::normalize_version;

pub const PRODUCT: &str = "Product";
pub const VERSION: &str = "Version";
pub const OS: &str = "OS";
pub const ARCH: &str = "Arch";

/// Named metadata fields extracted for one object.
///
/// Key patterns contribute every named capture group; tags contribute
/// `Product`, `Version`, `OS` and `Arch`. `Version` is always normalized.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReleaseDetails(BTreeMap<String, String>);

impl ReleaseDetails {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn product(&self) -> &str {
        self.get(PRODUCT).unwrap_or_default()
    }

    pub fn version(&self) -> &str {
        self.get(VERSION).unwrap_or_default()
    }

    pub fn os(&self) -> &str {
        self.get(OS).unwrap_or_default()
    }

    pub fn arch(&self) -> &str {
        self.get(ARCH).unwrap_or_default()
    }

    pub fn fields(&self) -> &BTreeMap<String, String> {
        &self.0
    }

    fn with_normalized_version(mut self) -> Option<Self> {
        let version = self.0.get(VERSION).filter(|v| !v.is_empty())?;
        let normalized = normalize_version(version);
        self.0.insert(VERSION.to_string(), normalized);
        Some(self)
    }
}

#[derive(Debug, Clone)]
enum Strategy {
    Tags(TagNames),
    Key(Vec<Regex>),
}

/// Compiled extraction strategy built from an [`IndexConfig`].
#[derive(Debug, Clone)]
pub struct ReleaseExtractor {
    strategy: Strategy,
}

impl ReleaseExtractor {
    /// Compile the configured metadata source.
    ///
    /// Returns [`RiError::Config`] if a key pattern is not a valid regex.
    pub fn new(config: &IndexConfig) -> Result<Self> {
        let strategy = match &config.metadata {
            MetadataSource::Tags(names) => Strategy::Tags(names.clone()),
            MetadataSource::Key { patterns } => {
                let compiled = patterns
                    .iter()
                    .map(|p| {
                        Regex::new(p).map_err(|e| {
                            RiError::Config(format!("invalid key pattern '{p}': {e}"))
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;
                Strategy::Key(compiled)
            }
        };

        Ok(Self { strategy })
    }

    /// Whether extraction reads object tags.
    pub fn uses_tags(&self) -> bool {
        matches!(self.strategy, Strategy::Tags(_))
    }

    /// Extract release details, or `None` if the object carries no version.
    pub fn extract(&self, obj: &Object) -> Option<ReleaseDetails> {
        let details = match &self.strategy {
            Strategy::Tags(names) => from_tags(names, obj),
            Strategy::Key(patterns) => patterns.iter().find_map(|re| from_key(re, obj.key())),
        };

        let details = details.and_then(ReleaseDetails::with_normalized_version);
        if details.is_none() {
            trace!(key = obj.key(), "No release details");
        }
        details
    }
}

fn from_key(re: &Regex, key: &str) -> Option<ReleaseDetails> {
    let caps = re.captures(key)?;

    let fields = re
        .capture_names()
        .flatten()
        .map(|name| {
            let value = caps.name(name).map(|m| m.as_str()).unwrap_or_default();
            (name.to_string(), value.to_string())
        })
        .collect();

    Some(ReleaseDetails(fields))
}

fn from_tags(names: &TagNames, obj: &Object) -> Option<ReleaseDetails> {
    let version = obj.tag(&names.version)?;

    let mut fields = BTreeMap::new();
    fields.insert(VERSION.to_string(), version.to_string());
    for (field, tag) in [(PRODUCT, &names.product), (OS, &names.os), (ARCH, &names.arch)] {
        if let Some(value) = obj.tag(tag) {
            fields.insert(field.to_string(), value.to_string());
        }
    }

    Some(ReleaseDetails(fields))
}
