//! Configuration types for release metadata extraction.

use serde::{Deserialize, Serialize};

/// Default key pattern for `<prefix>/<product>/<version>/<package>_<os>_<arch>.<ext>` layouts.
pub const DEFAULT_KEY_PATTERN: &str = r"(?P<Prefix>.*?/)?(?P<Product>[^/]+)/(?P<Version>[^/]+)/(?P<PackageName>[^_]+)(_|_(?P<Extra>.*?)_)(?P<OS>[^_\d]+)_(?P<Arch>[^\.]+)\.(?P<ArchiveType>[^/]+)$";

/// Tag names carrying release metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagNames {
    #[serde(default = "default_product_tag")]
    pub product: String,

    #[serde(default = "default_version_tag")]
    pub version: String,

    #[serde(default = "default_os_tag")]
    pub os: String,

    #[serde(default = "default_arch_tag")]
    pub arch: String,
}

impl Default for TagNames {
    fn default() -> Self {
        Self {
            product: default_product_tag(),
            version: default_version_tag(),
            os: default_os_tag(),
            arch: default_arch_tag(),
        }
    }
}

fn default_product_tag() -> String {
    "Dioad/Project".to_string()
}

fn default_version_tag() -> String {
    "Dioad/Version".to_string()
}

fn default_os_tag() -> String {
    "Dioad/OS".to_string()
}

fn default_arch_tag() -> String {
    "Dioad/Architecture".to_string()
}

/// Where release metadata for an object comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MetadataSource {
    /// Read product/version/os/arch from object tags
    Tags(TagNames),

    /// Match the key against named-capture regular expressions, in order
    Key {
        #[serde(default = "default_key_patterns")]
        patterns: Vec<String>,
    },
}

impl Default for MetadataSource {
    fn default() -> Self {
        Self::Key {
            patterns: default_key_patterns(),
        }
    }
}

fn default_key_patterns() -> Vec<String> {
    vec![DEFAULT_KEY_PATTERN.to_string()]
}

/// Configuration for building release indexes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexConfig {
    #[serde(default)]
    pub metadata: MetadataSource,
}

impl IndexConfig {
    /// Create a configuration using the default key pattern.
    pub fn new() -> Self {
        Self::default()
    }

    /// Extract metadata from tags using the given tag names.
    pub fn with_tags(mut self, names: TagNames) -> Self {
        self.metadata = MetadataSource::Tags(names);
        self
    }

    /// Extract metadata from keys using the given patterns, tried in order.
    pub fn with_key_patterns<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.metadata = MetadataSource::Key {
            patterns: patterns.into_iter().map(Into::into).collect(),
        };
        self
    }

    /// Whether objects need their tags fetched before indexing.
    pub fn requires_tags(&self) -> bool {
        matches!(self.metadata, MetadataSource::Tags(_))
    }
}
