//! CLI argument definitions for ri-indexer.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use ri_cli_common::LogLevel;

/// Generate index.html and index.json files for every directory of an S3
/// bucket listing.
///
/// ## Examples
///
/// Write indexes back into the bucket:
///   ri-indexer my-releases
///
/// Render a single page locally from a prefix, using tag metadata:
///   ri-indexer my-releases --object-prefix releases/ --index-type singlepage \
///       --metadata-source tags --output-dir ./site
#[derive(Parser, Debug)]
#[command(name = "ri-indexer")]
#[command(version, about, long_about = None)]
pub struct Cli {
    // === Source ===
    /// Bucket to index
    #[arg(env = "BUCKET")]
    pub bucket: String,

    /// Only index keys under this prefix; it is also stripped from tree paths
    #[arg(long, env = "OBJECT_PREFIX", default_value = "")]
    pub object_prefix: String,

    /// Custom S3 endpoint URL (for LocalStack)
    #[arg(long, env = "S3_ENDPOINT")]
    pub s3_endpoint: Option<String>,

    /// AWS region
    #[arg(long, env = "AWS_REGION")]
    pub region: Option<String>,

    /// AWS profile name
    #[arg(long, env = "AWS_PROFILE")]
    pub profile: Option<String>,

    // === Index layout ===
    /// One page per directory, or a single page at the root
    #[arg(long, env = "INDEX_TYPE", value_enum, default_value = "multipage")]
    pub index_type: IndexType,

    /// HTML template name (defaults to `<index-type>.index.html.tmpl`)
    #[arg(long, env = "INDEX_TEMPLATE")]
    pub index_template: Option<String>,

    /// Where release metadata is read from
    #[arg(long, env = "METADATA_SOURCE", value_enum, default_value = "key")]
    pub metadata_source: MetadataSourceArg,

    /// Named-capture regex for key metadata, tried in order (repeatable)
    #[arg(long = "key-pattern")]
    pub key_patterns: Vec<String>,

    // === Filtering ===
    /// Do not apply the built-in exclusions (index files, favicon, dotfiles)
    #[arg(long)]
    pub no_default_exclusions: bool,

    /// Exclude an exact key or directory name (repeatable)
    #[arg(long = "exclude-key")]
    pub exclude_keys: Vec<String>,

    /// Exclude keys and directory names starting with this value (repeatable)
    #[arg(long = "exclude-prefix")]
    pub exclude_prefixes: Vec<String>,

    /// Exclude keys and directory names ending with this value (repeatable)
    #[arg(long = "exclude-suffix")]
    pub exclude_suffixes: Vec<String>,

    /// Only index keys starting with one of these values (repeatable)
    #[arg(long = "include-prefix")]
    pub include_prefixes: Vec<String>,

    // === Destination ===
    /// Write to a local directory instead of a bucket
    #[arg(long, env = "LOCAL_OUTPUT_DIRECTORY", conflicts_with = "destination_bucket")]
    pub output_dir: Option<PathBuf>,

    /// Bucket receiving index files (defaults to the indexed bucket)
    #[arg(long, env = "DESTINATION_BUCKET")]
    pub destination_bucket: Option<String>,

    /// Key prefix for index files (defaults to the object prefix)
    #[arg(long, env = "DESTINATION_PREFIX")]
    pub destination_prefix: Option<String>,

    /// Server-side encryption for uploaded index files, e.g. aws:kms
    #[arg(long, env = "SSE")]
    pub sse: Option<String>,

    /// Copy `static/` from this local directory into the destination
    #[arg(long, env = "STATIC_DIRECTORY", conflicts_with = "static_bucket_url")]
    pub static_dir: Option<PathBuf>,

    /// Copy `static/` from this s3://bucket/prefix into the destination
    #[arg(long, env = "STATIC_BUCKET_URL")]
    pub static_bucket_url: Option<String>,

    // === Concurrency ===
    /// Maximum concurrent tag fetches (defaults to available parallelism)
    #[arg(long, value_parser = parse_positive_usize)]
    pub tag_concurrency: Option<usize>,

    /// Maximum sibling directories rendered at once
    #[arg(long, default_value = "10", value_parser = parse_positive_usize)]
    pub render_concurrency: usize,

    // === Logging ===
    /// Log level
    #[arg(long, env = "LOG_LEVEL", value_enum, default_value = "info")]
    pub log_level: LogLevel,
}

impl Cli {
    /// The template to render, falling back to the one named after the index type.
    pub fn template_name(&self) -> String {
        self.index_template
            .clone()
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| format!("{}.index.html.tmpl", self.index_type.as_str()))
    }

    pub fn destination_prefix(&self) -> &str {
        self.destination_prefix
            .as_deref()
            .unwrap_or(&self.object_prefix)
    }
}

/// Index layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum IndexType {
    /// One index per directory
    Multipage,
    /// A single index at the root listing the whole tree
    Singlepage,
}

impl IndexType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Multipage => "multipage",
            Self::Singlepage => "singlepage",
        }
    }

    pub fn is_recursive(&self) -> bool {
        matches!(self, Self::Multipage)
    }
}

/// Metadata source argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MetadataSourceArg {
    /// Match object keys against regex patterns
    Key,
    /// Read object tags (one extra request per object)
    Tags,
}

/// Parse a positive usize (>= 1).
fn parse_positive_usize(s: &str) -> Result<usize, String> {
    let value: usize = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;
    if value < 1 {
        return Err(format!("{} is not in 1..", value));
    }
    Ok(value)
}
