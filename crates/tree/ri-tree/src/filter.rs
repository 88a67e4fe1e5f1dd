//! Path filters for tree construction.
//!
//! Paths are tested against an ordered list of [`Predicate`]s. Two
//! compositions exist:
//!
//! - [`Exclusions`] - a path is included only if NO predicate matches
//! - [`Inclusions`] - a path is included if ANY predicate matches (whitelist)
//!
//! # Example
//!
//! ```
//! use ri_tree::filter::{Exclusions, Inclusions, PathFilter, Predicate};
//!
//! let exclusions = Exclusions::new()
//!     .with(Predicate::key("favicon.ico"))
//!     .with(Predicate::prefix("."));
//!
//! assert!(!exclusions.include(".git"));
//! assert!(exclusions.include("product"));
//!
//! let inclusions = Inclusions::new().with(Predicate::prefix("releases/"));
//! assert!(inclusions.include("releases/a.zip"));
//! assert!(!inclusions.include("nightly/a.zip"));
//! ```

/// Trait for deciding whether a path takes part in the tree.
pub trait PathFilter: Send + Sync {
    /// Returns `true` if the path should be included.
    fn include(&self, path: &str) -> bool;

    /// Get a human-readable description of this filter.
    fn description(&self) -> String;
}

/// A single stateless test over a path string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// Path equals the key exactly
    Key(String),
    /// Path starts with the prefix
    Prefix(String),
    /// Path ends with the suffix
    Suffix(String),
}

impl Predicate {
    pub fn key(key: impl Into<String>) -> Self {
        Self::Key(key.into())
    }

    pub fn prefix(prefix: impl Into<String>) -> Self {
        Self::Prefix(prefix.into())
    }

    pub fn suffix(suffix: impl Into<String>) -> Self {
        Self::Suffix(suffix.into())
    }

    /// Check whether the predicate matches a path.
    pub fn matches(&self, path: &str) -> bool {
        match self {
            Self::Key(key) => path == key,
            Self::Prefix(prefix) => path.starts_with(prefix.as_str()),
            Self::Suffix(suffix) => path.ends_with(suffix.as_str()),
        }
    }

    pub fn description(&self) -> String {
        match self {
            Self::Key(key) => format!("key({key})"),
            Self::Prefix(prefix) => format!("prefix({prefix})"),
            Self::Suffix(suffix) => format!("suffix({suffix})"),
        }
    }
}

/// Exclude a path if any predicate matches.
///
/// An empty exclusion list includes every path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Exclusions {
    predicates: Vec<Predicate>,
}

impl Exclusions {
    /// Create an empty exclusion list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Exclusions applied to bucket listings when publishing a download site.
    ///
    /// Skips previously generated index pages, the favicon, hidden entries
    /// and directory markers.
    pub fn default_site() -> Self {
        Self::new()
            .with(Predicate::key("favicon.ico"))
            .with(Predicate::key("index.html"))
            .with(Predicate::prefix("."))
            .with(Predicate::suffix("/"))
            .with(Predicate::suffix("/index.html"))
    }

    /// Add a predicate (builder pattern).
    pub fn with(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    /// Add a predicate.
    pub fn push(&mut self, predicate: Predicate) {
        self.predicates.push(predicate);
    }

    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }
}

impl PathFilter for Exclusions {
    fn include(&self, path: &str) -> bool {
        !self.predicates.iter().any(|p| p.matches(path))
    }

    fn description(&self) -> String {
        describe("exclude", &self.predicates)
    }
}

/// Include a path if any predicate matches.
///
/// An empty inclusion list includes nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inclusions {
    predicates: Vec<Predicate>,
}

impl Inclusions {
    /// Create an empty inclusion list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a predicate (builder pattern).
    pub fn with(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    /// Add a predicate.
    pub fn push(&mut self, predicate: Predicate) {
        self.predicates.push(predicate);
    }

    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }
}

impl PathFilter for Inclusions {
    fn include(&self, path: &str) -> bool {
        self.predicates.iter().any(|p| p.matches(path))
    }

    fn description(&self) -> String {
        describe("include", &self.predicates)
    }
}

fn describe(kind: &str, predicates: &[Predicate]) -> String {
    if predicates.is_empty() {
        return format!("{kind}(empty)");
    }
    let descriptions: Vec<String> = predicates.iter().map(Predicate::description).collect();
    format!("{kind}({})", descriptions.join(" OR "))
}
