//! Semantic-version normalization.
//!
//! Release directories are often named loosely (`v2`, `1.4`). Before
//! comparison they are normalized into full `major.minor.patch` versions.

use ri_error::{Result, RiError};
use semver::Version;

/// Parse a possibly abbreviated version label.
///
/// - A leading `v`/`V` is stripped
/// - A bare major number gets `.0.0` appended
/// - A `major.minor` pair gets `.0` appended
pub fn parse_semver(label: &str) -> Result<Version> {
    let mut version = label
        .strip_prefix(['v', 'V'])
        .unwrap_or(label)
        .to_string();

    if version.is_empty() {
        return Err(RiError::Config(format!("empty version label '{label}'")));
    }

    match version.matches('.').count() {
        0 => version.push_str(".0.0"),
        1 => version.push_str(".0"),
        _ => {}
    }

    Version::parse(&version)
        .map_err(|e| RiError::Config(format!("invalid version '{label}': {e}")))
}

/// Returns the canonical semver string, or the label unchanged if it does not parse.
pub fn normalize_version(label: &str) -> String {
    parse_semver(label)
        .map(|v| v.to_string())
        .unwrap_or_else(|_| label.to_string())
}

/// Whether the label parses as a (normalized) semantic version.
pub fn is_version_label(label: &str) -> bool {
    parse_semver(label).is_ok()
}
