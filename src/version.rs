//! Semantic version extraction and ordering
//!
//! Release tags are accepted in two shapes:
//! - Plain tags: "1.2.3", "v1.2.3", "v1.2.3-rc.1", "1.2.3-beta2"
//! - Tags rewritten by a package's tag patterns, which may carry any
//!   semver pre-release and build metadata ("1.2.3-dev4+77")
//!
//! A version keeps the text it was written with, so "v2019.01.15" is
//! published as "2019.01.15". Ordering follows semver precedence on the
//! numeric values: leading zeros are not significant and a pre-release
//! sorts before the release it precedes.

use std::cmp::Ordering;
use std::fmt;
use std::sync::OnceLock;

use anyhow::{anyhow, bail, Result};
use regex::Regex;
use semver::Version;

/// Grammar for tags of repositories that declare no tag patterns
const RELEASE_TAG_PATTERN: &str = r"^v?(\d+\.\d+\.\d+)(-((?i:rc|alpha|beta)\.?\d+))?$";

fn release_tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(RELEASE_TAG_PATTERN).expect("release tag grammar is valid"))
}

/// A release version as written, ordered by semver precedence
///
/// Equality and ordering use the numeric values, so "1.02.0" and "1.2.0"
/// are the same version.
#[derive(Debug, Clone)]
pub struct ReleaseVersion {
    text: String,
    canonical: Version,
}

impl ReleaseVersion {
    /// Parse `major.minor.patch[-pre][+build]`, tolerating leading zeros
    pub fn parse(text: &str) -> Option<Self> {
        let canonical = Version::parse(&canonicalize(text)?).ok()?;
        Some(Self {
            text: text.to_string(),
            canonical,
        })
    }

    /// The version as it will be published
    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl PartialEq for ReleaseVersion {
    fn eq(&self, other: &Self) -> bool {
        self.canonical == other.canonical
    }
}

impl Eq for ReleaseVersion {}

impl PartialOrd for ReleaseVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ReleaseVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.canonical.cmp(&other.canonical)
    }
}

impl fmt::Display for ReleaseVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Rewrite numeric identifiers without leading zeros
///
/// Returns `None` when the core is not three numeric components or a
/// pre-release identifier is empty. Build metadata is kept verbatim.
fn canonicalize(text: &str) -> Option<String> {
    let (rest, build) = match text.split_once('+') {
        Some((rest, build)) => (rest, Some(build)),
        None => (text, None),
    };
    let (core, pre) = match rest.split_once('-') {
        Some((core, pre)) => (core, Some(pre)),
        None => (rest, None),
    };

    let parts: Vec<&str> = core.split('.').collect();
    if parts.len() != 3 {
        return None;
    }
    let numbers = parts
        .iter()
        .map(|p| numeric(p).map(|n| n.to_string()))
        .collect::<Option<Vec<_>>>()?;

    let mut canonical = numbers.join(".");
    if let Some(pre) = pre {
        let identifiers = pre
            .split('.')
            .map(|id| match numeric(id) {
                Some(n) => Some(n.to_string()),
                None if !id.is_empty() => Some(id.to_string()),
                None => None,
            })
            .collect::<Option<Vec<_>>>()?;
        canonical.push('-');
        canonical.push_str(&identifiers.join("."));
    }
    if let Some(build) = build {
        canonical.push('+');
        canonical.push_str(build);
    }

    Some(canonical)
}

fn numeric(s: &str) -> Option<u64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// Parse a tag written without any naming convention
///
/// Returns `None` for anything outside the release grammar.
pub fn parse_release_tag(tag: &str) -> Option<ReleaseVersion> {
    let caps = release_tag_regex().captures(tag)?;
    let core = caps.get(1)?.as_str();

    let version = match caps.get(3) {
        Some(pre) => format!("{}-{}", core, pre.as_str()),
        None => core.to_string(),
    };

    ReleaseVersion::parse(&version)
}

/// Parse the output of pattern-driven normalization
pub fn parse_normalized(version: &str) -> Option<ReleaseVersion> {
    ReleaseVersion::parse(version)
}

/// Parse a minimum version leniently
///
/// A leading 'v' is dropped and missing minor/patch components default to 0,
/// so "1.0" and "v2" are accepted.
pub fn parse_min_version(input: &str) -> Result<ReleaseVersion> {
    let trimmed = input.trim();
    let stripped = trimmed
        .strip_prefix('v')
        .or_else(|| trimmed.strip_prefix('V'))
        .unwrap_or(trimmed);

    if stripped.is_empty() {
        bail!("Empty minimum version");
    }

    // Split off pre-release and build metadata before padding the core
    let split = stripped.find(|c| c == '-' || c == '+').unwrap_or(stripped.len());
    let (core, rest) = stripped.split_at(split);

    let parts: Vec<&str> = core.split('.').collect();
    if parts.len() > 3 || parts.iter().any(|p| p.is_empty()) {
        bail!("Invalid minimum version '{}'", input);
    }

    let mut padded = parts.join(".");
    for _ in parts.len()..3 {
        padded.push_str(".0");
    }
    padded.push_str(rest);

    ReleaseVersion::parse(&padded).ok_or_else(|| anyhow!("Invalid minimum version '{}'", input))
}

/// Check whether a version falls below a minimum version
///
/// Build metadata does not take part in the comparison.
pub fn is_below_minimum(version: &ReleaseVersion, minimum: &ReleaseVersion) -> bool {
    let (a, b) = (&version.canonical, &minimum.canonical);
    (a.major, a.minor, a.patch, &a.pre) < (b.major, b.minor, b.patch, &b.pre)
}
