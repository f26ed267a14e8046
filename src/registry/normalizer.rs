//! Tag name normalization
//!
//! Repositories that do not tag releases as `v1.2.3` declare one or more
//! patterns with named capture groups. The first pattern that matches a tag
//! decides how it is rewritten into `major.minor.patch[-maturity][+build]`.
//!
//! Recognised groups: `major`, `minor`, `patch`, `maturity`, `maturity_dev`,
//! `maturity_alpha`, `maturity_beta`, `maturity_RC` and `build`.

use anyhow::{bail, Context, Result};
use regex::{Captures, Regex};

use crate::error::SatisfyError;

/// Maturity groups in priority order, with the prefix each one contributes
const MATURITY_GROUPS: [(&str, &str); 5] = [
    ("maturity", "-"),
    ("maturity_dev", "-dev"),
    ("maturity_alpha", "-alpha"),
    ("maturity_beta", "-beta"),
    ("maturity_RC", "-RC"),
];

/// Characters accepted as PCRE-style pattern delimiters
const DELIMITERS: [char; 6] = ['/', '~', '#', '%', '!', '@'];

/// Inline flags that may follow a closing delimiter
const DELIMITER_FLAGS: &str = "imsxU";

/// Modifiers the regex engine already applies (Unicode, strict `$`, study)
const NOOP_FLAGS: &str = "uDS";

/// A single compiled tag pattern
#[derive(Debug, Clone)]
pub struct TagPattern {
    /// Pattern as written in the package list
    source: String,
    regex: Regex,
}

impl TagPattern {
    /// Compile a pattern, accepting PCRE-style delimiters and flags
    pub fn compile(source: &str) -> Result<Self> {
        let translated = strip_delimiters(source)
            .with_context(|| format!("Invalid tag pattern '{}'", source))?;
        let regex = Regex::new(&translated)
            .with_context(|| format!("Invalid tag pattern '{}'", source))?;

        Ok(Self {
            source: source.to_string(),
            regex,
        })
    }

    /// The pattern as written in the package list
    pub fn as_str(&self) -> &str {
        &self.source
    }
}

/// Ordered set of tag patterns for one repository
#[derive(Debug, Clone, Default)]
pub struct TagPatterns {
    patterns: Vec<TagPattern>,
}

impl TagPatterns {
    /// Compile every pattern, failing on the first invalid one
    pub fn compile<I, S>(sources: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = sources
            .into_iter()
            .map(|s| TagPattern::compile(s.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TagPattern> {
        self.patterns.iter()
    }
}

/// Rewrite a raw tag into a version string
///
/// Without patterns the tag is returned unchanged. Otherwise the first
/// matching pattern wins; a tag matching none of them is a
/// [`SatisfyError::TagFormat`] naming the last pattern tried.
pub fn normalize(tag: &str, patterns: Option<&TagPatterns>) -> Result<String, SatisfyError> {
    let patterns = match patterns {
        Some(p) if !p.is_empty() => p,
        _ => return Ok(tag.to_string()),
    };

    let mut last_tried = None;
    for pattern in patterns.iter() {
        last_tried = Some(pattern);
        if let Some(caps) = pattern.regex.captures(tag) {
            return Ok(assemble(&caps));
        }
    }

    let pattern = last_tried.map(TagPattern::as_str).unwrap_or_default();
    Err(SatisfyError::tag_format(tag, pattern))
}

/// Build `major.minor.patch[maturity][build]` from a successful match
fn assemble(caps: &Captures<'_>) -> String {
    let major = group(caps, "major").unwrap_or("0");
    let minor = group(caps, "minor").unwrap_or("0");
    let patch = group(caps, "patch").unwrap_or("0");

    let maturity = MATURITY_GROUPS
        .iter()
        .find_map(|(name, prefix)| group(caps, name).map(|value| format!("{}{}", prefix, value)))
        .unwrap_or_default();

    let build = group(caps, "build")
        .map(|value| format!("+{}", value))
        .unwrap_or_default();

    format!("{}.{}.{}{}{}", major, minor, patch, maturity, build)
}

/// A group counts only if it took part in the match with a non-empty value
fn group<'t>(caps: &Captures<'t>, name: &str) -> Option<&'t str> {
    caps.name(name).map(|m| m.as_str()).filter(|s| !s.is_empty())
}

/// Turn `~body~flags` into `(?flags)body`; anything else is used verbatim
///
/// A delimited pattern with a modifier the engine cannot honour is an error.
fn strip_delimiters(pattern: &str) -> Result<String> {
    let first = match pattern.chars().next() {
        Some(c) if DELIMITERS.contains(&c) => c,
        _ => return Ok(pattern.to_string()),
    };

    let end = match pattern.rfind(first) {
        Some(end) if end > 0 => end,
        _ => return Ok(pattern.to_string()),
    };

    let body = &pattern[1..end];
    let modifiers = &pattern[end + 1..];
    if !modifiers.chars().all(|c| c.is_ascii_alphabetic()) {
        return Ok(pattern.to_string());
    }

    let mut flags = String::new();
    for c in modifiers.chars() {
        if DELIMITER_FLAGS.contains(c) {
            if !flags.contains(c) {
                flags.push(c);
            }
        } else if !NOOP_FLAGS.contains(c) {
            bail!("Unsupported pattern modifier '{}'", c);
        }
    }

    if flags.is_empty() {
        Ok(body.to_string())
    } else {
        Ok(format!("(?{}){}", flags, body))
    }
}
