//! Package list parsing
//!
//! The package list names the repositories to scan:
//!
//! ```json
//! {
//!     "frontend/fontawesome": {
//!         "url": "git://github.com/FortAwesome/Font-Awesome.git",
//!         "minversion": "2.0",
//!         "defaults": { "homepage": "http://fontawesome.io/" }
//!     },
//!     "frontend/legacy": {
//!         "url": "git://github.com/some/repo.git",
//!         "tag-regexp": ["^acme-(?P<major>\\d+)\\.(?P<minor>\\d+)\\.(?P<patch>\\d+)$"],
//!         "defaults": []
//!     }
//! }
//! ```
//!
//! Entries keep the order in which they are declared.

use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

use crate::error::{hints, ResultExt, SatisfyError};
use crate::registry::TagPatterns;
use crate::version::{parse_min_version, ReleaseVersion};

/// A repository to scan, as declared in the package list
#[derive(Debug, Clone)]
pub struct PackageSpec {
    /// Package name (e.g. "vendor/name")
    pub name: String,

    /// Git repository URL
    pub url: String,

    /// Versions below this one are not published
    pub min_version: Option<ReleaseVersion>,

    /// Tag naming convention of the repository
    pub tag_patterns: Option<TagPatterns>,

    /// Fields copied into every generated package entry
    pub defaults: Map<String, Value>,
}

/// Raw package declaration
#[derive(Debug, Deserialize)]
struct RawPackageSpec {
    url: String,

    #[serde(default)]
    minversion: Option<String>,

    #[serde(rename = "tag-regexp", default)]
    tag_regexp: Option<Vec<String>>,

    #[serde(default, deserialize_with = "deserialize_defaults")]
    defaults: Map<String, Value>,
}

/// `defaults` is an object, but an empty list stands for an empty object
fn deserialize_defaults<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        Value::Array(items) if items.is_empty() => Ok(Map::new()),
        other => Err(serde::de::Error::custom(format!(
            "expected an object for defaults, found {}",
            other
        ))),
    }
}

impl PackageSpec {
    /// Decode and validate one package declaration
    fn from_raw(name: &str, raw: RawPackageSpec) -> Result<Self> {
        if raw.url.trim().is_empty() {
            bail!("Package '{}' has an empty url", name);
        }

        let min_version = raw
            .minversion
            .as_deref()
            .map(parse_min_version)
            .transpose()
            .with_context(|| format!("Invalid minversion for package '{}'", name))?;

        let tag_patterns = match raw.tag_regexp {
            Some(sources) if !sources.is_empty() => Some(
                TagPatterns::compile(&sources)
                    .with_context(|| format!("Invalid tag-regexp for package '{}'", name))?,
            ),
            _ => None,
        };

        Ok(Self {
            name: name.to_string(),
            url: raw.url,
            min_version,
            tag_patterns,
            defaults: raw.defaults,
        })
    }
}

/// All packages to scan, in declaration order
#[derive(Debug, Clone, Default)]
pub struct PackageList {
    packages: Vec<PackageSpec>,
}

impl PackageList {
    /// Load the package list from a JSON file
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, SatisfyError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).context_with_hint(
            format!("Cannot open {}", path.display()),
            hints::package_list(),
        )?;

        Self::parse(&content).map_err(|e| {
            SatisfyError::config_error_with_hint(
                format!("Cannot parse package list in {}", path.display()),
                Some(e),
                hints::package_list(),
            )
        })
    }

    /// Parse a package list from a JSON string
    pub fn parse(content: &str) -> Result<Self> {
        let entries: Map<String, Value> =
            serde_json::from_str(content).context("Package list must be a JSON object")?;

        let mut packages = Vec::with_capacity(entries.len());
        for (name, value) in entries {
            let raw: RawPackageSpec = serde_json::from_value(value)
                .with_context(|| format!("Invalid declaration for package '{}'", name))?;
            packages.push(PackageSpec::from_raw(&name, raw)?);
        }

        Ok(Self { packages })
    }

    pub fn as_slice(&self) -> &[PackageSpec] {
        &self.packages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_package_list_keeps_order() {
        let list = PackageList::parse(
            r#"{
                "zeta/last": { "url": "git://z" },
                "alpha/first": { "url": "git://a", "minversion": "2.0" },
                "mid/dle": { "url": "git://m" }
            }"#,
        )
        .unwrap();

        let names: Vec<&str> = list.as_slice().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["zeta/last", "alpha/first", "mid/dle"]);
        assert_eq!(list.as_slice()[1].min_version.as_ref().unwrap().to_string(), "2.0.0");
        assert!(list.as_slice()[0].min_version.is_none());
    }

    #[test]
    fn test_parse_defaults() {
        let list = PackageList::parse(
            r#"{
                "a/obj": { "url": "git://a", "defaults": { "homepage": "http://a", "autoload": { "classmap": ["."] } } },
                "b/empty-list": { "url": "git://b", "defaults": [] },
                "c/none": { "url": "git://c" }
            }"#,
        )
        .unwrap();

        let packages = list.as_slice();
        let keys: Vec<&str> = packages[0].defaults.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["homepage", "autoload"]);
        assert!(packages[1].defaults.is_empty());
        assert!(packages[2].defaults.is_empty());
    }

    #[test]
    fn test_parse_tag_patterns() {
        let list = PackageList::parse(
            r#"{
                "a/legacy": { "url": "git://a", "tag-regexp": ["^r(?P<major>\\d+)$", "~^rel-(?P<major>\\d+)$~i"] },
                "b/empty": { "url": "git://b", "tag-regexp": [] }
            }"#,
        )
        .unwrap();

        let packages = list.as_slice();
        assert_eq!(packages[0].tag_patterns.as_ref().unwrap().iter().count(), 2);
        assert!(packages[1].tag_patterns.is_none());
    }

    #[test]
    fn test_invalid_package_lists() {
        // Not an object
        assert!(PackageList::parse(r#"["a"]"#).is_err());
        // Not JSON
        assert!(PackageList::parse("{ url: ").is_err());
        // Missing url
        assert!(PackageList::parse(r#"{ "a/a": { "minversion": "1.0" } }"#).is_err());
        // Empty url
        assert!(PackageList::parse(r#"{ "a/a": { "url": " " } }"#).is_err());
        // Bad minversion
        assert!(PackageList::parse(r#"{ "a/a": { "url": "git://a", "minversion": "soon" } }"#).is_err());
        // Bad pattern
        assert!(PackageList::parse(r#"{ "a/a": { "url": "git://a", "tag-regexp": ["(unclosed"] } }"#).is_err());
        // Delimited pattern with a modifier the engine cannot honour
        assert!(PackageList::parse(r#"{ "a/a": { "url": "git://a", "tag-regexp": ["~^r(?P<major>\\d+)$~e"] } }"#).is_err());
        // Non-empty list as defaults
        assert!(PackageList::parse(r#"{ "a/a": { "url": "git://a", "defaults": [1] } }"#).is_err());
    }

    #[test]
    fn test_load_from_path_errors_are_config_errors() {
        let dir = tempfile::tempdir().unwrap();

        let missing = dir.path().join("missing.json");
        let err = PackageList::load_from_path(&missing).unwrap_err();
        assert!(matches!(err, SatisfyError::Config { .. }));
        assert!(err.to_string().contains("Cannot open"));

        let broken = dir.path().join("broken.json");
        std::fs::write(&broken, "not json").unwrap();
        let err = PackageList::load_from_path(&broken).unwrap_err();
        assert!(err.to_string().contains("Cannot parse package list"));
    }
}
