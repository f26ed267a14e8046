//! Folding discovered versions into a manifest
//!
//! Two passes, applied in this order:
//! 1. every discovered version at or above the package's minimum becomes an
//!    inline `"package"` repository appended to `repositories`
//! 2. native `"git"` repositories pointing at a scanned URL are dropped
//!
//! The second pass only looks at `"git"` entries, so nothing added by the
//! first pass is ever removed.

use anyhow::{Context, Result};
use serde_json::Value;

use super::types::{Manifest, ManifestEntry, PackageEntry, PackageSource};
use crate::config::PackageSpec;
use crate::registry::DiscoveredVersions;
use crate::version::is_below_minimum;

/// Name recorded in generated descriptions
pub const GENERATOR: &str = env!("CARGO_PKG_NAME");

/// Versions discovered for one declared package
#[derive(Debug, Clone)]
pub struct PackageReleases<'a> {
    pub spec: &'a PackageSpec,
    pub versions: DiscoveredVersions,
}

/// Outcome of a merge, for reporting
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeSummary {
    /// Package entries appended
    pub added: usize,
    /// Versions below a package's minimum
    pub skipped: usize,
    /// Native git repositories removed
    pub removed: usize,
}

/// Merges discovered releases into a base manifest
pub struct ManifestMerger<'a> {
    packages: &'a [PackageSpec],
}

impl<'a> ManifestMerger<'a> {
    /// Create a merger for the declared packages
    pub fn new(packages: &'a [PackageSpec]) -> Self {
        Self { packages }
    }

    /// Run both passes: addition, then removal
    pub fn merge(
        &self,
        manifest: &mut Manifest,
        releases: &[PackageReleases<'_>],
    ) -> Result<MergeSummary> {
        let (added, skipped) = self.add_releases(manifest, releases)?;
        let removed = self.remove_processed_repositories(manifest);

        Ok(MergeSummary {
            added,
            skipped,
            removed,
        })
    }

    /// Append one package entry per kept version
    ///
    /// Packages keep their declaration order and versions their ascending
    /// order. Returns the number of entries added and of versions skipped.
    pub fn add_releases(
        &self,
        manifest: &mut Manifest,
        releases: &[PackageReleases<'_>],
    ) -> Result<(usize, usize)> {
        let mut found = Vec::new();
        let mut skipped = 0;

        for release in releases {
            let spec = release.spec;
            for (version, tag) in release.versions.iter() {
                if let Some(min) = &spec.min_version {
                    if is_below_minimum(version, min) {
                        skipped += 1;
                        continue;
                    }
                }

                let package = synthesize_package(spec, version.as_str(), tag);
                let entry = ManifestEntry::package(&package).with_context(|| {
                    format!("Failed to build package entry for {} {}", spec.name, version)
                })?;
                found.push(entry);
            }
        }

        let added = found.len();
        manifest.repositories.extend(found);
        Ok((added, skipped))
    }

    /// Drop native git repositories whose URL is one of the scanned packages
    ///
    /// Returns the number of entries removed.
    pub fn remove_processed_repositories(&self, manifest: &mut Manifest) -> usize {
        let before = manifest.repositories.len();
        manifest.repositories.retain(|entry| {
            !self
                .packages
                .iter()
                .any(|spec| entry.is_git_repository_for(&spec.url))
        });
        before - manifest.repositories.len()
    }
}

/// Build the package body for one discovered version
pub fn synthesize_package(spec: &PackageSpec, version: &str, tag: &str) -> PackageEntry {
    let description = match spec.defaults.get("description") {
        Some(Value::String(existing)) => format!("{}; Autogenerated by {}", existing, GENERATOR),
        Some(Value::Null) | None => format!("Autogenerated by {}", GENERATOR),
        Some(other) => format!("{}; Autogenerated by {}", other, GENERATOR),
    };

    PackageEntry {
        defaults: spec.defaults.clone(),
        description,
        name: spec.name.clone(),
        version: version.to_string(),
        source: PackageSource::git(&spec.url, tag),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::config::PackageList;
    use crate::manifest::Manifest;
    use crate::version::ReleaseVersion;

    fn discovered(pairs: &[(&str, &str)]) -> DiscoveredVersions {
        pairs
            .iter()
            .map(|(v, t)| (ReleaseVersion::parse(v).unwrap(), t.to_string()))
            .collect()
    }

    fn package_versions(manifest: &Manifest) -> Vec<(String, String)> {
        manifest
            .repositories
            .iter()
            .filter(|e| e.kind() == "package")
            .map(|e| {
                let package = e.field("package");
                (
                    package["name"].as_str().unwrap().to_string(),
                    package["version"].as_str().unwrap().to_string(),
                )
            })
            .collect()
    }

    #[test]
    fn test_synthesize_package_without_description() {
        let list = PackageList::parse(
            r#"{ "acme/x": { "url": "git://x", "defaults": { "homepage": "http://x" } } }"#,
        )
        .unwrap();
        let package = synthesize_package(&list.as_slice()[0], "1.0.0", "v1.0.0");

        let value = serde_json::to_value(&package).unwrap();
        assert_eq!(
            value,
            json!({
                "homepage": "http://x",
                "description": "Autogenerated by satisfy",
                "name": "acme/x",
                "version": "1.0.0",
                "source": { "url": "git://x", "type": "git", "reference": "v1.0.0" }
            })
        );
    }

    #[test]
    fn test_synthesize_package_appends_to_description() {
        let list = PackageList::parse(
            r#"{ "acme/x": { "url": "git://x", "defaults": { "description": "Icons", "name": "ignored", "version": "9.9.9" } } }"#,
        )
        .unwrap();
        let package = synthesize_package(&list.as_slice()[0], "2.0.0", "2.0.0");

        assert_eq!(package.description, "Icons; Autogenerated by satisfy");

        let value = serde_json::to_value(&package).unwrap();
        assert_eq!(value["name"], "acme/x");
        assert_eq!(value["version"], "2.0.0");

        // No duplicate keys once serialized
        let text = serde_json::to_string(&package).unwrap();
        assert_eq!(text.matches("\"name\"").count(), 1);
        assert_eq!(text.matches("\"version\"").count(), 1);
    }

    #[test]
    fn test_generated_keys_keep_their_declared_position() {
        let list = PackageList::parse(
            r#"{ "acme/x": { "url": "git://x", "defaults": { "homepage": "http://x", "description": "Icons", "name": "ignored", "license": "MIT" } } }"#,
        )
        .unwrap();
        let package = synthesize_package(&list.as_slice()[0], "1.0.0", "v1.0.0");

        let value = serde_json::to_value(&package).unwrap();
        let keys: Vec<&str> = value.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            vec!["homepage", "description", "name", "license", "version", "source"]
        );
        assert_eq!(value["description"], "Icons; Autogenerated by satisfy");
        assert_eq!(value["name"], "acme/x");
    }

    #[test]
    fn test_min_version_boundaries() {
        let list =
            PackageList::parse(r#"{ "acme/x": { "url": "git://x", "minversion": "1.2.3" } }"#)
                .unwrap();
        let spec = &list.as_slice()[0];
        let mut manifest = Manifest::parse(r#"{ "repositories": [] }"#).unwrap();

        let releases = vec![PackageReleases {
            spec,
            versions: discovered(&[("1.2.2", "v1.2.2"), ("1.2.3", "v1.2.3"), ("1.3.0", "v1.3.0")]),
        }];
        let (added, skipped) = ManifestMerger::new(list.as_slice())
            .add_releases(&mut manifest, &releases)
            .unwrap();

        assert_eq!((added, skipped), (2, 1));
        assert_eq!(
            package_versions(&manifest),
            vec![
                ("acme/x".to_string(), "1.2.3".to_string()),
                ("acme/x".to_string(), "1.3.0".to_string()),
            ]
        );
    }

    #[test]
    fn test_addition_keeps_package_and_version_order() {
        let list = PackageList::parse(
            r#"{ "z/first": { "url": "git://z" }, "a/second": { "url": "git://a" } }"#,
        )
        .unwrap();
        let specs = list.as_slice();
        let mut manifest =
            Manifest::parse(r#"{ "repositories": [ { "type": "composer", "url": "https://packagist.org" } ] }"#)
                .unwrap();

        let releases = vec![
            PackageReleases {
                spec: &specs[0],
                versions: discovered(&[("2.0.0", "2.0.0"), ("1.0.0", "1.0.0")]),
            },
            PackageReleases {
                spec: &specs[1],
                versions: discovered(&[("0.1.0", "v0.1.0")]),
            },
        ];
        ManifestMerger::new(specs)
            .add_releases(&mut manifest, &releases)
            .unwrap();

        assert_eq!(manifest.repositories[0].kind(), "composer");
        assert_eq!(
            package_versions(&manifest),
            vec![
                ("z/first".to_string(), "1.0.0".to_string()),
                ("z/first".to_string(), "2.0.0".to_string()),
                ("a/second".to_string(), "0.1.0".to_string()),
            ]
        );
    }

    #[test]
    fn test_removal_only_drops_matching_git_entries() {
        let list = PackageList::parse(r#"{ "acme/x": { "url": "U" } }"#).unwrap();
        let mut manifest = Manifest::parse(
            r#"{ "repositories": [
                { "type": "git", "url": "U" },
                { "type": "git", "url": "U.git" },
                { "type": "vcs", "url": "U" },
                { "type": "package", "url": "U", "package": { "name": "acme/x", "version": "0.0.1" } }
            ] }"#,
        )
        .unwrap();

        let removed = ManifestMerger::new(list.as_slice()).remove_processed_repositories(&mut manifest);

        assert_eq!(removed, 1);
        let kinds: Vec<(&str, Option<&str>)> = manifest
            .repositories
            .iter()
            .map(|e| (e.kind(), e.url()))
            .collect();
        assert_eq!(
            kinds,
            vec![("git", Some("U.git")), ("vcs", Some("U")), ("package", Some("U"))]
        );
    }

    #[test]
    fn test_merge_never_removes_added_entries() {
        let list = PackageList::parse(r#"{ "acme/x": { "url": "git://x" } }"#).unwrap();
        let specs = list.as_slice();
        let mut manifest =
            Manifest::parse(r#"{ "repositories": [ { "type": "git", "url": "git://x" } ] }"#).unwrap();

        let releases = vec![PackageReleases {
            spec: &specs[0],
            versions: discovered(&[("1.0.0", "v1.0.0")]),
        }];
        let summary = ManifestMerger::new(specs).merge(&mut manifest, &releases).unwrap();

        assert_eq!(
            summary,
            MergeSummary {
                added: 1,
                skipped: 0,
                removed: 1
            }
        );
        assert_eq!(manifest.repositories.len(), 1);
        assert_eq!(manifest.repositories[0].kind(), "package");
        assert_eq!(
            manifest.repositories[0].field("package")["source"]["url"],
            json!("git://x")
        );
    }
}
