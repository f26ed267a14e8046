//! Version discovery from remote Git tags
//!
//! This module turns the tags of a remote repository into an ordered set of
//! release versions:
//! - Tags are listed without cloning
//! - Each tag is normalized through the repository's tag patterns, if any
//! - Tags that do not look like a release are dropped
//! - Versions are kept in ascending semver precedence order

use std::collections::BTreeMap;
use std::time::Instant;

use super::normalizer::{normalize, TagPatterns};
use super::remote::TagLister;
use crate::error::SatisfyError;
use crate::utils::terminal::{print_verbose, print_warning};
use crate::version::{parse_normalized, parse_release_tag, ReleaseVersion};

/// Versions found in a repository, mapped to the tag each one came from
///
/// Iteration is in ascending version order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoveredVersions {
    versions: BTreeMap<ReleaseVersion, String>,
}

impl DiscoveredVersions {
    /// Record a version; a later tag for the same version replaces the earlier one
    ///
    /// The version text is replaced too, so "1.02.0" followed by "1.2.0"
    /// publishes "1.2.0".
    pub fn insert(&mut self, version: ReleaseVersion, tag: impl Into<String>) -> Option<String> {
        let previous = self.versions.remove(&version);
        self.versions.insert(version, tag.into());
        previous
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    /// Iterate (version, tag) pairs in ascending version order
    pub fn iter(&self) -> impl Iterator<Item = (&ReleaseVersion, &str)> {
        self.versions.iter().map(|(v, t)| (v, t.as_str()))
    }
}

impl FromIterator<(ReleaseVersion, String)> for DiscoveredVersions {
    fn from_iter<I: IntoIterator<Item = (ReleaseVersion, String)>>(iter: I) -> Self {
        let mut discovered = Self::default();
        for (version, tag) in iter {
            discovered.insert(version, tag);
        }
        discovered
    }
}

/// Version discovery service
pub struct VersionDiscovery<'a, L: TagLister + ?Sized> {
    lister: &'a L,
    verbose: bool,
}

impl<'a, L: TagLister + ?Sized> VersionDiscovery<'a, L> {
    /// Create a discovery service over a tag source
    pub fn new(lister: &'a L) -> Self {
        Self {
            lister,
            verbose: false,
        }
    }

    /// Report discarded tags and VCS failures on stderr
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Collect every valid version of a repository
    ///
    /// A VCS failure counts as "no tags". With patterns, a tag matching none
    /// of them aborts discovery with [`SatisfyError::TagFormat`]; without
    /// patterns, tags outside the release grammar are skipped. No minimum
    /// version is applied here.
    pub fn discover_versions(
        &self,
        url: &str,
        patterns: Option<&TagPatterns>,
    ) -> Result<DiscoveredVersions, SatisfyError> {
        let start = Instant::now();
        let tags = match self.lister.list_remote_tags(url) {
            Ok(tags) => {
                print_verbose(
                    self.verbose,
                    &format!("  {}: {} tag(s) listed in {:.2?}", url, tags.len(), start.elapsed()),
                );
                tags
            }
            Err(e) => {
                print_warning(&e.to_string());
                Vec::new()
            }
        };

        let patterned = patterns.map_or(false, |p| !p.is_empty());
        let mut discovered = DiscoveredVersions::default();

        for tag in &tags {
            let normalized = normalize(&tag.name, patterns)?;

            let version = if patterned {
                parse_normalized(&normalized)
            } else {
                parse_release_tag(&normalized)
            };

            match version {
                Some(version) => {
                    if let Some(previous) = discovered.insert(version, tag.name.clone()) {
                        if previous != tag.name {
                            print_verbose(
                                self.verbose,
                                &format!("  {}: tag '{}' replaces '{}'", url, tag.name, previous),
                            );
                        }
                    }
                }
                None => print_verbose(
                    self.verbose,
                    &format!("  {}: skipping tag '{}' (not a release version)", url, tag.name),
                ),
            }
        }

        Ok(discovered)
    }

    /// Collect versions for a named package, failing when none are found
    pub fn discover_package(
        &self,
        name: &str,
        url: &str,
        patterns: Option<&TagPatterns>,
    ) -> Result<DiscoveredVersions, SatisfyError> {
        let discovered = self.discover_versions(url, patterns)?;
        if discovered.is_empty() {
            return Err(SatisfyError::no_tags_found(name, url));
        }
        Ok(discovered)
    }
}
