//! Release discovery from remote Git repositories
//!
//! This module provides:
//! - Remote tag listing (`git ls-remote --tags`)
//! - Tag normalization through per-repository patterns
//! - Ordered version discovery
//!
//! # Overview
//!
//! A repository that tags releases as `v1.2.3` or `1.2.3-rc.1` needs no
//! configuration. Repositories with their own naming convention declare
//! patterns with named groups:
//!
//! ```json
//! "tag-regexp": ["^acme-(?P<major>\\d+)\\.(?P<minor>\\d+)(?:_rc(?P<maturity_RC>\\d+))?$"]
//! ```
//!
//! so that `acme-1.3_rc2` is published as `1.3.0-RC2`.

mod normalizer;
mod remote;
mod version_discovery;

pub use normalizer::TagPatterns;
pub use remote::{GitCli, TagLister};
pub use version_discovery::{DiscoveredVersions, VersionDiscovery};

#[cfg(test)]
pub(crate) use version_discovery::tests::FakeLister;
