//! Run orchestration
//!
//! A run moves through fixed stages:
//!
//! ```text
//! Idle → PackagesLoaded → ManifestLoaded → Merged → Written
//! ```
//!
//! Every package is scanned before the manifest is touched. The first
//! failure aborts the run, so either the complete manifest is written or
//! nothing is.

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use rayon::prelude::*;

use crate::config::{PackageList, PackageSpec};
use crate::error::SatisfyError;
use crate::manifest::{Manifest, ManifestMerger, MergeSummary, PackageReleases};
use crate::registry::{TagLister, VersionDiscovery};
use crate::utils::terminal::{create_progress_bar, print_verbose};

/// Stage of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    PackagesLoaded,
    ManifestLoaded,
    Merged,
    Written,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Idle => write!(f, "idle"),
            Stage::PackagesLoaded => write!(f, "packages loaded"),
            Stage::ManifestLoaded => write!(f, "manifest loaded"),
            Stage::Merged => write!(f, "merged"),
            Stage::Written => write!(f, "written"),
        }
    }
}

/// Where the final manifest goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    Stdout,
    File(PathBuf),
}

impl OutputTarget {
    /// File output when a path is given, stdout otherwise
    pub fn from_path(path: Option<PathBuf>) -> Self {
        match path {
            Some(path) => Self::File(path),
            None => Self::Stdout,
        }
    }
}

impl fmt::Display for OutputTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputTarget::Stdout => write!(f, "stdout"),
            OutputTarget::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Drives discovery and merging for one run
pub struct Orchestrator<L: TagLister> {
    lister: L,
    jobs: usize,
    verbose: bool,
    stage: Stage,
    packages: Option<PackageList>,
    manifest: Option<Manifest>,
}

impl<L: TagLister> Orchestrator<L> {
    /// Create an idle run over a tag source
    pub fn new(lister: L) -> Self {
        Self {
            lister,
            jobs: 1,
            verbose: false,
            stage: Stage::Idle,
            packages: None,
            manifest: None,
        }
    }

    /// Number of repositories queried at once (1 = sequential)
    pub fn jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    /// Report per-tag decisions on stderr
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    #[cfg(test)]
    fn stage(&self) -> Stage {
        self.stage
    }

    /// The manifest, once loaded
    #[cfg(test)]
    fn manifest(&self) -> Option<&Manifest> {
        self.manifest.as_ref()
    }

    /// Idle → PackagesLoaded
    pub fn load_packages<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.expect_stage(Stage::Idle, "load packages")?;
        let packages = PackageList::load_from_path(path)?;
        self.set_packages(packages)
    }

    /// Idle → PackagesLoaded, from an already parsed list
    pub fn set_packages(&mut self, packages: PackageList) -> Result<()> {
        self.expect_stage(Stage::Idle, "load packages")?;
        self.packages = Some(packages);
        self.stage = Stage::PackagesLoaded;
        Ok(())
    }

    /// PackagesLoaded → ManifestLoaded
    pub fn load_manifest<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.expect_stage(Stage::PackagesLoaded, "load the manifest")?;
        let manifest = Manifest::load_from_path(path)?;
        self.set_manifest(manifest)
    }

    /// PackagesLoaded → ManifestLoaded, from an already parsed manifest
    pub fn set_manifest(&mut self, manifest: Manifest) -> Result<()> {
        self.expect_stage(Stage::PackagesLoaded, "load the manifest")?;
        self.manifest = Some(manifest);
        self.stage = Stage::ManifestLoaded;
        Ok(())
    }

    /// ManifestLoaded → Merged
    ///
    /// Scans every package first; the manifest is only modified once all of
    /// them produced at least one version.
    pub fn merge(&mut self) -> Result<MergeSummary> {
        self.expect_stage(Stage::ManifestLoaded, "merge")?;

        let (Some(packages), Some(manifest)) = (self.packages.as_ref(), self.manifest.as_mut())
        else {
            bail!("Run is missing its package list or manifest");
        };

        let releases = discover_all(
            &self.lister,
            packages.as_slice(),
            self.jobs,
            self.verbose,
        )?;

        let summary = ManifestMerger::new(packages.as_slice()).merge(manifest, &releases)?;
        self.stage = Stage::Merged;
        Ok(summary)
    }

    /// Merged → Written
    pub fn write(&mut self, target: &OutputTarget) -> Result<()> {
        self.expect_stage(Stage::Merged, "write the manifest")?;

        let Some(manifest) = self.manifest.as_ref() else {
            bail!("Run has no manifest to write");
        };

        match target {
            OutputTarget::Stdout => manifest.write_to_stdout()?,
            OutputTarget::File(path) => manifest.write_to_path(path)?,
        }

        self.stage = Stage::Written;
        Ok(())
    }

    /// Run every stage in order
    pub fn run(
        &mut self,
        packages_path: &Path,
        manifest_path: &Path,
        target: &OutputTarget,
    ) -> Result<MergeSummary> {
        self.load_packages(packages_path)?;
        self.load_manifest(manifest_path)?;
        let summary = self.merge()?;
        self.write(target)?;
        Ok(summary)
    }

    fn expect_stage(&self, expected: Stage, action: &str) -> Result<()> {
        if self.stage != expected {
            bail!("Cannot {} while the run is {}", action, self.stage);
        }
        Ok(())
    }
}

/// Discover the versions of every package, in package order
///
/// With more than one job the remote queries run on a thread pool; the
/// result order still follows the package list, and any failure fails the
/// whole scan.
fn discover_all<'p, L: TagLister>(
    lister: &L,
    packages: &'p [PackageSpec],
    jobs: usize,
    verbose: bool,
) -> Result<Vec<PackageReleases<'p>>> {
    let discovery = VersionDiscovery::new(lister).verbose(verbose);
    let pb = create_progress_bar(packages.len() as u64, "Scanning tags");

    let discover_one = |spec: &'p PackageSpec| -> Result<PackageReleases<'p>, SatisfyError> {
        let versions =
            discovery.discover_package(&spec.name, &spec.url, spec.tag_patterns.as_ref())?;
        print_verbose(
            verbose,
            &format!("{}: {} version(s) found at {}", spec.name, versions.len(), spec.url),
        );
        pb.inc(1);
        Ok(PackageReleases { spec, versions })
    };

    let result: Result<Vec<_>, SatisfyError> = if jobs > 1 {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to start {} workers: {}", jobs, e))?;
        pool.install(|| packages.par_iter().map(&discover_one).collect())
    } else {
        packages.iter().map(&discover_one).collect()
    };

    pb.finish_and_clear();
    Ok(result?)
}
