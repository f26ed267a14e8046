//! Build command implementation
//!
//! Scans every repository of the package list and merges the discovered
//! releases into the base satis repository definition.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use crate::cli::GlobalOptions;
use crate::error::hints;
use crate::exec::subprocess::command_exists;
use crate::orchestrator::{Orchestrator, OutputTarget};
use crate::registry::GitCli;
use crate::utils::terminal::{print_info, print_success, print_warning};

/// Merge tagged releases into a satis repository definition
#[derive(Args, Debug)]
pub struct BuildCommand {
    /// Package list (JSON object keyed by package name)
    #[arg(short, long, value_name = "FILE")]
    pub packages: PathBuf,

    /// Base satis repository definition
    #[arg(short, long, value_name = "FILE")]
    pub manifest: PathBuf,

    /// Write the result to this file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Number of repositories to query in parallel
    #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u16).range(1..))]
    pub jobs: u16,
}

impl BuildCommand {
    /// Execute the build command
    pub fn execute(self, options: &GlobalOptions) -> Result<()> {
        if !command_exists(&options.git) {
            print_warning(&format!(
                "'{}' was not found; every repository will report no tags",
                options.git
            ));
            if options.verbose {
                eprintln!("{}", hints::git());
            }
        }

        let target = OutputTarget::from_path(self.output);
        let mut run = Orchestrator::new(GitCli::new(options.git.as_str()))
            .jobs(usize::from(self.jobs))
            .verbose(options.verbose);

        if options.verbose {
            print_info(&format!(
                "Scanning packages from {} into {} (output: {})",
                self.packages.display(),
                self.manifest.display(),
                target
            ));
        }

        let summary = run.run(&self.packages, &self.manifest, &target)?;

        let message = format!(
            "{} package version(s) added, {} below minimum version, {} git repositor{} replaced",
            summary.added,
            summary.skipped,
            summary.removed,
            if summary.removed == 1 { "y" } else { "ies" }
        );
        match target {
            OutputTarget::File(ref path) => {
                print_success(&format!("{} ({})", message, path.display()))
            }
            OutputTarget::Stdout if options.verbose => print_info(&message),
            OutputTarget::Stdout => {}
        }

        Ok(())
    }
}
