//! CLI argument parsing using clap derive macros

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::commands::{build::BuildCommand, tags::TagsCommand};

/// Satisfy - populate a satis repository from git tags
///
/// Scans the tags of upstream git repositories and publishes every release
/// as a version-pinned package in a Composer satis repository definition.
#[derive(Parser, Debug)]
#[command(name = "satisfy")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Git executable used to list remote tags
    #[arg(long, global = true, env = "SATISFY_GIT", default_value = "git")]
    pub git: String,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Merge tagged releases into a satis repository definition
    Build(BuildCommand),

    /// Preview the versions discovered in one repository
    Tags(TagsCommand),
}

/// Options shared by every command
#[derive(Debug, Clone)]
pub struct GlobalOptions {
    pub verbose: bool,
    pub git: String,
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        // Set up terminal colors
        if self.no_color {
            console::set_colors_enabled(false);
            console::set_colors_enabled_stderr(false);
        }

        let options = GlobalOptions {
            verbose: self.verbose,
            git: self.git,
        };

        match self.command {
            Commands::Build(cmd) => cmd.execute(&options),
            Commands::Tags(cmd) => cmd.execute(&options),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_build_command() {
        let cli = Cli::try_parse_from([
            "satisfy",
            "--git",
            "/usr/local/bin/git",
            "build",
            "--packages",
            "packages.json",
            "--manifest",
            "satis.json",
            "--jobs",
            "4",
        ])
        .unwrap();

        assert_eq!(cli.git, "/usr/local/bin/git");
        match cli.command {
            Commands::Build(cmd) => {
                assert_eq!(cmd.packages.to_str(), Some("packages.json"));
                assert_eq!(cmd.manifest.to_str(), Some("satis.json"));
                assert!(cmd.output.is_none());
                assert_eq!(cmd.jobs, 4);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_tags_command() {
        let cli = Cli::try_parse_from([
            "satisfy",
            "tags",
            "git://x",
            "--tag-regexp",
            "^a-(?P<major>\\d+)$",
            "--tag-regexp",
            "^b-(?P<major>\\d+)$",
            "--min-version",
            "1.0",
        ])
        .unwrap();

        match cli.command {
            Commands::Tags(cmd) => {
                assert_eq!(cmd.url, "git://x");
                assert_eq!(cmd.tag_regexp.len(), 2);
                assert_eq!(cmd.min_version.as_deref(), Some("1.0"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_build_requires_inputs() {
        assert!(Cli::try_parse_from(["satisfy", "build", "--packages", "p.json"]).is_err());
        assert!(Cli::try_parse_from(["satisfy", "build", "--manifest", "s.json"]).is_err());
    }
}
