//! Tags command implementation
//!
//! Shows which versions a repository would publish, without touching any
//! manifest. Useful while writing `tag-regexp` patterns.

use anyhow::{Context, Result};
use clap::Args;
use console::style;

use crate::cli::GlobalOptions;
use crate::registry::{GitCli, TagPatterns, VersionDiscovery};
use crate::version::{is_below_minimum, parse_min_version};

/// Preview the versions discovered in one repository
#[derive(Args, Debug)]
pub struct TagsCommand {
    /// Git repository URL
    pub url: String,

    /// Tag pattern with named groups (repeatable, first match wins)
    #[arg(short = 'r', long, value_name = "PATTERN")]
    pub tag_regexp: Vec<String>,

    /// Mark versions below this one as skipped
    #[arg(long, value_name = "VERSION")]
    pub min_version: Option<String>,
}

impl TagsCommand {
    /// Execute the tags command
    pub fn execute(self, options: &GlobalOptions) -> Result<()> {
        let patterns = if self.tag_regexp.is_empty() {
            None
        } else {
            Some(TagPatterns::compile(&self.tag_regexp)?)
        };

        let min_version = self
            .min_version
            .as_deref()
            .map(parse_min_version)
            .transpose()
            .context("Invalid --min-version")?;

        let lister = GitCli::new(options.git.as_str());
        let discovered = VersionDiscovery::new(&lister)
            .verbose(options.verbose)
            .discover_package(&self.url, &self.url, patterns.as_ref())?;

        let width = discovered
            .iter()
            .map(|(version, _)| version.to_string().len())
            .max()
            .unwrap_or(0);

        for (version, tag) in discovered.iter() {
            let below = min_version
                .as_ref()
                .map_or(false, |min| is_below_minimum(version, min));

            let line = format!("{:<width$}  {}", version.to_string(), tag, width = width);
            if below {
                println!("{}  {}", style(line).dim(), style("(below minimum)").yellow());
            } else {
                println!("{}", line);
            }
        }

        Ok(())
    }
}
