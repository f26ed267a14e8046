//! Satisfy - populate a Composer satis repository from git tags
//!
//! Reads a list of upstream git repositories, turns their release tags into
//! semantic versions and merges one inline package per version into a base
//! satis repository definition.
//!
//! ## Architecture
//!
//! ```text
//! package list → registry (ls-remote, normalize, order) → manifest merger → satis.json
//! ```

mod cli;
mod commands;
mod config;
mod error;
mod exec;
mod manifest;
mod orchestrator;
mod registry;
mod utils;
mod version;

use std::process::ExitCode;

use clap::Parser;

use cli::Cli;
use error::SatisfyError;

fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.execute() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match err.downcast_ref::<SatisfyError>() {
                Some(satisfy_err) => satisfy_err.display_with_hints(),
                None => utils::terminal::print_error(&format!("{:#}", err)),
            }
            ExitCode::FAILURE
        }
    }
}
