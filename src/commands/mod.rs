//! Implementation of munki-repo subcommands.
//!
//! `mod.rs` is a thin dispatcher; command logic lives in `repoclean` and
//! `makecatalogs`.

use crate::catalogs::CatalogOptions;
use crate::clean::{CleanConfig, Confirm};
use crate::cli::{Cli, Commands};
use crate::error::Result;
use crate::format::MetadataFormat;
use crate::logging::Logger;
use crate::repo::Repo;

pub(crate) mod makecatalogs;
pub(crate) mod repoclean;

pub use makecatalogs::makecatalogs;
pub use repoclean::{TerminalConfirm, repoclean};


/// Execute commands based on the parsed CLI arguments.
///
/// Connects to the repository named on the command line and asks for
/// confirmation on the terminal.
pub fn execute(cli: &Cli) -> Result<()> {
    let repo = cli.repo_location()?.open()?;
    execute_with(cli, &repo, &mut TerminalConfirm::stdio())
}

/// Execute commands against an already opened repository.
pub fn execute_with(cli: &Cli, repo: &dyn Repo, confirm: &mut dyn Confirm) -> Result<()> {
    let quiet = cli.global_opts().quiet();
    let verbose = if quiet {
        0
    } else {
        cli.global_opts().verbose()
    };
    let log = Logger::new(verbose, quiet);
    let jobs = cli.global_opts().jobs();

    match cli.command() {
        Commands::Repoclean {
            keep,
            show_all,
            auto,
            dry_run,
            ..
        } => {
            let config = CleanConfig::builder()
                .keep(*keep)
                .show_all(*show_all)
                .auto(*auto)
                .dry_run(*dry_run)
                .jobs(jobs)
                .build();
            repoclean(repo, config, &log, confirm)
        }
        Commands::Makecatalogs {
            force,
            skip_pkg_check,
            yaml,
            ..
        } => {
            let format = if *yaml {
                MetadataFormat::Yaml
            } else {
                MetadataFormat::Plist
            };
            let options = CatalogOptions::builder()
                .force(*force)
                .skip_pkg_check(*skip_pkg_check)
                .format(format)
                .jobs(jobs)
                .build();
            makecatalogs(repo, &options, &log)
        }
    }
}
