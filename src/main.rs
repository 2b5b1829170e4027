//! # munki-repo CLI
//!
//! The command-line interface for munki-repo, which keeps a Munki
//! repository's pkginfo, manifests and catalogs consistent.
//!
//! ## Installation
//!
//! ```bash
//! cargo install munki-repo
//! ```
//!
//! ## Commands
//!
//! - **repoclean**: Removes older, unused pkginfo and installer items
//! - **makecatalogs**: Rebuilds the catalogs from the pkginfo files
//!
//! ## Quick Start
//!
//! ```bash
//! # See what would be removed, keeping the three newest versions
//! munki-repo repoclean --keep 3 --dry-run /Volumes/munki_repo
//!
//! # Rebuild catalogs after importing new items
//! munki-repo makecatalogs /Volumes/munki_repo
//! ```
//!
//! ## Environment Variables
//!
//! - `MUNKI_REPO_URL`: Repository URL, used instead of a repository path
//! - `MUNKI_REPO_JOBS`: Number of parallel readers
//! - `MUNKI_REPO_VERBOSE`: Enable verbose output
//! - `MUNKI_REPO_QUIET`: Silence all output except errors
//! - `REPOCLEAN_KEEP`: Default for `repoclean --keep`

use std::io::IsTerminal;

use munki_repo::cli::Cli;

fn main() -> miette::Result<()> {
    miette::set_panic_hook();

    // Plain output when stderr is not a terminal (CI, cron, logs)
    if std::io::stderr().is_terminal() {
        miette::set_hook(Box::new(|_| {
            Box::new(
                miette::GraphicalReportHandler::new()
                    .with_theme(miette::GraphicalTheme::unicode_nocolor())
                    .with_context_lines(3),
            )
        }))?;
    } else {
        miette::set_hook(Box::new(|_| {
            Box::new(
                miette::GraphicalReportHandler::new()
                    .with_theme(miette::GraphicalTheme::none())
                    .with_context_lines(0),
            )
        }))?;
    }

    let cli = Cli::parse_args();

    munki_repo::commands::execute(&cli).map_err(Into::into)
}
