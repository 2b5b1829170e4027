//! Repoclean command and the terminal confirmation prompt.

use std::io::{self, BufRead, StdinLock, Stdout, Write};

use crate::clean::{CleanConfig, CleanSummary, Confirm, Outcome, RepoCleaner};
use crate::error::{MunkiError, Result};
use crate::logging::Logger;
use crate::repo::Repo;
use crate::size::format_size;

/// Asks yes/no questions on a terminal.
pub struct TerminalConfirm<R, W> {
    input: R,
    output: W,
}

impl TerminalConfirm<StdinLock<'static>, Stdout> {
    /// Prompt on stdout and read answers from stdin.
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> TerminalConfirm<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl<R: BufRead, W: Write> Confirm for TerminalConfirm<R, W> {
    fn confirm(&mut self, question: &str) -> Result<bool> {
        let terminal_error = |source| MunkiError::Access {
            identifier: "terminal".to_string(),
            source,
        };

        write!(self.output, "{question} [y/N] ").map_err(terminal_error)?;
        self.output.flush().map_err(terminal_error)?;

        let mut answer = String::new();
        self.input.read_line(&mut answer).map_err(terminal_error)?;
        Ok(matches!(
            answer.trim().to_ascii_lowercase().as_str(),
            "y" | "yes"
        ))
    }
}

/// Run a cleanup and print its summary.
///
/// Succeeds when the run finished, including runs that found nothing to
/// delete or hit per-item errors; fails when a catalog could not be written
/// during the rebuild.
pub fn repoclean(
    repo: &dyn Repo,
    config: CleanConfig,
    log: &Logger,
    confirm: &mut dyn Confirm,
) -> Result<()> {
    let summary = RepoCleaner::new(repo, config, *log).run(confirm)?;

    print_summary(&summary, log);
    summary.report.print(log);
    if let Some(catalogs) = &summary.catalogs {
        catalogs.report.print(log);
    }

    let failures = summary.catalog_write_failures();
    if failures > 0 {
        return Err(MunkiError::CommandFailed {
            command: "repoclean",
            count: failures,
        });
    }
    Ok(())
}

fn print_summary(summary: &CleanSummary, log: &Logger) {
    match summary.outcome {
        Outcome::NothingToDelete | Outcome::Aborted => {}
        Outcome::DryRun => log.info("Dry run: nothing was deleted."),
        Outcome::Deleted => {
            log.info(format!(
                "Deleted {} pkginfo items and {} pkgs.",
                summary.deleted_pkginfos, summary.deleted_pkgs
            ));
            if summary.deleted_pkginfos == summary.planned.pkginfos_to_delete
                && summary.deleted_pkgs == summary.planned.pkgs_to_delete
            {
                log.info(format!(
                    "Reclaimed {} of pkginfo and {} of pkgs.",
                    format_size(summary.planned.metadata_bytes),
                    format_size(summary.planned.pkg_bytes)
                ));
            }
        }
    }
    if !summary.report.errors.is_empty() {
        log.info(format!(
            "{} errors were encountered.",
            summary.report.errors.len()
        ));
    }
}
