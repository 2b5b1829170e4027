//! Makecatalogs command.

use crate::catalogs::{CatalogOptions, make_catalogs};
use crate::error::{MunkiError, Result};
use crate::logging::Logger;
use crate::repo::Repo;

/// Rebuild every catalog and fail if any error was collected.
pub fn makecatalogs(repo: &dyn Repo, options: &CatalogOptions, log: &Logger) -> Result<()> {
    let outcome = make_catalogs(repo, options, log)?;

    outcome.report.print(log);
    for (catalog, entries) in &outcome.catalogs {
        log.verbose(1, format!("  {catalog}: {entries} items"));
    }

    if outcome.has_errors() {
        return Err(MunkiError::CommandFailed {
            command: "makecatalogs",
            count: outcome.report.errors.len(),
        });
    }
    Ok(())
}
