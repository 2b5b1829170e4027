//! Catalog generation (makecatalogs).
//!
//! Catalogs are derived data: every run rebuilds them from the live pkgsinfo
//! collection. Each accepted pkginfo lands in the `all` catalog and in every
//! catalog named by its `catalogs` array. Before that, the installer and
//! uninstaller items it refers to are checked against `pkgs/`.
//!
//! Problems are collected rather than raised. A bad pkginfo is left out (or,
//! with `force`, included with a warning) and the remaining catalogs are still
//! written, so one run shows every problem in the repository.
//!
//! # Example
//!
//! ```no_run
//! use munki_repo::catalogs::{CatalogOptions, make_catalogs};
//! use munki_repo::logging::Logger;
//! use munki_repo::repo::FileRepo;
//!
//! let repo = FileRepo::open("/Volumes/munki_repo")?;
//! let options = CatalogOptions::builder().skip_pkg_check(true).build();
//!
//! let outcome = make_catalogs(&repo, &options, &Logger::default())?;
//! for (catalog, entries) in &outcome.catalogs {
//!     println!("{catalog}: {entries} items");
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};

use plist::Dictionary;

use crate::error::{MunkiError, Result};
use crate::format::{self, MetadataFormat};
use crate::logging::Logger;
use crate::pkginfo::{Constraints, DEFAULT_JOBS, PkginfoRecord, load_all, worker_pool};
use crate::report::Report;
use crate::repo::{Kind, Repo};

mod icons;
mod verify;
#[cfg(test)]
mod tests;

pub use icons::ICON_HASHES;
use icons::hash_icons;
use verify::{PkgIndex, verify_items};

/// The catalog that receives every accepted pkginfo.
pub const ALL_CATALOG: &str = "all";

/// Catalog contents keyed by catalog name.
type Catalogs = BTreeMap<String, Vec<Dictionary>>;

/// Identifies a catalog entry for duplicate detection.
type EntryKey = (String, String, String, Constraints);

/// Settings for one makecatalogs run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogOptions {
    /// Include pkginfo whose installer items are missing, with a warning
    force: bool,
    /// Do not look for installer items at all
    skip_pkg_check: bool,
    /// Serialization of the written catalogs
    format: MetadataFormat,
    /// Parallel readers
    jobs: usize,
}

impl CatalogOptions {
    /// Creates a new builder for [`CatalogOptions`]
    pub fn builder() -> CatalogOptionsBuilder {
        CatalogOptionsBuilder::default()
    }

    pub fn force(&self) -> bool {
        self.force
    }

    pub fn skip_pkg_check(&self) -> bool {
        self.skip_pkg_check
    }

    pub fn format(&self) -> MetadataFormat {
        self.format
    }

    pub fn jobs(&self) -> usize {
        self.jobs
    }
}

impl Default for CatalogOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Builder for [`CatalogOptions`]
#[derive(Debug, Default)]
pub struct CatalogOptionsBuilder {
    force: bool,
    skip_pkg_check: bool,
    format: MetadataFormat,
    jobs: Option<usize>,
}

impl CatalogOptionsBuilder {
    pub fn force(mut self, enabled: bool) -> Self {
        self.force = enabled;
        self
    }

    pub fn skip_pkg_check(mut self, enabled: bool) -> Self {
        self.skip_pkg_check = enabled;
        self
    }

    pub fn format(mut self, format: MetadataFormat) -> Self {
        self.format = format;
        self
    }

    pub fn jobs(mut self, jobs: usize) -> Self {
        self.jobs = Some(jobs);
        self
    }

    /// Build the [`CatalogOptions`]
    pub fn build(self) -> CatalogOptions {
        CatalogOptions {
            force: self.force,
            skip_pkg_check: self.skip_pkg_check,
            format: self.format,
            jobs: self.jobs.unwrap_or(DEFAULT_JOBS).max(1),
        }
    }
}

/// Outcome of a catalog build.
#[derive(Debug, Default)]
pub struct CatalogReport {
    pub report: Report,
    /// Entries written per catalog
    pub catalogs: BTreeMap<String, usize>,
    /// Catalogs removed because no pkginfo names them any more
    pub stale_removed: Vec<String>,
    pub icons_hashed: usize,
}

impl CatalogReport {
    pub fn has_errors(&self) -> bool {
        self.report.has_errors()
    }
}

/// Rebuilds `catalogs/` from `pkgsinfo/`.
pub struct CatalogBuilder<'a> {
    repo: &'a dyn Repo,
    options: CatalogOptions,
    log: Logger,
}

impl<'a> CatalogBuilder<'a> {
    pub fn new(repo: &'a dyn Repo, options: CatalogOptions, log: Logger) -> Self {
        Self { repo, options, log }
    }

    /// Hash icons, assemble and write every catalog, and remove stale ones.
    ///
    /// Only failing to list `pkgsinfo`, `pkgs` or `icons` aborts the build.
    pub fn build(&self) -> Result<CatalogReport> {
        let pool = worker_pool(self.options.jobs())?;
        let mut outcome = CatalogReport::default();

        self.log.verbose(1, "Getting list of icons...");
        let icons = hash_icons(self.repo, &pool, &mut outcome.report)?;

        let pkgs = if self.options.skip_pkg_check() {
            PkgIndex::default()
        } else {
            self.log.verbose(1, "Getting list of pkgs...");
            PkgIndex::new(self.repo.itemlist(Kind::Pkgs)?)
        };

        self.log.verbose(1, "Getting list of pkgsinfo...");
        let loaded = load_all(self.repo, &pool)?;

        let catalogs = self.assemble(loaded, &pkgs, &mut outcome.report);
        warn_case_collisions(&catalogs, &mut outcome.report);
        self.remove_stale(&catalogs, &mut outcome);
        self.write_catalogs(&catalogs, &mut outcome);

        if !icons.is_empty() {
            let identifier = Kind::Icons.identifier(ICON_HASHES);
            let written = format::encode("icon hashes", &icons, MetadataFormat::Plist)
                .and_then(|data| self.repo.put(&identifier, &data));
            match written {
                Ok(()) => self.log.info(format!("Created {identifier}...")),
                Err(err) => outcome.report.error(err),
            }
        }
        outcome.icons_hashed = icons.len();

        Ok(outcome)
    }

    fn assemble(
        &self,
        loaded: Vec<(String, Result<PkginfoRecord>)>,
        pkgs: &PkgIndex,
        report: &mut Report,
    ) -> Catalogs {
        let mut catalogs = Catalogs::new();
        catalogs.insert(ALL_CATALOG.to_string(), Vec::new());
        let mut seen: HashMap<EntryKey, String> = HashMap::new();

        for (identifier, record) in loaded {
            let Some(record) = report.collect(record) else {
                continue;
            };

            if !self.options.skip_pkg_check() {
                match verify_items(&record, pkgs) {
                    Ok(warnings) => warnings.into_iter().for_each(|w| report.warn(w)),
                    Err(err) => {
                        let err = MunkiError::PkginfoAccess {
                            identifier: identifier.clone(),
                            source: Box::new(err),
                        };
                        if !self.options.force() {
                            report.error(err);
                            continue;
                        }
                        report.warn(err.chain_message());
                    }
                }
            }

            let entry = catalog_entry(&record.document);
            catalogs
                .entry(ALL_CATALOG.to_string())
                .or_default()
                .push(entry.clone());

            for catalog in &record.catalogs {
                if catalog.is_empty() {
                    report.warn(format!("{identifier} has an empty catalog name"));
                    continue;
                }
                let key = (
                    catalog.clone(),
                    record.name.clone(),
                    record.version.clone(),
                    record.constraints.clone(),
                );
                match seen.entry(key) {
                    Entry::Occupied(first) if first.get() == &identifier => continue,
                    Entry::Occupied(first) => {
                        report.error(MunkiError::DuplicateItem {
                            catalog: catalog.clone(),
                            name: record.name.clone(),
                            version: record.version.clone(),
                            first: first.get().clone(),
                            second: identifier.clone(),
                        });
                        continue;
                    }
                    Entry::Vacant(slot) => {
                        slot.insert(identifier.clone());
                    }
                }
                self.log
                    .verbose(1, format!("Adding {identifier} to {catalog}..."));
                catalogs
                    .entry(catalog.clone())
                    .or_default()
                    .push(entry.clone());
            }
        }

        catalogs
    }

    fn remove_stale(&self, catalogs: &Catalogs, outcome: &mut CatalogReport) {
        let existing = match self.repo.itemlist(Kind::Catalogs) {
            Ok(existing) => existing,
            Err(err) => {
                outcome.report.warn(format!(
                    "Could not list existing catalogs: {}",
                    err.chain_message()
                ));
                return;
            }
        };

        for name in existing {
            if catalogs.contains_key(&name) {
                continue;
            }
            match self.repo.delete(&Kind::Catalogs.identifier(&name)) {
                Ok(()) => {
                    self.log.info(format!("Removed stale catalog {name}"));
                    outcome.stale_removed.push(name);
                }
                Err(err) => outcome.report.error(MunkiError::CatalogWrite {
                    name,
                    source: Box::new(err),
                }),
            }
        }
    }

    fn write_catalogs(&self, catalogs: &Catalogs, outcome: &mut CatalogReport) {
        for (name, entries) in catalogs {
            let identifier = Kind::Catalogs.identifier(name);
            let written = format::encode(&format!("catalog {name}"), entries, self.options.format())
                .and_then(|data| self.repo.put(&identifier, &data));
            match written {
                Ok(()) => {
                    self.log.info(format!("Created {identifier}..."));
                    outcome.catalogs.insert(name.clone(), entries.len());
                }
                Err(err) => outcome.report.error(MunkiError::CatalogWrite {
                    name: name.clone(),
                    source: Box::new(err),
                }),
            }
        }
    }
}

/// Build every catalog in `repo`.
pub fn make_catalogs(
    repo: &dyn Repo,
    options: &CatalogOptions,
    log: &Logger,
) -> Result<CatalogReport> {
    CatalogBuilder::new(repo, options.clone(), *log).build()
}

/// The pkginfo as published: admin `notes` and `_`-prefixed keys removed.
fn catalog_entry(document: &Dictionary) -> Dictionary {
    document
        .iter()
        .filter(|(key, _)| key.as_str() != "notes" && !key.starts_with('_'))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

fn warn_case_collisions(catalogs: &Catalogs, report: &mut Report) {
    let mut by_lowercase: BTreeMap<String, Vec<&str>> = BTreeMap::new();
    for name in catalogs.keys() {
        by_lowercase
            .entry(name.to_lowercase())
            .or_default()
            .push(name);
    }

    let colliding: Vec<&str> = by_lowercase
        .into_values()
        .filter(|names| names.len() > 1)
        .flatten()
        .collect();
    if !colliding.is_empty() {
        report.warn(format!(
            "There are catalogs with names that differ only by case. This may cause issues \
             depending on the case-sensitivity of the underlying filesystem: {}",
            colliding.join(", ")
        ));
    }
}
