use std::collections::BTreeSet;

use super::config::CleanConfig;
use super::confirm::Confirm;
use super::orphans::find_orphans;
use super::pkgsinfo::{index_pkgsinfo, reference_incomplete_records};
use super::plan::{CleanupPlan, CleanupStats, plan_cleanup};
use crate::catalogs::{CatalogOptions, CatalogReport, make_catalogs};
use crate::error::{MunkiError, Result};
use crate::logging::Logger;
use crate::manifest::scan_manifests;
use crate::pkginfo::{load_all, worker_pool};
use crate::report::Report;
use crate::repo::{Kind, Repo};
use crate::size::format_size;

/// Stages of a cleanup run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    ManifestsScanned,
    PkginfoScanned,
    PlanReady,
    Confirmed,
    Aborted,
    Deleted,
    CatalogsRebuilt,
    Done,
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    NothingToDelete,
    DryRun,
    Aborted,
    Deleted,
}

/// Final account of a cleanup run.
#[derive(Debug)]
pub struct CleanSummary {
    pub outcome: Outcome,
    pub manifest_count: usize,
    /// Pkginfo records that parsed
    pub pkginfo_total: usize,
    pub variant_lines: usize,
    /// What the plan would reclaim
    pub planned: CleanupStats,
    pub deleted_pkginfos: usize,
    pub deleted_pkgs: usize,
    /// Scan, plan and deletion problems
    pub report: Report,
    /// Present when catalogs were rebuilt
    pub catalogs: Option<CatalogReport>,
}

impl CleanSummary {
    /// Catalogs that could not be written during the rebuild.
    pub fn catalog_write_failures(&self) -> usize {
        self.catalogs.as_ref().map_or(0, |catalogs| {
            catalogs
                .report
                .errors
                .iter()
                .filter(|err| matches!(err, MunkiError::CatalogWrite { .. }))
                .count()
        })
    }
}

/// Sequences scanning, planning, confirmation, deletion and the catalog
/// rebuild against one repository.
pub struct RepoCleaner<'a> {
    repo: &'a dyn Repo,
    config: CleanConfig,
    log: Logger,
    phase: Phase,
    history: Vec<Phase>,
}

impl<'a> RepoCleaner<'a> {
    pub fn new(repo: &'a dyn Repo, config: CleanConfig, log: Logger) -> Self {
        Self {
            repo,
            config,
            log,
            phase: Phase::Idle,
            history: vec![Phase::Idle],
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Every phase entered so far, in order.
    pub fn history(&self) -> &[Phase] {
        &self.history
    }

    fn enter(&mut self, phase: Phase) {
        self.log.verbose(2, format!("[repoclean] {phase:?}"));
        self.phase = phase;
        self.history.push(phase);
    }

    /// Run the whole cleanup, asking `confirm` before anything is deleted
    /// unless the configuration says `auto`.
    pub fn run(&mut self, confirm: &mut dyn Confirm) -> Result<CleanSummary> {
        let (plan, mut summary) = self.analyze()?;

        self.log.info(plan.render(self.config.show_all()));
        for warning in &plan.warnings {
            summary.report.warn(warning.clone());
        }
        self.present_totals(&summary);

        if plan.is_empty() {
            self.log.info("Nothing to delete.");
            summary.outcome = Outcome::NothingToDelete;
            self.enter(Phase::Done);
            return Ok(summary);
        }
        if self.config.dry_run() {
            summary.outcome = Outcome::DryRun;
            self.enter(Phase::Done);
            return Ok(summary);
        }

        if !self.confirmed(confirm)? {
            self.log.info("Exiting without deleting anything.");
            summary.outcome = Outcome::Aborted;
            self.enter(Phase::Aborted);
            self.enter(Phase::Done);
            return Ok(summary);
        }
        self.enter(Phase::Confirmed);

        self.delete(&plan, &mut summary);
        summary.outcome = Outcome::Deleted;
        self.enter(Phase::Deleted);

        self.log.info("Rebuilding catalogs...");
        let options = CatalogOptions::builder().jobs(self.config.jobs()).build();
        summary.catalogs = Some(make_catalogs(self.repo, &options, &self.log)?);
        self.enter(Phase::CatalogsRebuilt);

        self.enter(Phase::Done);
        Ok(summary)
    }

    /// Scan the repository and build the cleanup plan without changing it.
    pub fn analyze(&mut self) -> Result<(CleanupPlan, CleanSummary)> {
        let pool = worker_pool(self.config.jobs())?;
        let repo = self.repo;
        let log = self.log;

        self.log.info("Analyzing manifest files...");
        let (manifests, loaded) = pool.join(
            || scan_manifests(repo, &pool, &log),
            || load_all(repo, &pool),
        );
        let manifests = manifests?;
        self.enter(Phase::ManifestsScanned);

        self.log.info("Analyzing pkginfo files...");
        let mut scan = index_pkgsinfo(loaded?, manifests.referenced_names.clone());
        reference_incomplete_records(self.repo, &mut scan);
        self.enter(Phase::PkginfoScanned);

        let orphans = find_orphans(self.repo, &scan.referenced_pkgs)?;
        let mut plan = plan_cleanup(
            &scan,
            &manifests.pinned_versions,
            orphans,
            self.config.keep(),
        );
        if scan.report.has_errors() {
            plan.hold_orphans();
        }
        self.enter(Phase::PlanReady);

        let mut report = manifests.report;
        report.extend(scan.report);
        let summary = CleanSummary {
            outcome: Outcome::NothingToDelete,
            manifest_count: manifests.manifest_count,
            pkginfo_total: scan.total,
            variant_lines: scan.index.len(),
            planned: plan.stats.clone(),
            deleted_pkginfos: 0,
            deleted_pkgs: 0,
            report,
            catalogs: None,
        };
        Ok((plan, summary))
    }

    fn present_totals(&self, summary: &CleanSummary) {
        let stats = &summary.planned;
        self.log.info(format!(
            "Total pkginfo items:     {}",
            summary.pkginfo_total
        ));
        self.log
            .info(format!("Item variants:           {}", summary.variant_lines));
        self.log
            .info(format!("pkginfo items to delete: {}", stats.pkginfos_to_delete));
        self.log
            .info(format!("pkgs to delete:          {}", stats.pkgs_to_delete));
        self.log.info(format!(
            "pkginfo space savings:   {}",
            format_size(stats.metadata_bytes)
        ));
        self.log.info(format!(
            "pkg space savings:       {}",
            format_size(stats.pkg_bytes)
        ));
        if !summary.report.errors.is_empty() {
            self.log.info(format!(
                "{} errors were encountered while scanning; see the list below.",
                summary.report.errors.len()
            ));
        }
    }

    fn confirmed(&self, confirm: &mut dyn Confirm) -> Result<bool> {
        if self.config.auto() {
            return Ok(true);
        }
        Ok(confirm.confirm(
            "Delete pkginfo and pkg items marked as [to be DELETED]? WARNING: This action cannot \
             be undone.",
        )? && confirm.confirm("Are you sure? This action cannot be undone.")?)
    }

    /// Delete pkginfo records first, then the blobs only they used, then
    /// orphans. A failed deletion is recorded and the batch continues; a blob
    /// whose pkginfo could not be removed is left in place.
    fn delete(&self, plan: &CleanupPlan, summary: &mut CleanSummary) {
        let mut still_referenced = BTreeSet::new();
        for record in &plan.to_delete {
            self.log
                .verbose(1, format!("Deleting {}", record.resource_identifier));
            match self.repo.delete(&record.resource_identifier) {
                Ok(()) => summary.deleted_pkginfos += 1,
                Err(err) => {
                    still_referenced
                        .extend(record.item_locations().map(|loc| loc.path.to_lowercase()));
                    summary.report.error(MunkiError::Deletion {
                        identifier: record.resource_identifier.clone(),
                        source: Box::new(err),
                    });
                }
            }
        }

        let blobs = plan
            .pkgs_to_delete
            .iter()
            .filter(|path| !still_referenced.contains(&path.to_lowercase()))
            .chain(plan.orphans_to_delete());
        for path in blobs {
            let identifier = Kind::Pkgs.identifier(path);
            self.log.verbose(1, format!("Deleting {identifier}"));
            match self.repo.delete(&identifier) {
                Ok(()) => summary.deleted_pkgs += 1,
                Err(err) => summary.report.error(MunkiError::Deletion {
                    identifier,
                    source: Box::new(err),
                }),
            }
        }
    }
}
