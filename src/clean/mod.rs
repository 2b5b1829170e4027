//! Repository cleanup (repoclean).
//!
//! Finds pkginfo records and installer items that can be removed without
//! breaking any manifest or dependency, presents the plan, and deletes it
//! once confirmed:
//!
//! 1. Manifests and pkgsinfo are read concurrently on a bounded worker pool
//! 2. Pkginfo records are grouped into variant lines and `requires` /
//!    `update_for` references are propagated
//! 3. Items in `pkgs/` that no pkginfo mentions are flagged as orphans
//! 4. Each variant line keeps its pinned versions plus the newest `keep`
//!    others
//! 5. After confirmation the plan is deleted and catalogs are rebuilt
//!
//! # Example
//!
//! ```no_run
//! use munki_repo::clean::{AutoConfirm, CleanConfig, RepoCleaner};
//! use munki_repo::logging::Logger;
//! use munki_repo::repo::FileRepo;
//!
//! let repo = FileRepo::open("/Volumes/munki_repo")?;
//! let config = CleanConfig::builder().keep(3).auto(true).build();
//!
//! let summary = RepoCleaner::new(&repo, config, Logger::default()).run(&mut AutoConfirm)?;
//! println!("Deleted {} pkginfo items", summary.deleted_pkginfos);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod cleaner;
mod config;
mod confirm;
mod orphans;
mod pkgsinfo;
mod plan;

pub use cleaner::{CleanSummary, Outcome, Phase, RepoCleaner};
pub use config::{CleanConfig, CleanConfigBuilder, DEFAULT_KEEP};
pub use confirm::{AutoConfirm, Confirm, ScriptedConfirm};
pub use orphans::find_orphans;
pub use pkgsinfo::{
    PkginfoScan, VariantGroup, VariantIndex, index_pkgsinfo, reference_incomplete_records,
    scan_pkgsinfo,
};
pub use plan::{
    CleanupPlan, CleanupStats, Disposition, GroupPlan, KeepReason, VersionPlan, plan_cleanup,
};
