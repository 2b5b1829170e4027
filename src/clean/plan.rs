use std::collections::BTreeSet;

use super::pkgsinfo::PkginfoScan;
use crate::pkginfo::{PkginfoRecord, VariantSignature};
use crate::version::sort_newest_first;

/// Why a version survives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeepReason {
    /// Pinned by a manifest entry such as `Foo-1.0`
    Manifest,
    /// Pinned by another pkginfo's `requires`
    Requires,
    /// Inside the retention window
    Retention,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Keep(KeepReason),
    Delete,
}

impl Disposition {
    pub fn is_delete(self) -> bool {
        self == Disposition::Delete
    }
}

/// Decision for one version of a variant line.
#[derive(Debug, Clone)]
pub struct VersionPlan {
    pub version: String,
    pub disposition: Disposition,
    /// Pkginfo identifiers at this version (more than one is a duplicate)
    pub identifiers: Vec<String>,
}

/// Decisions for one variant line, newest version first.
#[derive(Debug, Clone)]
pub struct GroupPlan {
    pub signature: VariantSignature,
    /// Whether any manifest or dependency refers to the item name
    pub referenced: bool,
    pub versions: Vec<VersionPlan>,
}

impl GroupPlan {
    pub fn has_deletions(&self) -> bool {
        self.versions.iter().any(|v| v.disposition.is_delete())
    }
}

/// Space reclaimed by a plan.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CleanupStats {
    pub pkginfos_to_delete: usize,
    /// Bytes of pkginfo metadata
    pub metadata_bytes: u64,
    /// Installer blobs and orphans
    pub pkgs_to_delete: usize,
    /// Declared bytes of installer and uninstaller blobs (orphans count as 0)
    pub pkg_bytes: u64,
}

/// What a cleanup would delete and what it must preserve.
#[derive(Debug, Default)]
pub struct CleanupPlan {
    pub groups: Vec<GroupPlan>,
    /// Pkginfo records to delete
    pub to_delete: Vec<PkginfoRecord>,
    /// Blobs under `pkgs/` that no pkginfo refers to
    pub orphaned_installer_paths: Vec<String>,
    /// Orphans are listed but left in place
    pub orphans_held: bool,
    /// Blob paths referenced by a kept version
    pub pkgs_to_keep: BTreeSet<String>,
    /// Blob paths of deleted records that no kept record shares, each once
    pub pkgs_to_delete: Vec<String>,
    pub stats: CleanupStats,
    pub warnings: Vec<String>,
}

impl CleanupPlan {
    /// True when the plan deletes nothing.
    pub fn is_empty(&self) -> bool {
        self.to_delete.is_empty()
            && (self.orphans_held || self.orphaned_installer_paths.is_empty())
    }

    /// Keep orphans out of the deletion.
    ///
    /// Used when some pkginfo could not be loaded: an installer that looks
    /// unreferenced may belong to one of those records.
    pub fn hold_orphans(&mut self) {
        if self.orphans_held {
            return;
        }
        self.orphans_held = true;
        self.stats.pkgs_to_delete -= self.orphaned_installer_paths.len();
        if !self.orphaned_installer_paths.is_empty() {
            self.warnings.push(format!(
                "{} unreferenced pkgs were left in place because some pkginfo items could \
                 not be loaded",
                self.orphaned_installer_paths.len()
            ));
        }
    }

    /// Orphans that will actually be deleted.
    pub fn orphans_to_delete(&self) -> &[String] {
        if self.orphans_held {
            &[]
        } else {
            &self.orphaned_installer_paths
        }
    }

    /// Human-readable listing of the plan.
    ///
    /// Unless `show_all` is set only variant lines with deletions appear.
    pub fn render(&self, show_all: bool) -> String {
        let mut out = String::new();
        for group in self
            .groups
            .iter()
            .filter(|group| show_all || group.has_deletions())
        {
            out.push_str(&group.signature.to_string());
            if !group.referenced {
                out.push_str(" (not referenced by any manifest)");
            }
            out.push_str(":\n");
            for version in &group.versions {
                let label = match version.disposition {
                    Disposition::Keep(KeepReason::Manifest) => " (REQUIRED by a manifest)",
                    Disposition::Keep(KeepReason::Requires) => {
                        " (REQUIRED by another pkginfo item)"
                    }
                    Disposition::Keep(KeepReason::Retention) => "",
                    Disposition::Delete => " [to be DELETED]",
                };
                out.push_str(&format!("    {}{}\n", version.version, label));
            }
            out.push('\n');
        }

        if !self.orphaned_installer_paths.is_empty() {
            out.push_str("The following pkgs are not referenced by any pkginfo item");
            if self.orphans_held {
                out.push_str(" (kept, some pkginfo items could not be loaded)");
            }
            out.push_str(":\n");
            for path in &self.orphaned_installer_paths {
                out.push_str(&format!("    {path}\n"));
            }
            out.push('\n');
        }
        out
    }
}

/// Decide, for every variant line, which versions to keep.
///
/// Versions pinned by a manifest or by a `requires` entry are always kept and
/// do not use up the retention window; of the remaining versions the newest
/// `keep` survive. Blob paths of every kept record are protected, so an
/// installer shared with a deleted record stays in place. Paths are compared
/// without regard to case, as on the default macOS filesystem.
pub fn plan_cleanup(
    scan: &PkginfoScan,
    pinned_versions: &BTreeSet<(String, String)>,
    orphans: Vec<String>,
    keep: usize,
) -> CleanupPlan {
    let mut plan = CleanupPlan {
        orphaned_installer_paths: orphans,
        ..CleanupPlan::default()
    };

    for (signature, group) in &scan.index {
        if group.is_empty() {
            continue;
        }

        let mut versions: Vec<&String> = group.keys().collect();
        sort_newest_first(&mut versions);

        let mut group_plan = GroupPlan {
            signature: signature.clone(),
            referenced: scan.referenced_names.contains(&signature.name),
            versions: Vec::with_capacity(versions.len()),
        };
        let mut rank = 1;

        for version in versions {
            let records = &group[version];
            let key = (signature.name.clone(), version.clone());
            let disposition = if pinned_versions.contains(&key) {
                Disposition::Keep(KeepReason::Manifest)
            } else if scan.required_versions.contains(&key) {
                Disposition::Keep(KeepReason::Requires)
            } else if rank <= keep {
                rank += 1;
                Disposition::Keep(KeepReason::Retention)
            } else {
                Disposition::Delete
            };

            let identifiers: Vec<String> = records
                .iter()
                .map(|record| record.resource_identifier.clone())
                .collect();
            if identifiers.len() > 1 {
                plan.warnings.push(format!(
                    "{signature} version {version} has more than one pkginfo: {}",
                    identifiers.join(", ")
                ));
            }

            if disposition.is_delete() {
                plan.to_delete.extend(records.iter().cloned());
            } else {
                for record in records {
                    plan.pkgs_to_keep
                        .extend(record.item_locations().map(|loc| loc.path.clone()));
                }
            }

            group_plan.versions.push(VersionPlan {
                version: version.clone(),
                disposition,
                identifiers,
            });
        }

        plan.groups.push(group_plan);
    }

    let kept: BTreeSet<String> = plan.pkgs_to_keep.iter().map(|p| p.to_lowercase()).collect();
    let mut seen = BTreeSet::new();
    for record in &plan.to_delete {
        plan.stats.metadata_bytes += record.metadata_size;
        for location in record.item_locations() {
            let folded = location.path.to_lowercase();
            if kept.contains(&folded) || !seen.insert(folded) {
                continue;
            }
            plan.stats.pkg_bytes += location.size;
            plan.pkgs_to_delete.push(location.path.clone());
        }
    }
    plan.stats.pkginfos_to_delete = plan.to_delete.len();
    plan.stats.pkgs_to_delete = plan.pkgs_to_delete.len() + plan.orphaned_installer_paths.len();

    plan
}
