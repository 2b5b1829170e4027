use std::collections::{BTreeMap, BTreeSet};

use rayon::ThreadPool;

use crate::error::{MunkiError, Result};
use crate::pkginfo::{PkginfoRecord, VariantSignature, declared_item_paths, load_all};
use crate::repo::Repo;
use crate::report::Report;
use crate::version::split_name_and_version;

/// Records of one variant line, keyed by version.
pub type VariantGroup = BTreeMap<String, Vec<PkginfoRecord>>;

/// Every variant line in the repository.
pub type VariantIndex = BTreeMap<VariantSignature, VariantGroup>;

/// Result of indexing the pkgsinfo collection.
#[derive(Debug, Default)]
pub struct PkginfoScan {
    pub index: VariantIndex,
    /// Manifest references plus names pulled in by `requires` / `update_for`
    pub referenced_names: BTreeSet<String>,
    /// `(name, version)` pairs named with a version in some `requires`
    pub required_versions: BTreeSet<(String, String)>,
    /// Every installer and uninstaller location, relative to `pkgs/`
    pub referenced_pkgs: BTreeSet<String>,
    /// Records that parsed
    pub total: usize,
    pub report: Report,
}

impl PkginfoScan {
    /// Number of distinct variant lines.
    pub fn variant_lines(&self) -> usize {
        self.index.len()
    }
}

/// Index loaded pkginfo records and propagate dependency references.
///
/// Records are visited once, in the order given. A dependency's name is
/// added to `referenced_names` only if the depending record's name is
/// already referenced when that record is visited, so a chain is followed
/// exactly as far as the visiting order allows and no further.
pub fn index_pkgsinfo(
    loaded: Vec<(String, Result<PkginfoRecord>)>,
    referenced_names: BTreeSet<String>,
) -> PkginfoScan {
    let mut scan = PkginfoScan {
        referenced_names,
        ..PkginfoScan::default()
    };

    for (_identifier, record) in loaded {
        let Some(record) = scan.report.collect(record) else {
            continue;
        };
        scan.total += 1;

        for dependency in &record.requires {
            let (name, version) = split_name_and_version(dependency, true);
            if !version.is_empty() {
                scan.required_versions
                    .insert((name.to_string(), version.to_string()));
            }
            if scan.referenced_names.contains(&record.name) {
                scan.referenced_names.insert(name.to_string());
            }
        }

        for updated in &record.update_for {
            let (name, _) = split_name_and_version(updated, true);
            if scan.referenced_names.contains(name) {
                scan.referenced_names.insert(record.name.clone());
            }
        }

        for location in record.item_locations() {
            scan.referenced_pkgs.insert(location.path.clone());
        }

        scan.index
            .entry(record.signature())
            .or_default()
            .entry(record.version.clone())
            .or_default()
            .push(record);
    }

    scan
}

/// Add the item paths of records rejected for a missing `name` or
/// `version` to `referenced_pkgs`.
///
/// Such records stay in the repository, so their installers are not
/// orphans. A record that cannot be re-read is reported as a warning.
pub fn reference_incomplete_records(repo: &dyn Repo, scan: &mut PkginfoScan) {
    let rejected: Vec<String> = scan
        .report
        .errors
        .iter()
        .filter_map(|err| match err {
            MunkiError::MissingRequiredField { identifier, .. } => Some(identifier.clone()),
            _ => None,
        })
        .collect();

    for identifier in rejected {
        let paths = repo
            .get(&identifier)
            .and_then(|data| declared_item_paths(&identifier, &data));
        match paths {
            Ok(paths) => scan.referenced_pkgs.extend(paths),
            Err(err) => scan.report.warn(format!(
                "Could not read items of {identifier}: {}",
                err.chain_message()
            )),
        }
    }
}

/// Load every pkginfo from `repo` and index it.
pub fn scan_pkgsinfo(
    repo: &dyn Repo,
    pool: &ThreadPool,
    referenced_names: BTreeSet<String>,
) -> Result<PkginfoScan> {
    let mut scan = index_pkgsinfo(load_all(repo, pool)?, referenced_names);
    reference_incomplete_records(repo, &mut scan);
    Ok(scan)
}
