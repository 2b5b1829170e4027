//! Manifests and the manifest scanner.
//!
//! Cleanup only needs to know which item names a manifest mentions and which
//! of those mentions pin a version. Conditional blocks are scanned regardless
//! of their predicate: an item that is installed only on some clients is
//! still in use.

use std::collections::BTreeSet;

use rayon::ThreadPool;
use rayon::prelude::*;
use serde::Deserialize;

use crate::error::Result;
use crate::format;
use crate::logging::Logger;
use crate::report::Report;
use crate::repo::{Kind, Repo};
use crate::version::split_name_and_version;

#[cfg(test)]
mod tests;

/// Typed view of a manifest.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Manifest {
    pub managed_installs: Vec<String>,
    pub managed_uninstalls: Vec<String>,
    pub managed_updates: Vec<String>,
    pub optional_installs: Vec<String>,
    /// Predicate of a conditional block; unset at the top level
    pub condition: Option<String>,
    pub conditional_items: Vec<Manifest>,
}

impl Manifest {
    /// Parse stored manifest bytes.
    pub fn parse(identifier: &str, data: &[u8]) -> Result<Self> {
        format::decode(identifier, data)
    }

    /// Every item reference in this manifest and its conditional blocks.
    pub fn references(&self) -> Vec<&str> {
        let mut found = Vec::new();
        self.collect_references(&mut found);
        found
    }

    fn collect_references<'a>(&'a self, found: &mut Vec<&'a str>) {
        for list in [
            &self.managed_installs,
            &self.managed_uninstalls,
            &self.managed_updates,
            &self.optional_installs,
        ] {
            found.extend(list.iter().map(String::as_str));
        }
        for nested in &self.conditional_items {
            nested.collect_references(found);
        }
    }
}

/// What the manifests reference.
#[derive(Debug, Default)]
pub struct ManifestScan {
    /// Every item name mentioned anywhere
    pub referenced_names: BTreeSet<String>,
    /// `(name, version)` pairs for references that spell out a version
    pub pinned_versions: BTreeSet<(String, String)>,
    /// Number of manifests that parsed
    pub manifest_count: usize,
    pub report: Report,
}

impl ManifestScan {
    fn add_reference(&mut self, reference: &str) {
        let (name, version) = split_name_and_version(reference, true);
        self.referenced_names.insert(name.to_string());
        if !version.is_empty() {
            self.pinned_versions
                .insert((name.to_string(), version.to_string()));
        }
    }
}

/// Read every manifest and gather the names and pins they reference.
///
/// Only a failure to list the collection is fatal; a manifest that cannot be
/// read or parsed is recorded in the scan's report and skipped.
pub fn scan_manifests(repo: &dyn Repo, pool: &ThreadPool, log: &Logger) -> Result<ManifestScan> {
    let identifiers = repo.list(Kind::Manifests)?;
    log.verbose(1, format!("Scanning {} manifests...", identifiers.len()));

    let loaded: Vec<(String, Result<Manifest>)> = pool.install(|| {
        identifiers
            .into_par_iter()
            .map(|identifier| {
                let manifest = repo
                    .get(&identifier)
                    .and_then(|data| Manifest::parse(&identifier, &data));
                (identifier, manifest)
            })
            .collect()
    });

    let mut scan = ManifestScan::default();
    for (identifier, manifest) in loaded {
        let Some(manifest) = scan.report.collect(manifest) else {
            continue;
        };
        log.verbose(2, format!("  {identifier}"));
        scan.manifest_count += 1;
        for reference in manifest.references() {
            scan.add_reference(reference);
        }
    }

    Ok(scan)
}
