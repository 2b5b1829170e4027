use std::collections::{HashMap, HashSet};

use crate::error::{MunkiError, Result};
use crate::pkginfo::{ItemLocation, PkginfoRecord};

/// Installer types that have no installer item.
const NO_PAYLOAD_TYPES: &[&str] = &["nopkg", "apple_update_metadata"];

/// Uninstall methods that need an uninstaller item.
const UNINSTALLER_REQUIRED: &[&str] = &["AdobeCCPUninstaller"];

/// Contents of `pkgs/`, for exact and case-insensitive lookups.
#[derive(Debug, Default)]
pub(crate) struct PkgIndex {
    exact: HashSet<String>,
    lowercase: HashMap<String, String>,
}

impl PkgIndex {
    pub(crate) fn new(paths: Vec<String>) -> Self {
        let mut lowercase = HashMap::with_capacity(paths.len());
        for path in &paths {
            lowercase
                .entry(path.to_lowercase())
                .or_insert_with(|| path.clone());
        }
        Self {
            exact: paths.into_iter().collect(),
            lowercase,
        }
    }

    /// Check one location. `Ok(Some(actual))` means it only matched with
    /// different case.
    fn lookup(&self, role: &'static str, location: &ItemLocation) -> Result<Option<&str>> {
        if self.exact.contains(&location.path) {
            return Ok(None);
        }
        match self.lowercase.get(&location.path.to_lowercase()) {
            Some(actual) => Ok(Some(actual.as_str())),
            None => Err(MunkiError::MissingItem {
                role,
                location: location.path.clone(),
            }),
        }
    }
}

/// Check that the items a pkginfo installs from exist under `pkgs/`.
///
/// Returns warnings for locations that only match with different case.
pub(crate) fn verify_items(record: &PkginfoRecord, pkgs: &PkgIndex) -> Result<Vec<String>> {
    let mut warnings = Vec::new();

    let no_payload = record
        .installer_type
        .as_deref()
        .is_some_and(|kind| NO_PAYLOAD_TYPES.contains(&kind));
    if no_payload || record.remote_package {
        return Ok(warnings);
    }

    let installer = record.installer.as_ref().ok_or(MunkiError::MissingLocation {
        key: "installer_item_location",
    })?;
    let mut checks = vec![("installer", installer)];

    let needs_uninstaller = record
        .uninstall_method
        .as_deref()
        .is_some_and(|method| UNINSTALLER_REQUIRED.contains(&method));
    match &record.uninstaller {
        Some(uninstaller) => checks.push(("uninstaller", uninstaller)),
        None if needs_uninstaller => {
            return Err(MunkiError::MissingLocation {
                key: "uninstaller_item_location",
            });
        }
        None => {}
    }

    for (role, location) in checks {
        if let Some(actual) = pkgs.lookup(role, location)? {
            warnings.push(format!(
                "{} refers to {role} item: {}. The pathname of the item in the repo has \
                 different case: {actual}. This may cause issues depending on the \
                 case-sensitivity of the underlying filesystem.",
                record.resource_identifier, location.path
            ));
        }
    }

    Ok(warnings)
}
