//! Pkginfo records.
//!
//! A pkginfo describes one version of one variant of an installable item.
//! [`PkginfoRecord::parse`] turns the stored bytes into a typed record and
//! rejects records without a `name` or `version`; the untouched document is
//! kept alongside so catalogs can be rebuilt from it verbatim.

use rayon::ThreadPool;
use rayon::prelude::*;
use serde::Deserialize;

use crate::error::{MunkiError, Result};
use crate::format;
use crate::repo::{Kind, Repo};
use crate::size::kib_to_bytes;

mod signature;

pub use signature::{Constraints, VariantSignature};

/// Value of `uninstall_method` for receipt-based removal.
pub const REMOVEPACKAGES: &str = "removepackages";

/// Location and size of an installer or uninstaller item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemLocation {
    /// Path relative to the `pkgs` collection
    pub path: String,
    /// Size in bytes, as declared by the pkginfo
    pub size: u64,
}

impl ItemLocation {
    /// Full resource identifier (`pkgs/<path>`).
    pub fn identifier(&self) -> String {
        Kind::Pkgs.identifier(&self.path)
    }
}

/// Typed view of a pkginfo.
#[derive(Debug, Clone)]
pub struct PkginfoRecord {
    /// Storage identifier of the metadata (`pkgsinfo/...`)
    pub resource_identifier: String,
    /// Size of the stored metadata in bytes
    pub metadata_size: u64,
    pub name: String,
    pub version: String,
    pub catalogs: Vec<String>,
    pub requires: Vec<String>,
    pub update_for: Vec<String>,
    pub uninstall_method: Option<String>,
    /// Package ids from `receipts`
    pub receipts: Vec<String>,
    pub installer: Option<ItemLocation>,
    pub uninstaller: Option<ItemLocation>,
    pub installer_type: Option<String>,
    /// True when the item is fetched from `PackageURL` / `PackageCompleteURL`
    pub remote_package: bool,
    pub constraints: Constraints,
    /// The full document as stored
    pub document: plist::Dictionary,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PkginfoFields {
    name: Option<String>,
    version: Option<String>,
    catalogs: Vec<String>,
    requires: Vec<String>,
    update_for: Vec<String>,
    uninstall_method: Option<String>,
    receipts: Vec<Receipt>,
    installer_item_location: Option<String>,
    installer_item_size: Option<u64>,
    uninstaller_item_location: Option<String>,
    uninstaller_item_size: Option<u64>,
    installer_type: Option<String>,
    #[serde(rename = "PackageURL")]
    package_url: Option<String>,
    #[serde(rename = "PackageCompleteURL")]
    package_complete_url: Option<String>,
    minimum_os_version: Option<String>,
    maximum_os_version: Option<String>,
    supported_architectures: Vec<String>,
    installable_condition: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Receipt {
    packageid: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ItemPaths {
    installer_item_location: Option<String>,
    uninstaller_item_location: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Installer and uninstaller paths declared by stored pkginfo bytes.
///
/// Unlike [`PkginfoRecord::parse`] this does not need `name` or `version`,
/// so items of a rejected record can still be protected from deletion.
pub fn declared_item_paths(identifier: &str, data: &[u8]) -> Result<Vec<String>> {
    let paths: ItemPaths = format::decode(identifier, data)?;
    Ok([paths.installer_item_location, paths.uninstaller_item_location]
        .into_iter()
        .filter_map(non_empty)
        .collect())
}

impl PkginfoRecord {
    /// Parse stored pkginfo bytes.
    ///
    /// Fails with [`MunkiError::Parse`] on malformed or wrongly typed
    /// metadata and with [`MunkiError::MissingRequiredField`] when `name` or
    /// `version` is absent or empty.
    pub fn parse(identifier: &str, data: &[u8]) -> Result<Self> {
        let fields: PkginfoFields = format::decode(identifier, data)?;
        let document: plist::Dictionary = format::decode(identifier, data)?;

        let name = non_empty(fields.name).ok_or_else(|| MunkiError::MissingRequiredField {
            identifier: identifier.to_string(),
            field: "name",
        })?;
        let version =
            non_empty(fields.version).ok_or_else(|| MunkiError::MissingRequiredField {
                identifier: identifier.to_string(),
                field: "version",
            })?;

        let installer = non_empty(fields.installer_item_location).map(|path| ItemLocation {
            path,
            size: kib_to_bytes(fields.installer_item_size.unwrap_or(0)),
        });
        let uninstaller = non_empty(fields.uninstaller_item_location).map(|path| ItemLocation {
            path,
            size: kib_to_bytes(fields.uninstaller_item_size.unwrap_or(0)),
        });

        Ok(Self {
            resource_identifier: identifier.to_string(),
            metadata_size: data.len() as u64,
            name,
            version,
            catalogs: fields.catalogs,
            requires: fields.requires,
            update_for: fields.update_for,
            uninstall_method: fields.uninstall_method,
            receipts: fields
                .receipts
                .into_iter()
                .filter_map(|receipt| receipt.packageid)
                .collect(),
            installer,
            uninstaller,
            installer_type: fields.installer_type,
            remote_package: fields.package_url.is_some() || fields.package_complete_url.is_some(),
            constraints: Constraints::new(
                fields.minimum_os_version,
                fields.maximum_os_version,
                fields.supported_architectures,
                fields.installable_condition,
            ),
            document,
        })
    }

    /// Grouping key for retention management.
    pub fn signature(&self) -> VariantSignature {
        VariantSignature::of(self)
    }

    /// Installer and uninstaller locations, whichever are present.
    pub fn item_locations(&self) -> impl Iterator<Item = &ItemLocation> {
        self.installer.iter().chain(self.uninstaller.iter())
    }

    pub fn uses_removepackages(&self) -> bool {
        self.uninstall_method.as_deref() == Some(REMOVEPACKAGES)
    }
}

/// Default number of parallel readers.
pub const DEFAULT_JOBS: usize = 8;

/// Build the bounded worker pool used for parallel reads.
pub(crate) fn worker_pool(jobs: usize) -> Result<ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(jobs.max(1))
        .thread_name(|idx| format!("munki-repo-io-{idx}"))
        .build()
        .map_err(MunkiError::WorkerPool)
}

/// Read and parse every pkginfo in the repository.
///
/// Listing failure is fatal. Reading or parsing an individual record is not:
/// each identifier comes back paired with its own result, in listing order.
/// A read failure is reported as [`MunkiError::PkginfoAccess`].
pub fn load_all(
    repo: &dyn Repo,
    pool: &ThreadPool,
) -> Result<Vec<(String, Result<PkginfoRecord>)>> {
    let identifiers = repo.list(Kind::Pkgsinfo)?;

    Ok(pool.install(|| {
        identifiers
            .into_par_iter()
            .map(|identifier| {
                let record = load_one(repo, &identifier);
                (identifier, record)
            })
            .collect()
    }))
}

fn load_one(repo: &dyn Repo, identifier: &str) -> Result<PkginfoRecord> {
    let data = repo.get(identifier).map_err(|err| MunkiError::PkginfoAccess {
        identifier: identifier.to_string(),
        source: Box::new(err),
    })?;
    PkginfoRecord::parse(identifier, &data)
}
