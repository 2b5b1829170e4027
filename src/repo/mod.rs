//! Repository storage.
//!
//! A Munki repository is a set of named collections (`pkgsinfo`, `manifests`,
//! `pkgs`, `catalogs`, `icons`) holding opaque resources. Everything else in
//! this crate talks to storage only through the [`Repo`] trait, so the same
//! scanners run against a directory on disk ([`FileRepo`]) or a repository
//! staged in memory ([`MemoryRepo`]).
//!
//! Resource identifiers are `/`-separated paths that start with the
//! collection name, e.g. `pkgsinfo/apps/Firefox-52.0.plist`.

use std::fmt;

use crate::error::Result;

mod file;
mod memory;

pub use file::FileRepo;
pub use memory::MemoryRepo;

/// A named collection inside a repository.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Kind {
    Pkgsinfo,
    Manifests,
    Pkgs,
    Catalogs,
    Icons,
}

impl Kind {
    /// Directory name of the collection.
    pub fn as_str(self) -> &'static str {
        match self {
            Kind::Pkgsinfo => "pkgsinfo",
            Kind::Manifests => "manifests",
            Kind::Pkgs => "pkgs",
            Kind::Catalogs => "catalogs",
            Kind::Icons => "icons",
        }
    }

    /// Build the full resource identifier for an item of this kind.
    pub fn identifier(self, relative: &str) -> String {
        format!("{}/{}", self.as_str(), relative)
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Byte-oriented access to a repository.
///
/// Implementations must be shareable between threads; the scanners read
/// resources from a worker pool. Mutation (`put`, `delete`) only happens
/// after planning has finished.
pub trait Repo: Send + Sync {
    /// Identifiers of every item of `kind`, relative to the collection and
    /// sorted. A collection that does not exist yields an empty list.
    fn itemlist(&self, kind: Kind) -> Result<Vec<String>>;

    /// Content of the resource.
    fn get(&self, identifier: &str) -> Result<Vec<u8>>;

    /// Store content, creating intermediate structure as needed.
    fn put(&self, identifier: &str, content: &[u8]) -> Result<()>;

    /// Remove the resource. Deleting something that does not exist is an
    /// error.
    fn delete(&self, identifier: &str) -> Result<()>;

    /// Like [`Repo::itemlist`] but with the collection name prepended.
    fn list(&self, kind: Kind) -> Result<Vec<String>> {
        Ok(self
            .itemlist(kind)?
            .iter()
            .map(|item| kind.identifier(item))
            .collect())
    }
}
