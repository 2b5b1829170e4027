use std::collections::{BTreeMap, HashSet};
use std::io;
use std::sync::{Mutex, MutexGuard};

use super::{Kind, Repo};
use crate::error::{MunkiError, Result};

/// A repository held entirely in memory.
///
/// Individual identifiers can be marked as failing, after which every
/// `get`, `put` or `delete` touching them returns an access error, or as
/// undeletable, which only affects `delete`. This makes partial-failure
/// behavior reproducible without a real network share.
#[derive(Debug, Default)]
pub struct MemoryRepo {
    items: Mutex<BTreeMap<String, Vec<u8>>>,
    failing: Mutex<HashSet<String>>,
    undeletable: Mutex<HashSet<String>>,
}

impl MemoryRepo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a resource.
    pub fn insert(&self, identifier: impl Into<String>, content: impl Into<Vec<u8>>) {
        lock(&self.items).insert(identifier.into(), content.into());
    }

    /// Make every access to `identifier` fail.
    pub fn fail_on(&self, identifier: impl Into<String>) {
        lock(&self.failing).insert(identifier.into());
    }

    /// Make deleting `identifier` fail while reads and writes still work.
    pub fn fail_delete_on(&self, identifier: impl Into<String>) {
        lock(&self.undeletable).insert(identifier.into());
    }

    pub fn contains(&self, identifier: &str) -> bool {
        lock(&self.items).contains_key(identifier)
    }

    /// All identifiers currently stored, sorted.
    pub fn identifiers(&self) -> Vec<String> {
        lock(&self.items).keys().cloned().collect()
    }

    fn check(&self, identifier: &str) -> Result<()> {
        check_in(&self.failing, identifier)
    }
}

fn check_in(set: &Mutex<HashSet<String>>, identifier: &str) -> Result<()> {
    if lock(set).contains(identifier) {
        return Err(MunkiError::Access {
            identifier: identifier.to_string(),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "injected failure"),
        });
    }
    Ok(())
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl Repo for MemoryRepo {
    fn itemlist(&self, kind: Kind) -> Result<Vec<String>> {
        let prefix = format!("{}/", kind.as_str());
        Ok(lock(&self.items)
            .keys()
            .filter_map(|key| key.strip_prefix(&prefix))
            .filter(|relative| !relative.split('/').any(|part| part.starts_with('.')))
            .map(str::to_string)
            .collect())
    }

    fn get(&self, identifier: &str) -> Result<Vec<u8>> {
        self.check(identifier)?;
        lock(&self.items)
            .get(identifier)
            .cloned()
            .ok_or_else(|| MunkiError::NotFound {
                identifier: identifier.to_string(),
            })
    }

    fn put(&self, identifier: &str, content: &[u8]) -> Result<()> {
        self.check(identifier)?;
        lock(&self.items).insert(identifier.to_string(), content.to_vec());
        Ok(())
    }

    fn delete(&self, identifier: &str) -> Result<()> {
        self.check(identifier)?;
        check_in(&self.undeletable, identifier)?;
        lock(&self.items)
            .remove(identifier)
            .map(|_| ())
            .ok_or_else(|| MunkiError::NotFound {
                identifier: identifier.to_string(),
            })
    }
}
