use std::collections::{BTreeSet, HashSet};

use crate::error::Result;
use crate::repo::{Kind, Repo};

/// Items under `pkgs/` that no pkginfo points at, relative to `pkgs/`.
///
/// A location that differs from the stored path only in case still counts as
/// a reference.
pub fn find_orphans(repo: &dyn Repo, referenced_pkgs: &BTreeSet<String>) -> Result<Vec<String>> {
    let referenced: HashSet<String> = referenced_pkgs.iter().map(|p| p.to_lowercase()).collect();
    Ok(repo
        .itemlist(Kind::Pkgs)?
        .into_iter()
        .filter(|path| !referenced.contains(&path.to_lowercase()))
        .collect())
}
