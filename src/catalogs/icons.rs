use std::collections::BTreeMap;

use rayon::ThreadPool;
use rayon::prelude::*;
use sha2::{Digest, Sha256};

use crate::error::Result;
use crate::report::Report;
use crate::repo::{Kind, Repo};

/// Name of the icon hash index inside `icons/`.
pub const ICON_HASHES: &str = "_icon_hashes.plist";

/// SHA-256 of every icon, keyed by path relative to `icons/`.
///
/// Icons that cannot be read are reported as warnings and left out.
pub(crate) fn hash_icons(
    repo: &dyn Repo,
    pool: &ThreadPool,
    report: &mut Report,
) -> Result<BTreeMap<String, String>> {
    let icons: Vec<String> = repo
        .itemlist(Kind::Icons)?
        .into_iter()
        .filter(|icon| icon != ICON_HASHES)
        .collect();

    let hashed: Vec<(String, Result<String>)> = pool.install(|| {
        icons
            .into_par_iter()
            .map(|icon| {
                let digest = repo
                    .get(&Kind::Icons.identifier(&icon))
                    .map(|data| hex::encode(Sha256::digest(&data)));
                (icon, digest)
            })
            .collect()
    });

    let mut hashes = BTreeMap::new();
    for (icon, digest) in hashed {
        match digest {
            Ok(digest) => {
                hashes.insert(icon, digest);
            }
            Err(err) => report.warn(format!(
                "Could not hash icon {icon}: {}",
                err.chain_message()
            )),
        }
    }
    Ok(hashes)
}
