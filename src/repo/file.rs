use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use url::Url;
use walkdir::WalkDir;

use super::{Kind, Repo};
use crate::error::{MunkiError, Result};

/// A repository on a local filesystem or an already-mounted file share.
#[derive(Debug, Clone)]
pub struct FileRepo {
    root: PathBuf,
}

impl FileRepo {
    /// Open a repository from a `file://` URL or a plain path.
    ///
    /// Network share URLs (`smb://`, `afp://`, `nfs://`) and web repositories
    /// are rejected; mount the share and pass its local path instead.
    pub fn connect(url: &str) -> Result<Self> {
        let root = if url.contains("://") {
            let parsed = Url::parse(url).map_err(|err| MunkiError::RepoConnection {
                url: url.to_string(),
                reason: err.to_string(),
            })?;
            if parsed.scheme() != "file" {
                return Err(MunkiError::RepoConnection {
                    url: url.to_string(),
                    reason: format!("unsupported URL scheme '{}'", parsed.scheme()),
                });
            }
            parsed
                .to_file_path()
                .map_err(|_| MunkiError::RepoConnection {
                    url: url.to_string(),
                    reason: "URL does not name a local path".to_string(),
                })?
        } else {
            PathBuf::from(url)
        };

        Self::open(root).map_err(|err| match err {
            MunkiError::RepoConnection { reason, .. } => MunkiError::RepoConnection {
                url: url.to_string(),
                reason,
            },
            other => other,
        })
    }

    /// Open a repository rooted at `root`, which must be an existing directory.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(MunkiError::RepoConnection {
                url: root.display().to_string(),
                reason: format!("{} does not exist", root.display()),
            });
        }
        Ok(Self { root })
    }

    /// Root directory of the repository.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map an identifier to a path under the root, refusing anything that
    /// would escape it.
    fn resolve(&self, identifier: &str) -> Result<PathBuf> {
        let relative = Path::new(identifier);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if identifier.is_empty() || escapes {
            return Err(MunkiError::Access {
                identifier: identifier.to_string(),
                source: io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "resource identifier must be relative to the repository root",
                ),
            });
        }
        Ok(self.root.join(relative))
    }
}

fn io_error(identifier: &str, source: io::Error) -> MunkiError {
    if source.kind() == io::ErrorKind::NotFound {
        MunkiError::NotFound {
            identifier: identifier.to_string(),
        }
    } else {
        MunkiError::Access {
            identifier: identifier.to_string(),
            source,
        }
    }
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_string_lossy().starts_with('.')
}

impl Repo for FileRepo {
    fn itemlist(&self, kind: Kind) -> Result<Vec<String>> {
        let search_dir = self.root.join(kind.as_str());
        if !search_dir.exists() {
            return Ok(Vec::new());
        }

        let mut items = Vec::new();
        let walker = WalkDir::new(&search_dir)
            .follow_links(true)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
            // Dot-files and dot-directories are never repository content
            .filter_entry(|entry| !is_hidden(entry.file_name()));

        for entry in walker {
            let entry = entry.map_err(|err| MunkiError::Access {
                identifier: kind.to_string(),
                source: err.into(),
            })?;
            if !entry.file_type().is_file() {
                continue;
            }

            let relative = entry
                .path()
                .strip_prefix(&search_dir)
                .unwrap_or_else(|_| entry.path());
            let parts: Option<Vec<&str>> = relative
                .components()
                .map(|c| c.as_os_str().to_str())
                .collect();
            let Some(parts) = parts else {
                return Err(MunkiError::Access {
                    identifier: relative.display().to_string(),
                    source: io::Error::new(io::ErrorKind::InvalidData, "path is not valid UTF-8"),
                });
            };
            items.push(parts.join("/"));
        }

        items.sort();
        Ok(items)
    }

    fn get(&self, identifier: &str) -> Result<Vec<u8>> {
        let path = self.resolve(identifier)?;
        fs::read(&path).map_err(|source| io_error(identifier, source))
    }

    fn put(&self, identifier: &str, content: &[u8]) -> Result<()> {
        let path = self.resolve(identifier)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| MunkiError::Access {
                identifier: identifier.to_string(),
                source,
            })?;
        }
        fs::write(&path, content).map_err(|source| io_error(identifier, source))
    }

    fn delete(&self, identifier: &str) -> Result<()> {
        let path = self.resolve(identifier)?;
        fs::remove_file(&path).map_err(|source| io_error(identifier, source))
    }
}
