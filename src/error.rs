//! Error types for munki-repo.
//!
//! This module defines all error types used throughout munki-repo, using
//! a combination of `thiserror` for ergonomic error definitions and `miette`
//! for rich diagnostic output.
//!
//! # Error Handling Strategy
//!
//! - All errors are variants of [`MunkiError`]
//! - Fatal errors (an unreachable repository, an unreadable collection
//!   listing) propagate with `?` and end the command
//! - Per-item errors (a malformed manifest, a pkginfo missing its name, a
//!   failed deletion) are collected into a [`crate::report::Report`] and the
//!   walk continues
//!
//! # Example
//!
//! ```no_run
//! use munki_repo::error::{MunkiError, Result};
//!
//! fn require_name(identifier: &str, name: Option<&str>) -> Result<String> {
//!     name.map(str::to_string)
//!         .ok_or_else(|| MunkiError::MissingRequiredField {
//!             identifier: identifier.to_string(),
//!             field: "name",
//!         })
//! }
//! ```

use miette::Diagnostic;
use thiserror::Error;

/// Boxed underlying cause for errors that wrap foreign error types.
pub type BoxedSource = Box<dyn std::error::Error + Send + Sync>;

/// Error types that can occur in munki-repo operations
#[derive(Error, Debug, Diagnostic)]
pub enum MunkiError {
    /// The repository could not be reached.
    ///
    /// Raised when the repository root does not exist or the repository URL
    /// uses a scheme that this tool cannot open directly (network shares must
    /// be mounted first).
    #[error("Could not connect to repository '{url}': {reason}")]
    #[diagnostic(
        code(munki_repo::repo::connection),
        help("Pass a local path or a file:// URL to a mounted repository.")
    )]
    RepoConnection {
        /// The URL or path that was requested
        url: String,
        /// Why the connection failed
        reason: String,
    },

    /// A resource identifier does not exist in the repository.
    #[error("'{identifier}' does not exist in the repository")]
    #[diagnostic(code(munki_repo::repo::not_found))]
    NotFound {
        /// The missing resource identifier
        identifier: String,
    },

    /// I/O failure while reading, writing or listing repository content.
    #[error("I/O error accessing '{identifier}'")]
    #[diagnostic(code(munki_repo::repo::access))]
    Access {
        /// The resource identifier (or collection) being accessed
        identifier: String,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A manifest or pkginfo resource is not valid metadata.
    #[error("Could not parse '{identifier}'")]
    #[diagnostic(
        code(munki_repo::metadata::parse),
        help("Check the file with `plutil -lint` (plist) or a YAML linter.")
    )]
    Parse {
        /// The resource that failed to parse
        identifier: String,
        /// The underlying deserializer error
        #[source]
        source: BoxedSource,
    },

    /// A pkginfo record lacks `name` or `version`.
    #[error("'{identifier}' is missing {field}")]
    #[diagnostic(code(munki_repo::pkginfo::missing_field))]
    MissingRequiredField {
        /// The pkginfo resource identifier
        identifier: String,
        /// The missing key
        field: &'static str,
    },

    /// A pkginfo could not be loaded or refers to installer items that are
    /// not in the repository.
    #[error("Problem with pkginfo '{identifier}'")]
    #[diagnostic(code(munki_repo::catalogs::pkginfo_access))]
    PkginfoAccess {
        /// The pkginfo resource identifier
        identifier: String,
        /// What went wrong
        #[source]
        source: Box<MunkiError>,
    },

    /// A pkginfo names an installer or uninstaller item that does not exist.
    #[error("refers to missing {role} item: {location}")]
    #[diagnostic(code(munki_repo::catalogs::missing_item))]
    MissingItem {
        /// `installer` or `uninstaller`
        role: &'static str,
        /// The location relative to `pkgs/`
        location: String,
    },

    /// A pkginfo that needs an installer or uninstaller location has none.
    #[error("is missing {key}")]
    #[diagnostic(code(munki_repo::catalogs::missing_location))]
    MissingLocation {
        /// The absent pkginfo key
        key: &'static str,
    },

    /// Two catalog entries share name, version and installability constraints.
    #[error(
        "Catalog '{catalog}' contains duplicate item {name}-{version} from '{first}' and \
         '{second}'"
    )]
    #[diagnostic(
        code(munki_repo::catalogs::duplicate),
        help("Remove one of the pkginfo files or give them different catalogs.")
    )]
    DuplicateItem {
        /// The catalog with the duplicate
        catalog: String,
        /// Item name
        name: String,
        /// Item version
        version: String,
        /// The first pkginfo resource identifier
        first: String,
        /// The second pkginfo resource identifier
        second: String,
    },

    /// A catalog could not be written or a stale catalog could not be removed.
    #[error("Failed to write catalog '{name}'")]
    #[diagnostic(code(munki_repo::catalogs::write))]
    CatalogWrite {
        /// The catalog name
        name: String,
        /// The underlying cause
        #[source]
        source: Box<MunkiError>,
    },

    /// Deleting a repository resource failed.
    #[error("Failed to delete '{identifier}'")]
    #[diagnostic(code(munki_repo::clean::deletion))]
    Deletion {
        /// The resource identifier that could not be deleted
        identifier: String,
        /// The underlying cause
        #[source]
        source: Box<MunkiError>,
    },

    /// Metadata could not be serialized.
    #[error("Failed to serialize {what}")]
    #[diagnostic(code(munki_repo::metadata::serialization))]
    Serialization {
        /// What was being serialized
        what: String,
        /// The underlying serializer error
        #[source]
        source: BoxedSource,
    },

    /// The worker pool for parallel reads could not be created.
    #[error("Failed to start worker pool")]
    #[diagnostic(code(munki_repo::worker_pool))]
    WorkerPool(#[source] rayon::ThreadPoolBuildError),

    /// Invalid or missing configuration.
    #[error("Configuration error: {0}")]
    #[diagnostic(
        code(munki_repo::config::error),
        help("Check the required configuration parameters.")
    )]
    ConfigError(
        /// Description of the configuration error
        String,
    ),

    /// A command finished but collected errors that make it fail.
    #[error("{command} finished with {count} error(s)")]
    #[diagnostic(code(munki_repo::command_failed))]
    CommandFailed {
        /// The command name
        command: &'static str,
        /// Number of errors collected
        count: usize,
    },
}

impl MunkiError {
    /// Renders the error and its source chain on one line.
    pub fn chain_message(&self) -> String {
        let mut message = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        message
    }
}

/// Type alias for Results in this crate
pub type Result<T> = std::result::Result<T, MunkiError>;
