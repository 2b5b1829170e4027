//! # munki-repo
//!
//! Maintenance tools for a Munki software repository: keeps pkginfo records,
//! manifests and catalogs consistent, and reclaims storage by removing
//! superseded package versions that nothing depends on.
//!
//! ## Overview
//!
//! A Munki repository holds `pkginfo` metadata records, the installer items
//! they describe under `pkgs/`, the `manifests` that assign software to
//! machines, and the derived `catalogs` clients resolve against. Over time
//! old versions pile up. munki-repo works out which of them are still
//! needed (named by a manifest, required by another item, or among the newest
//! few of their line) and deletes the rest, then rebuilds the catalogs.
//!
//! ## Key Features
//!
//! - **Safe cleanup**: Versions pinned by a manifest or by another item's
//!   `requires` are never deleted, and shared installer items survive while
//!   any kept record uses them
//! - **Variant-aware**: Items are grouped by name, catalogs and install
//!   constraints, so Intel and Apple silicon builds are retained separately
//! - **Catalog validation**: Missing installer items and duplicate entries
//!   are reported with the offending files named
//! - **Parallel scanning**: Manifests and pkginfo are read on a bounded
//!   rayon pool
//! - **Plist and YAML**: Metadata in either format is understood
//!
//! ## Architecture
//!
//! - [`cli`]: Command-line interface definitions using clap
//! - [`commands`]: Implementation of the munki-repo subcommands
//! - [`clean`]: Cleanup planning and execution
//! - [`catalogs`]: Catalog rebuilding and pkginfo validation
//! - [`manifest`]: Manifest parsing and reference scanning
//! - [`pkginfo`]: Pkginfo records and variant signatures
//! - [`repo`]: Storage abstraction with file and in-memory backends
//! - [`version`]: Name/version splitting and version ordering
//! - [`error`]: Error types and handling with thiserror + miette
//!
//! ## Library Usage
//!
//! ```no_run
//! use munki_repo::cli::{Cli, Commands};
//! use munki_repo::commands;
//!
//! let cli = Cli::builder()
//!     .repo_url("file:///Volumes/munki_repo")
//!     .verbose(1)
//!     .command(Commands::Makecatalogs {
//!         force: false,
//!         skip_pkg_check: false,
//!         yaml: false,
//!         repo_path: None,
//!     })
//!     .build()?;
//!
//! commands::execute(&cli)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Error Handling
//!
//! The crate uses a combination of:
//! - `thiserror` for strongly-typed errors
//! - `miette` for rich diagnostic output in CLI
//!
//! Problems with individual items are collected into a [`report::Report`]
//! and never abort a run; only repository-wide failures are returned as
//! errors.

pub mod catalogs;
pub mod clean;
pub mod cli;
pub mod commands;
pub mod error;
pub mod format;
pub mod logging;
pub mod manifest;
pub mod pkginfo;
pub mod repo;
pub mod report;
pub mod size;
pub mod version;

#[cfg(test)]
mod testing;
