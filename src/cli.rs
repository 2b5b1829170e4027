//! Command-line interface definitions for munki-repo.
//!
//! This module defines the CLI structure using clap, including all subcommands
//! and their arguments. The main entry point is the [`Cli`] struct.
//!
//! # Example
//!
//! ```no_run
//! use munki_repo::cli::{Cli, Commands};
//!
//! // Parse command-line arguments
//! let cli = Cli::parse_args();
//!
//! // Access the parsed command
//! match cli.command() {
//!     Commands::Repoclean { keep, .. } => println!("Keeping {keep} versions"),
//!     Commands::Makecatalogs { force, .. } => println!("Force: {force}"),
//! }
//! ```

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use crate::clean::DEFAULT_KEEP;
use crate::error::{MunkiError, Result};
use crate::pkginfo::DEFAULT_JOBS;
use crate::repo::FileRepo;


/// Main command-line interface for munki-repo.
///
/// This struct represents the top-level CLI configuration, containing both
/// global options that apply to all commands and the specific subcommand
/// to execute.
#[derive(Parser)]
#[command(
    name = "munki-repo",
    bin_name = "munki-repo",
    author,
    version,
    about = "Keep a Munki repository's pkginfo, manifests and catalogs consistent",
    long_about = None,
    propagate_version = true
)]
pub struct Cli {
    #[command(flatten)]
    global_opts: GlobalOpts,

    #[command(subcommand)]
    command: Commands,
}

/// Global options that apply to all munki-repo commands.
#[derive(Parser)]
pub struct GlobalOpts {
    /// Repository URL (`file://` URL or local path); use instead of
    /// REPO_PATH
    #[arg(long, global = true, env = "MUNKI_REPO_URL")]
    repo_url: Option<String>,

    /// Number of parallel readers used while scanning the repository
    #[arg(
        short,
        long,
        global = true,
        default_value_t = DEFAULT_JOBS,
        env = "MUNKI_REPO_JOBS"
    )]
    jobs: usize,

    /// Enable verbose output (use multiple times for more verbosity)
    #[arg(short, long, global = true, action = clap::ArgAction::Count, env = "MUNKI_REPO_VERBOSE")]
    verbose: u8,

    /// Silence all output except for errors
    #[arg(
        short,
        long,
        global = true,
        conflicts_with = "verbose",
        env = "MUNKI_REPO_QUIET"
    )]
    quiet: bool,
}

impl GlobalOpts {
    /// Create a new builder for constructing `GlobalOpts` programmatically.
    pub fn builder() -> GlobalOptsBuilder {
        GlobalOptsBuilder::default()
    }

    /// Get the repository URL option
    pub fn repo_url(&self) -> Option<&str> {
        self.repo_url.as_deref()
    }

    /// Get the worker count
    pub fn jobs(&self) -> usize {
        self.jobs
    }

    /// Get the verbose level
    pub fn verbose(&self) -> u8 {
        self.verbose
    }

    /// Check if quiet mode is enabled
    pub fn quiet(&self) -> bool {
        self.quiet
    }
}

/// Builder for constructing `GlobalOpts` programmatically.
#[derive(Default)]
pub struct GlobalOptsBuilder {
    repo_url: Option<String>,
    jobs: Option<usize>,
    verbose: u8,
    quiet: bool,
}

impl GlobalOptsBuilder {
    /// Set the repository URL.
    pub fn repo_url(mut self, url: Option<impl Into<String>>) -> Self {
        self.repo_url = url.map(Into::into);
        self
    }

    /// Set the number of parallel readers.
    pub fn jobs(mut self, jobs: usize) -> Self {
        self.jobs = Some(jobs);
        self
    }

    /// Set the verbosity level (0 = normal, 1+ = verbose).
    pub fn verbose(mut self, level: u8) -> Self {
        self.verbose = level;
        self
    }

    /// Enable or disable quiet mode.
    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    /// Build the `GlobalOpts` instance with the configured values.
    pub fn build(self) -> GlobalOpts {
        GlobalOpts {
            repo_url: self.repo_url,
            jobs: self.jobs.unwrap_or(DEFAULT_JOBS),
            verbose: self.verbose,
            quiet: self.quiet,
        }
    }
}

/// Where the repository lives, as given on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepoLocation {
    /// A `--repo-url` value
    Url(String),
    /// A positional repository path, made absolute
    Path(PathBuf),
}

impl RepoLocation {
    /// Connect to the repository.
    pub fn open(&self) -> Result<FileRepo> {
        match self {
            RepoLocation::Url(url) => FileRepo::connect(url),
            RepoLocation::Path(path) => FileRepo::open(path),
        }
    }
}

impl Cli {
    /// Get the global options
    pub fn global_opts(&self) -> &GlobalOpts {
        &self.global_opts
    }

    /// Get the command
    pub fn command(&self) -> &Commands {
        &self.command
    }

    /// Create a builder for programmatic construction
    pub fn builder() -> CliBuilder {
        CliBuilder::default()
    }

    /// Resolve the repository from `--repo-url` or the command's REPO_PATH.
    ///
    /// Exactly one of the two must be given.
    pub fn repo_location(&self) -> Result<RepoLocation> {
        match (self.global_opts.repo_url(), self.command.repo_path()) {
            (Some(url), None) => Ok(RepoLocation::Url(url.to_string())),
            (None, Some(path)) => Ok(RepoLocation::Path(normalize_path(path))),
            (Some(_), Some(_)) => Err(MunkiError::ConfigError(
                "Give either --repo-url or a repository path, not both".to_string(),
            )),
            (None, None) => Err(MunkiError::ConfigError(
                "A repository is required: pass --repo-url, set MUNKI_REPO_URL, or give a \
                 repository path"
                    .to_string(),
            )),
        }
    }

    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

/// Builder for [`Cli`]
#[derive(Debug, Default)]
pub struct CliBuilder {
    repo_url: Option<String>,
    jobs: Option<usize>,
    verbose: u8,
    quiet: bool,
    command: Option<Commands>,
}

impl CliBuilder {
    /// Set the repository URL
    pub fn repo_url(mut self, url: impl Into<String>) -> Self {
        self.repo_url = Some(url.into());
        self
    }

    /// Set the number of parallel readers
    pub fn jobs(mut self, jobs: usize) -> Self {
        self.jobs = Some(jobs);
        self
    }

    /// Set the verbose level
    pub fn verbose(mut self, level: u8) -> Self {
        self.verbose = level;
        self
    }

    /// Enable quiet mode
    pub fn quiet(mut self, enabled: bool) -> Self {
        self.quiet = enabled;
        self
    }

    /// Set the command
    pub fn command(mut self, command: Commands) -> Self {
        self.command = Some(command);
        self
    }

    /// Build the Cli instance
    pub fn build(self) -> Result<Cli> {
        let command = self
            .command
            .ok_or_else(|| MunkiError::ConfigError("Command is required".to_string()))?;

        Ok(Cli {
            global_opts: GlobalOpts::builder()
                .repo_url(self.repo_url)
                .jobs(self.jobs.unwrap_or(DEFAULT_JOBS))
                .verbose(self.verbose)
                .quiet(self.quiet)
                .build(),
            command,
        })
    }
}

/// Normalize a path to be absolute and clean, without requiring it to exist.
///
/// Relative paths are joined to the current directory and `.`/`..`
/// components are folded away. Symlinks are left alone.
pub(crate) fn normalize_path(path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();

    let absolute = if path.is_relative() {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    } else {
        path.to_path_buf()
    };

    let mut components = Vec::new();
    for component in absolute.components() {
        use std::path::Component;
        match component {
            Component::ParentDir => {
                if let Some(last) = components.last()
                    && !matches!(last, Component::ParentDir)
                {
                    components.pop();
                    continue;
                }
                components.push(component);
            }
            Component::CurDir => continue,
            _ => components.push(component),
        }
    }

    components.into_iter().collect()
}

/// Available munki-repo subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Remove older, unused software items from the repository
    ///
    /// For each variant line (items sharing name, catalogs and install
    /// constraints) keeps:
    /// - Every version a manifest names explicitly (e.g. `Firefox-115.0`)
    /// - Every version another item `requires` explicitly
    /// - The newest `--keep` of the remaining versions
    ///
    /// Everything else is offered for deletion, together with installer items
    /// no pkginfo refers to. Installer items still used by a kept pkginfo are
    /// never deleted. Catalogs are rebuilt afterwards.
    Repoclean {
        /// Number of versions to keep by retention alone (0 keeps only pinned
        /// versions)
        #[arg(short, long, default_value_t = DEFAULT_KEEP, env = "REPOCLEAN_KEEP")]
        keep: usize,

        /// Show every item, not only those with versions to delete
        #[arg(long)]
        show_all: bool,

        /// Delete without asking for confirmation
        #[arg(short, long)]
        auto: bool,

        /// Show what would be deleted without deleting anything
        #[arg(long)]
        dry_run: bool,

        /// Path to the repository
        repo_path: Option<PathBuf>,
    },

    /// Rebuild the catalogs from the pkginfo files
    ///
    /// Every pkginfo is added to the `all` catalog and to each catalog in its
    /// `catalogs` array. Items whose installer is missing from `pkgs/` are
    /// left out and reported; duplicate items within a catalog are reported.
    /// Exits non-zero if any error was found.
    Makecatalogs {
        /// Include items even when their installer items are missing
        #[arg(short, long)]
        force: bool,

        /// Do not check that installer items exist
        #[arg(short, long)]
        skip_pkg_check: bool,

        /// Write catalogs as YAML instead of XML property lists
        #[arg(long)]
        yaml: bool,

        /// Path to the repository
        repo_path: Option<PathBuf>,
    },
}

impl Commands {
    /// The positional repository path, if one was given.
    pub fn repo_path(&self) -> Option<&Path> {
        match self {
            Commands::Repoclean { repo_path, .. } | Commands::Makecatalogs { repo_path, .. } => {
                repo_path.as_deref()
            }
        }
    }
}
