use crate::pkginfo::DEFAULT_JOBS;

/// Number of versions of each variant line kept when nothing else pins them.
pub const DEFAULT_KEEP: usize = 2;

/// Settings for one repoclean run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanConfig {
    /// Versions kept per variant line by retention alone
    keep: usize,
    /// List every variant line, not only those with deletions
    show_all: bool,
    /// Skip the confirmation questions
    auto: bool,
    /// Stop after presenting the plan
    dry_run: bool,
    /// Parallel readers
    jobs: usize,
}

impl CleanConfig {
    /// Creates a new builder for [`CleanConfig`]
    pub fn builder() -> CleanConfigBuilder {
        CleanConfigBuilder::default()
    }

    pub fn keep(&self) -> usize {
        self.keep
    }

    pub fn show_all(&self) -> bool {
        self.show_all
    }

    pub fn auto(&self) -> bool {
        self.auto
    }

    pub fn dry_run(&self) -> bool {
        self.dry_run
    }

    pub fn jobs(&self) -> usize {
        self.jobs
    }
}

impl Default for CleanConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Builder for [`CleanConfig`]
#[derive(Debug, Default)]
pub struct CleanConfigBuilder {
    keep: Option<usize>,
    show_all: bool,
    auto: bool,
    dry_run: bool,
    jobs: Option<usize>,
}

impl CleanConfigBuilder {
    /// Set how many versions retention keeps (0 keeps only pinned versions)
    pub fn keep(mut self, keep: usize) -> Self {
        self.keep = Some(keep);
        self
    }

    pub fn show_all(mut self, enabled: bool) -> Self {
        self.show_all = enabled;
        self
    }

    /// Delete without asking
    pub fn auto(mut self, enabled: bool) -> Self {
        self.auto = enabled;
        self
    }

    pub fn dry_run(mut self, enabled: bool) -> Self {
        self.dry_run = enabled;
        self
    }

    /// Set the worker count; values below 1 are raised to 1
    pub fn jobs(mut self, jobs: usize) -> Self {
        self.jobs = Some(jobs);
        self
    }

    /// Build the [`CleanConfig`]
    pub fn build(self) -> CleanConfig {
        CleanConfig {
            keep: self.keep.unwrap_or(DEFAULT_KEEP),
            show_all: self.show_all,
            auto: self.auto,
            dry_run: self.dry_run,
            jobs: self.jobs.unwrap_or(DEFAULT_JOBS).max(1),
        }
    }
}
