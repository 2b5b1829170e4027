use std::fmt::Display;

/// Verbosity-aware stderr logger shared by the scanners and commands.
///
/// Level 1 reports scan progress, level 2 names individual items. Warnings
/// follow `quiet`; errors are always printed.
#[derive(Clone, Copy, Debug, Default)]
pub struct Logger {
    verbose: u8,
    quiet: bool,
}

impl Logger {
    pub fn new(verbose: u8, quiet: bool) -> Self {
        Self { verbose, quiet }
    }

    pub fn info(&self, message: impl Display) {
        if !self.quiet {
            eprintln!("{message}");
        }
    }

    pub fn verbose(&self, level: u8, message: impl Display) {
        if !self.quiet && self.verbose >= level {
            eprintln!("{message}");
        }
    }

    pub fn warn(&self, message: impl Display) {
        self.info(format_args!("WARNING: {message}"));
    }

    pub fn error(&self, message: impl Display) {
        eprintln!("ERROR: {message}");
    }
}
