//! Accumulation of recoverable errors and warnings.
//!
//! Scans over a repository must not stop at the first bad file. Functions that
//! walk many resources return their data alongside a [`Report`]; anything that
//! should end the run is still returned as an `Err` through `?`.

use crate::error::{MunkiError, Result};
use crate::logging::Logger;

/// Errors and warnings collected during a run.
#[derive(Debug, Default)]
pub struct Report {
    /// Per-item errors, in the order they were encountered
    pub errors: Vec<MunkiError>,
    /// Non-fatal warnings
    pub warnings: Vec<String>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep the value of an `Ok`, or record the error and yield `None`.
    pub fn collect<T>(&mut self, result: Result<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                self.errors.push(err);
                None
            }
        }
    }

    pub fn error(&mut self, err: MunkiError) {
        self.errors.push(err);
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    /// Append everything from `other`, preserving order.
    pub fn extend(&mut self, other: Report) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty() && self.warnings.is_empty()
    }

    /// Print warnings then errors. Errors are printed even in quiet mode.
    pub fn print(&self, log: &Logger) {
        for warning in &self.warnings {
            log.warn(warning);
        }
        if !self.errors.is_empty() {
            log.error(format_args!("{} errors encountered:", self.errors.len()));
            for err in &self.errors {
                log.error(err.chain_message());
            }
        }
    }
}
