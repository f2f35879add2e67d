//! Error types and exit-code policy

use std::io;

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, DriverError>;

/// Everything the driver itself can report. Failures of the invoked
/// programs are not errors here: they are logged and the sweep goes on.
#[derive(Debug, Error)]
pub enum DriverError {
    /// Fewer than the three required positionals
    #[error("expected at least 3 positional arguments, got {0}")]
    Usage(usize),

    /// Rejected by the argument parser; holds its rendered message
    #[error("{0}")]
    Cli(String),

    #[error("a penalty value must be given as the 4th argument")]
    MissingPenalty,

    #[error("invalid fold selector '{selector}': {reason}")]
    InvalidFold { selector: String, reason: String },

    #[error("invalid mode '{0}': expected one of aggregate, score, all")]
    InvalidMode(String),

    #[error("configuration error: {0}")]
    Config(String),

    /// The external program could not be started at all
    #[error("failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// How driver errors map to the process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExitPolicy {
    /// Exit 0 on every path, usage and argument errors included.
    /// Existing automation around the sweep relies on this.
    #[default]
    Legacy,
    /// Usage and command-line errors 2, other driver errors 1.
    Strict,
}

impl ExitPolicy {
    pub fn from_flag(strict: bool) -> Self {
        if strict { ExitPolicy::Strict } else { ExitPolicy::Legacy }
    }

    pub fn code_for(self, outcome: &Result<()>) -> i32 {
        match (self, outcome) {
            (_, Ok(())) => 0,
            (ExitPolicy::Legacy, Err(_)) => 0,
            (ExitPolicy::Strict, Err(DriverError::Usage(_) | DriverError::Cli(_))) => 2,
            (ExitPolicy::Strict, Err(_)) => 1,
        }
    }
}
