//! Command-level errors with sysexits-style exit codes.

use std::path::PathBuf;

use proc_core::{ErrorKind, ProcError, WireError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    /// Input file not found.
    #[error("Input file not found: {path}")]
    InputNotFound { path: PathBuf },

    /// Malformed command-line value.
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    /// The file does not hold a proc program.
    #[error("Invalid program in '{path}': {source}")]
    InvalidProgram {
        path: PathBuf,
        #[source]
        source: WireError,
    },

    /// Configuration error.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// The call failed.
    #[error("{kind}: {source}")]
    Proc {
        kind: ErrorKind,
        #[source]
        source: ProcError,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<ProcError> for CliError {
    fn from(source: ProcError) -> Self {
        CliError::Proc {
            kind: source.kind(),
            source,
        }
    }
}

impl CliError {
    /// Returns the exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::InputNotFound { .. } => 66,   // EX_NOINPUT
            CliError::InvalidArgument { .. } => 64, // EX_USAGE
            CliError::InvalidProgram { .. } => 65,  // EX_DATAERR
            CliError::Config { .. } => 78,          // EX_CONFIG
            CliError::Proc { kind, .. } => match kind {
                ErrorKind::Unavailable => 69,                          // EX_UNAVAILABLE
                ErrorKind::Unauthorized | ErrorKind::Forbidden => 77, // EX_NOPERM
                ErrorKind::Timeout | ErrorKind::Limited => 75,         // EX_TEMPFAIL
                _ => 1,
            },
            CliError::Io(_) => 74,   // EX_IOERR
            CliError::Json(_) => 65, // EX_DATAERR
        }
    }
}

/// Result type for CLI commands.
pub type CliResult<T> = Result<T, CliError>;
