//! Error types for Incus operations.
//!
//! Errors are categorized so callers can tell lookups that drive branch
//! selection apart from conditions that end a reconciliation run.

use std::path::PathBuf;
use thiserror::Error;

/// Categories of reconciliation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// A resource the request depends on does not exist
    NotFound,
    /// A required parameter is missing for the selected mode
    Validation,
    /// The incus CLI exited non-zero
    ExternalCommand,
    /// Structured output from the incus CLI could not be parsed
    Decode,
    /// The local environment is unusable (missing binary, unreadable file)
    Environment,
}

impl ErrorCategory {
    /// Get a user-friendly description of this error category.
    pub fn description(&self) -> &'static str {
        match self {
            Self::NotFound => "Resource not found",
            Self::Validation => "Invalid request",
            Self::ExternalCommand => "incus command failed",
            Self::Decode => "Unreadable incus output",
            Self::Environment => "Environment problem",
        }
    }

    /// Get actionable advice for resolving this error category.
    pub fn advice(&self) -> &'static str {
        match self {
            Self::NotFound => "Check the pool, volume, snapshot and remote names",
            Self::Validation => "Supply the parameter required by the requested state",
            Self::ExternalCommand => "Inspect the stderr output of the failed command",
            Self::Decode => "Check that the incus client version is supported",
            Self::Environment => "Install Incus or set INCANT_INCUS_BIN to its path",
        }
    }
}

/// Errors that can occur while reconciling Incus resources.
#[derive(Debug, Error)]
pub enum Error {
    /// Lookup found nothing where something was required
    #[error("{what} not found")]
    NotFound {
        /// Human-readable name of the missing resource
        what: String,
    },

    /// A required auxiliary parameter is missing
    #[error("{0}")]
    Validation(String),

    /// The incus CLI returned a non-zero exit status
    #[error("{message}: {} (command: {command})", .stderr.trim())]
    CommandFailed {
        /// What was being attempted
        message: String,
        /// The full command line, for diagnosis
        command: String,
        /// Exit status returned by the process
        status: i32,
        /// Raw standard output
        stdout: String,
        /// Raw standard error
        stderr: String,
    },

    /// Structured text returned by the CLI could not be parsed
    #[error("could not decode {what}: {message}")]
    Decode {
        /// What was being decoded
        what: String,
        /// Parser error
        message: String,
    },

    /// A declaration file is missing or malformed
    #[error("declaration file '{}': {message}", .path.display())]
    Declaration {
        /// Path of the declaration file
        path: PathBuf,
        /// What went wrong
        message: String,
    },

    /// The incus executable could not be located
    #[error("incus executable not found. Install Incus or set INCANT_INCUS_BIN")]
    IncusNotFound,

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML encoding error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl Error {
    /// Get the error category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::NotFound { .. } => ErrorCategory::NotFound,
            Error::Validation(_) => ErrorCategory::Validation,
            Error::CommandFailed { .. } => ErrorCategory::ExternalCommand,
            Error::Decode { .. } | Error::Yaml(_) => ErrorCategory::Decode,
            Error::Declaration { .. } | Error::IncusNotFound | Error::Io(_) => {
                ErrorCategory::Environment
            }
        }
    }

    /// Shorthand for a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation(message.into())
    }

    /// Shorthand for a not-found error.
    pub fn not_found(what: impl Into<String>) -> Self {
        Error::NotFound { what: what.into() }
    }
}

impl From<Error> for declarative::Failure {
    fn from(err: Error) -> Self {
        let failure = declarative::Failure::new(err.to_string());
        match err {
            Error::CommandFailed { stdout, stderr, .. } => failure.with_output(stdout, stderr),
            _ => failure,
        }
    }
}

/// Result type for Incus operations.
pub type Result<T> = std::result::Result<T, Error>;
