//! Error types for build-server operations.
//!
//! Two severities exist in a run. Recorded failures go into the
//! [`ErrorLedger`](crate::session::ErrorLedger) and never surface as `Err`.
//! Everything in this module is a terminal error: it aborts the remaining
//! stages and is recorded by the pipeline as an unhandled exception.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type alias for build-server operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for all build-server operations
#[derive(Error, Debug)]
pub enum Error {
    /// CLI argument errors
    #[error("CLI error: {0}")]
    Cli(#[from] CliError),

    /// IO errors with the path and action that failed
    #[error("IO error while {action} ({}): {source}", path.display())]
    Fs {
        /// What was being done
        action: String,
        /// Path involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// IO errors without path context
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP transport errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// build-server.toml parsing errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// An external tool could not be started
    #[error("Failed to launch {program}: {source}")]
    ToolLaunch {
        /// Program that was invoked
        program: String,
        /// Spawn error
        #[source]
        source: std::io::Error,
    },

    /// Upload retries were exhausted
    #[error(
        "Upload failed after {attempts} attempts. Verify that this file is not already uploaded: {} ({source})",
        path.display()
    )]
    UploadFailed {
        /// File that could not be uploaded
        path: PathBuf,
        /// Number of attempts made
        attempts: u32,
        /// Last underlying failure
        #[source]
        source: Box<Error>,
    },

    /// Hosted release lookup found nothing
    #[error("Release with tag '{tag}' not found")]
    ReleaseNotFound {
        /// Tag that was looked up
        tag: String,
    },

    /// Remote API answered with a non-success status
    #[error("{service} request failed with status {status}: {body}")]
    Api {
        /// Service name (for messages)
        service: &'static str,
        /// HTTP status code
        status: u16,
        /// Response body
        body: String,
    },

    /// Build metadata missing or malformed
    #[error("Metadata error: {0}")]
    Metadata(String),

    /// Generic errors from anyhow
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    /// Invalid command line arguments
    #[error("Invalid arguments: {reason}")]
    InvalidArguments {
        /// Reason for the error
        reason: String,
    },

    /// One half of a credential pair was supplied without the other
    #[error("Arguments {first} and {second} must be given both or neither")]
    IncompletePair {
        /// First argument of the pair
        first: &'static str,
        /// Second argument of the pair
        second: &'static str,
    },

    /// Host OS has no packaging strategy
    #[error("Unsupported platform: {os}")]
    UnsupportedPlatform {
        /// Value of `std::env::consts::OS`
        os: String,
    },
}

/// Attaches path context to IO results.
pub trait ErrorExt<T> {
    /// Converts an IO error into [`Error::Fs`] naming `action` and `path`.
    fn fs_context(self, action: &str, path: &Path) -> Result<T>;
}

impl<T> ErrorExt<T> for std::result::Result<T, std::io::Error> {
    fn fs_context(self, action: &str, path: &Path) -> Result<T> {
        self.map_err(|source| Error::Fs {
            action: action.to_string(),
            path: path.to_path_buf(),
            source,
        })
    }
}
