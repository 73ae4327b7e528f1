//! Error types shared across the shorereel-core library.

use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

/// Custom error types for shorereel
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("External dependency '{0}' not found in PATH")]
    DependencyNotFound(String),

    #[error("Failed to start {0}: {1}")]
    CommandStart(String, std::io::Error),

    #[error("{tool} failed with status {status}: {stderr}")]
    CommandFailed {
        tool: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("{tool} timed out after {seconds} seconds")]
    CommandTimeout { tool: String, seconds: u64 },

    #[error("ffprobe output parse error: {0}")]
    ProbeParse(String),

    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Provider '{provider}' error: {message}")]
    Provider { provider: String, message: String },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Another instance holds the catalog lock at {0}")]
    LockHeld(PathBuf),

    #[error("Download error: {0}")]
    Download(String),
}

/// Result type for shorereel-core operations
pub type CoreResult<T> = std::result::Result<T, CoreError>;

/// Builds a `CommandStart` error for a tool that could not be spawned.
pub fn command_start_error(tool: impl Into<String>, err: std::io::Error) -> CoreError {
    CoreError::CommandStart(tool.into(), err)
}

/// Builds a `CommandFailed` error from a non-zero exit.
pub fn command_failed_error(
    tool: impl Into<String>,
    status: ExitStatus,
    stderr: impl Into<String>,
) -> CoreError {
    CoreError::CommandFailed {
        tool: tool.into(),
        status,
        stderr: stderr.into(),
    }
}

/// Builds a `Provider` error for a remote host API failure.
pub fn provider_error(provider: impl Into<String>, message: impl Into<String>) -> CoreError {
    CoreError::Provider {
        provider: provider.into(),
        message: message.into(),
    }
}
