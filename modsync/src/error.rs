//! Error types for the update engine.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for updater operations.
pub type UpdaterResult<T> = Result<T, UpdaterError>;

/// Errors that can occur during an update session.
///
/// Per-file and per-source errors are contained and aggregated into the
/// session outcome by the orchestrator; none of these escape a session.
#[derive(Debug, Error)]
pub enum UpdaterError {
    /// Failed to read a local file.
    #[error("failed to read {path}: {source}")]
    ReadFailed { path: PathBuf, source: io::Error },

    /// Failed to write a local file.
    #[error("failed to write {path}: {source}")]
    WriteFailed { path: PathBuf, source: io::Error },

    /// Failed to copy a file to its destination.
    #[error("failed to copy {from} to {to}: {source}")]
    CopyFailed {
        from: PathBuf,
        to: PathBuf,
        source: io::Error,
    },

    /// Failed to create a directory.
    #[error("failed to create directory {path}: {source}")]
    CreateDirFailed { path: PathBuf, source: io::Error },

    /// Failed to delete a file or directory.
    #[error("failed to delete {path}: {source}")]
    DeleteFailed { path: PathBuf, source: io::Error },

    /// HTTP request failed or returned a non-success status.
    #[error("failed to fetch {url}: {reason}")]
    FetchFailed { url: String, reason: String },

    /// Request timed out.
    #[error("request to {url} timed out after {timeout_secs}s")]
    Timeout { url: String, timeout_secs: u64 },

    /// Response body was empty where content was required.
    #[error("empty response body from {url}")]
    EmptyBody { url: String },

    /// Remote digest payload could not be decoded.
    #[error("malformed digest from {url}: {reason}")]
    MalformedDigest { url: String, reason: String },

    /// Failed to construct the HTTP client.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(String),

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
