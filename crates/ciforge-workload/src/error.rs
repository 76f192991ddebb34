//! Workload errors.

use thiserror::Error;

pub type WorkloadResult<T> = Result<T, WorkloadError>;

#[derive(Debug, Error)]
pub enum WorkloadError {
    #[error("failed to execute {binary}: {reason}")]
    Exec { binary: String, reason: String },

    #[error("fly {command} failed (exit code {code}): {output}")]
    CommandFailed {
        command: String,
        code: i32,
        output: String,
    },

    #[error("fly version does not match the platform version: {0}")]
    VersionDiscrepancy(String),

    #[error("failed to render pipeline: {0}")]
    Pipeline(String),

    #[error("HTTP request to {address} failed: {reason}")]
    Http { address: String, reason: String },

    #[error("HTTP request to {address} timed out")]
    Timeout { address: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
