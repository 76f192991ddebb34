//! Cloud capability errors.

use thiserror::Error;

pub type IaasResult<T> = Result<T, IaasError>;

#[derive(Debug, Error)]
pub enum IaasError {
    #[error("unsupported IaaS: {0}")]
    Unsupported(String),

    #[error("failed to execute {binary}: {reason}")]
    Exec { binary: String, reason: String },

    #[error("{command} failed (exit code {code}): {stderr}")]
    CommandFailed {
        command: String,
        code: i32,
        stderr: String,
    },

    #[error("unexpected {command} output: {reason}")]
    Parse { command: String, reason: String },
}
