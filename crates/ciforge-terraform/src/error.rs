//! Provisioner errors.

use thiserror::Error;

pub type TerraformResult<T> = Result<T, TerraformError>;

#[derive(Debug, Error)]
pub enum TerraformError {
    #[error("failed to execute {binary}: {reason}")]
    Exec { binary: String, reason: String },

    #[error("terraform {command} failed (exit code {code}): {output}")]
    CommandFailed {
        command: String,
        code: i32,
        output: String,
    },

    #[error("unknown DB size: {0}")]
    UnknownDbSize(String),

    #[error("failed to encode input variables: {0}")]
    Serialize(String),

    #[error("failed to parse terraform outputs: {0}")]
    Outputs(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
