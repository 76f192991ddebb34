//! Director integration errors.

use thiserror::Error;

use crate::runner::RunnerState;

pub type DirectorResult<T> = Result<T, DirectorError>;

#[derive(Debug, Error)]
pub enum DirectorError {
    #[error("failed to execute {binary}: {reason}")]
    Exec { binary: String, reason: String },

    #[error("{command} failed (exit code {code}): {output}")]
    CommandFailed {
        command: String,
        code: i32,
        output: String,
    },

    #[error("couldn't find `Finished deploying` or `Skipping deploy` in director output")]
    MissingSuccessMarker { output: String },

    #[error("cannot {operation} from the {state} state")]
    InvalidState {
        operation: &'static str,
        state: RunnerState,
    },

    #[error("failed to render director manifest: {0}")]
    Manifest(String),

    #[error("invalid director credentials: {0}")]
    Credentials(String),

    #[error("failed to generate secret: {0}")]
    Secret(#[from] getrandom::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secret_failure_keeps_its_source() {
        let err = DirectorError::from(getrandom::Error::UNSUPPORTED);
        assert!(err.to_string().starts_with("failed to generate secret: "));
        assert!(std::error::Error::source(&err).is_some());
    }
}
