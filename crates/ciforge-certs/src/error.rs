//! Certificate issuance errors.

use thiserror::Error;

pub type CertResult<T> = Result<T, CertError>;

#[derive(Debug, Error)]
pub enum CertError {
    #[error("certificate generation failed: {0}")]
    Generate(#[from] rcgen::Error),

    #[error("no subjects given for {0} certificate")]
    NoSubjects(String),

    #[error("invalid subject {subject:?}: {reason}")]
    InvalidSubject { subject: String, reason: String },

    #[error("certificate authority lock poisoned")]
    Poisoned,
}
