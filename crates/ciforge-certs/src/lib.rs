//! ciforge-certs — TLS material for the director and the public endpoint.
//!
//! An issuer keeps one self-signed authority per CA name for the lifetime
//! of a run and signs leaf certificates for a purpose and a set of subjects
//! (IP addresses or DNS names). Nothing is cached across runs.

pub mod error;
pub mod issuer;

pub use error::{CertError, CertResult};
pub use issuer::{CertificateIssuer, RunScopedIssuer};
