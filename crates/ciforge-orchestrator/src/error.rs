//! Error types for the orchestrator.
//!
//! Collaborator errors are wrapped transparently so their text reaches the
//! operator unchanged.

use ciforge_certs::CertError;
use ciforge_core::RequestError;
use ciforge_director::DirectorError;
use ciforge_iaas::IaasError;
use ciforge_state::StateError;
use ciforge_terraform::TerraformError;
use ciforge_workload::WorkloadError;
use thiserror::Error;

/// Result type alias for orchestrator operations.
pub type OrchestratorResult<T> = Result<T, OrchestratorError>;

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error(
        "found previous deployment in {existing}. Refusing to deploy to {requested} as changing regions for existing deployments is not supported"
    )]
    RegionMismatch { existing: String, requested: String },

    #[error(transparent)]
    Request(#[from] RequestError),

    #[error("no deployment found for {0}")]
    NoDeployment(String),

    #[error("could not determine the local IP address: {0}")]
    InvalidSourceIp(String),

    #[error("failed to generate password: {0}")]
    Secret(#[from] getrandom::Error),

    #[error("failed to write operator output: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    State(#[from] StateError),

    #[error(transparent)]
    Iaas(#[from] IaasError),

    #[error(transparent)]
    Terraform(#[from] TerraformError),

    #[error(transparent)]
    Cert(#[from] CertError),

    #[error(transparent)]
    Director(#[from] DirectorError),

    #[error(transparent)]
    Workload(#[from] WorkloadError),
}
