//! Shared types passed between ciforge crates.

use serde::{Deserialize, Serialize};

/// Asset holding the director's create-env state file.
pub const DIRECTOR_STATE_ASSET: &str = "director-state.json";

/// Asset holding the credentials the director deployment was rendered with.
pub const DIRECTOR_CREDS_ASSET: &str = "director-creds.yml";

/// Fixed internal address of the director inside the private network.
pub const DIRECTOR_INTERNAL_IP: &str = "10.0.0.6";

/// Typed result of applying the infrastructure definition.
///
/// Lives for one run only; the fields the deployment needs later are
/// copied into the [`Config`](crate::Config).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvisionOutputs {
    pub atc_public_ip: String,
    pub atc_security_group_id: String,
    pub director_public_ip: String,
    pub director_security_group_id: String,
    pub vms_security_group_id: String,
    pub nat_gateway_ip: String,
    pub vpc_id: String,
    pub public_subnet_id: String,
    pub private_subnet_id: String,
    pub bosh_db_address: String,
    pub bosh_db_port: u16,
    pub blobstore_bucket: String,
    pub blobstore_user_access_key_id: String,
    pub blobstore_secret_access_key: String,
    pub bosh_user_access_key_id: String,
    pub bosh_secret_access_key: String,
    /// PEM private key generated alongside the director key pair.
    pub director_key_pair: String,
    /// OpenSSH public half of `director_key_pair`.
    pub director_public_key: String,
}

/// State and credentials produced by a director deployment.
///
/// Opaque to everything but the director integration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectorArtifacts {
    pub state: Vec<u8>,
    pub creds: Vec<u8>,
}

/// What a certificate is issued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CertPurpose {
    /// The director API and its colocated services.
    Director,
    /// The platform's public web endpoint.
    PublicEndpoint,
}

impl CertPurpose {
    pub fn label(&self) -> &'static str {
        match self {
            CertPurpose::Director => "director",
            CertPurpose::PublicEndpoint => "public-endpoint",
        }
    }
}

/// PEM material for one purpose, signed by the run's authority.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateBundle {
    pub purpose: CertPurpose,
    pub subjects: Vec<String>,
    pub ca_cert: String,
    pub cert: String,
    pub key: String,
}
