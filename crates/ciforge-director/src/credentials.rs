//! Secrets the director deployment is rendered with.
//!
//! Generated on the first deploy, stored as the `director-creds.yml` asset
//! and fed back in on every converge so the director keeps its passwords.

use ciforge_core::secrets::generate_password;
use serde::{Deserialize, Serialize};

use crate::error::{DirectorError, DirectorResult};

/// User the workload broker CLI authenticates as.
pub const CREDHUB_CLI_USER: &str = "credhub-cli";

/// Port the workload broker listens on.
pub const CREDHUB_PORT: u16 = 8844;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectorCredentials {
    pub nats_password: String,
    pub hm_password: String,
    pub mbus_bootstrap_password: String,
    pub blobstore_director_password: String,
    pub blobstore_agent_password: String,
    pub uaa_admin_client_secret: String,
    pub credhub_cli_password: String,
    pub credhub_admin_client_secret: String,
    pub credhub_encryption_password: String,
}

impl DirectorCredentials {
    pub fn generate() -> DirectorResult<Self> {
        Ok(Self {
            nats_password: generate_password()?,
            hm_password: generate_password()?,
            mbus_bootstrap_password: generate_password()?,
            blobstore_director_password: generate_password()?,
            blobstore_agent_password: generate_password()?,
            uaa_admin_client_secret: generate_password()?,
            credhub_cli_password: generate_password()?,
            credhub_admin_client_secret: generate_password()?,
            // Encryption keys must be at least 20 characters.
            credhub_encryption_password: format!(
                "{}{}",
                generate_password()?,
                generate_password()?
            ),
        })
    }

    /// Reuse stored credentials when present, otherwise generate fresh ones.
    pub fn reuse_or_generate(stored: Option<&[u8]>) -> DirectorResult<Self> {
        match stored {
            Some(bytes) if !bytes.is_empty() => Self::from_bytes(bytes),
            _ => Self::generate(),
        }
    }

    pub fn from_bytes(bytes: &[u8]) -> DirectorResult<Self> {
        serde_yaml::from_slice(bytes).map_err(|e| DirectorError::Credentials(e.to_string()))
    }

    pub fn to_bytes(&self) -> DirectorResult<Vec<u8>> {
        serde_yaml::to_string(self)
            .map(String::into_bytes)
            .map_err(|e| DirectorError::Credentials(e.to_string()))
    }

    /// Workload broker endpoint for a host (domain or public IP).
    pub fn credhub_url(host: &str) -> String {
        format!("https://{host}:{CREDHUB_PORT}/")
    }
}
