//! The durable deployment record.
//!
//! One `Config` exists per named deployment. It is created on the first
//! deploy, committed twice per deploy (after provisioning and after the
//! director and workload steps) and only removed by an explicit destroy.

use serde::{Deserialize, Serialize};

/// Prefix joined onto the operator's project name to form the deployment name.
pub const DEPLOYMENT_PREFIX: &str = "ciforge-";

/// Allow-list entry meaning "reachable from anywhere".
pub const UNRESTRICTED_CIDR: &str = "0.0.0.0/0";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // ── Identity ───────────────────────────────────────────────────
    pub version: String,
    pub deployment: String,
    pub project: String,
    /// Immutable once the record exists.
    pub region: String,
    pub iaas: String,
    pub availability_zone: String,
    pub tags: Vec<String>,

    // ── Network policy ─────────────────────────────────────────────
    /// CIDR blocks allowed to reach the public endpoint.
    pub allow_ips: Vec<String>,
    /// The operator's detected outbound IP, granted director access.
    pub source_access_ip: String,
    pub network_cidr: String,
    pub public_cidr: String,
    pub private_cidr: String,

    // ── Credentials ────────────────────────────────────────────────
    pub director_username: String,
    pub director_password: String,
    pub rds_username: String,
    pub rds_password: String,
    pub rds_default_database_name: String,
    pub concourse_username: String,
    pub concourse_password: String,
    pub public_key: String,
    pub private_key: String,

    // ── Provisioning-derived facts ─────────────────────────────────
    pub tf_state_path: String,
    pub rds_instance_class: String,
    /// Custom domain for the public endpoint. Empty when none is configured.
    pub domain: String,
    pub concourse_public_ip: String,
    pub director_public_ip: String,
    pub nat_gateway_ip: String,
    pub vpc_id: String,
    pub public_subnet_id: String,
    pub private_subnet_id: String,
    pub atc_security_group_id: String,
    pub director_security_group_id: String,
    pub vms_security_group_id: String,

    // ── Certificate material ───────────────────────────────────────
    pub director_ca_cert: String,
    pub director_cert: String,
    pub director_key: String,
    pub concourse_ca_cert: String,
    pub concourse_cert: String,
    pub concourse_key: String,
    /// Set when the public endpoint uses operator-supplied TLS material.
    pub concourse_user_provided_cert: bool,

    // ── Workload broker credentials (issued by the director) ───────
    pub credhub_url: String,
    pub credhub_username: String,
    pub credhub_password: String,
    pub credhub_admin_client_secret: String,
    pub credhub_ca_cert: String,
}

impl Config {
    /// Deployment name for an operator project, e.g. `ciforge-happymeal`.
    pub fn deployment_name(project: &str) -> String {
        format!("{DEPLOYMENT_PREFIX}{project}")
    }

    /// Host the platform is reached on: the custom domain when one is
    /// configured, otherwise the provisioned public IP.
    pub fn public_host(&self) -> &str {
        if self.domain.is_empty() {
            &self.concourse_public_ip
        } else {
            &self.domain
        }
    }

    /// Whether the public endpoint is served with a certificate clients
    /// can verify without `--insecure`.
    pub fn has_trusted_certificate(&self) -> bool {
        !self.domain.is_empty() || self.concourse_user_provided_cert
    }

    /// True when the allow-list grants access from anywhere (or is unset).
    pub fn allows_everyone(&self) -> bool {
        self.allow_ips.is_empty() || self.allow_ips.iter().any(|c| c == UNRESTRICTED_CIDR)
    }

    /// Parse a record previously written with [`Config::to_json`].
    pub fn from_json(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }

    pub fn to_json(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deployment_name_is_prefixed() {
        assert_eq!(Config::deployment_name("happymeal"), "ciforge-happymeal");
    }

    #[test]
    fn public_host_prefers_domain() {
        let mut config = Config {
            concourse_public_ip: "77.77.77.77".to_string(),
            ..Default::default()
        };
        assert_eq!(config.public_host(), "77.77.77.77");

        config.domain = "ci.google.com".to_string();
        assert_eq!(config.public_host(), "ci.google.com");
    }

    #[test]
    fn trusted_certificate_rules() {
        let mut config = Config::default();
        assert!(!config.has_trusted_certificate());

        config.concourse_user_provided_cert = true;
        assert!(config.has_trusted_certificate());

        config.concourse_user_provided_cert = false;
        config.domain = "ci.example.com".to_string();
        assert!(config.has_trusted_certificate());
    }

    #[test]
    fn allows_everyone_for_default_and_empty() {
        let mut config = Config::default();
        assert!(config.allows_everyone());

        config.allow_ips = vec![UNRESTRICTED_CIDR.to_string()];
        assert!(config.allows_everyone());

        config.allow_ips = vec!["10.1.2.3/32".to_string()];
        assert!(!config.allows_everyone());
    }

    #[test]
    fn older_records_with_missing_fields_still_parse() {
        let json = br#"{"deployment":"ciforge-old","region":"eu-west-1"}"#;
        let config = Config::from_json(json).unwrap();
        assert_eq!(config.deployment, "ciforge-old");
        assert!(config.tags.is_empty());
        assert!(!config.concourse_user_provided_cert);
    }
}
