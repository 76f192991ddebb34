//! The cloud capability surface.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{IaasError, IaasResult};

/// Supported infrastructure providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Iaas {
    Aws,
}

impl Iaas {
    pub fn as_str(&self) -> &'static str {
        match self {
            Iaas::Aws => "aws",
        }
    }
}

impl fmt::Display for Iaas {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Iaas {
    type Err = IaasError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "aws" => Ok(Iaas::Aws),
            other => Err(IaasError::Unsupported(other.to_string())),
        }
    }
}

/// A DNS zone a custom domain can be placed in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostedZone {
    /// Zone name without the trailing dot, e.g. `google.com`.
    pub name: String,
    /// Provider identifier of the zone, e.g. `ABC123`.
    pub id: String,
}

/// Everything the orchestrator may ask of a cloud account.
pub trait Provider {
    fn iaas(&self) -> Iaas;

    /// Region this provider was constructed for.
    fn region(&self) -> &str;

    /// Availability zone the deployment's subnets live in.
    fn zone(&self) -> String;

    /// Database instance class for an operator-facing size name, or `None`
    /// for an unknown size.
    fn db_type(&self, size: &str) -> Option<String>;

    /// Whether `ip` may reach the director through `security_group`.
    fn check_for_whitelisted_ip(&self, ip: &str, security_group: &str) -> IaasResult<bool>;

    /// Terminate every VM in the network and return their ids.
    fn delete_vms_in_vpc(&self, vpc_id: &str) -> IaasResult<Vec<String>>;

    /// The hosted zone whose name is the longest suffix of `domain`.
    fn find_longest_matching_hosted_zone(&self, domain: &str) -> IaasResult<Option<HostedZone>>;
}
