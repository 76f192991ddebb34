//! AWS capabilities via the `aws` CLI.
//!
//! Every call runs `aws <service> <operation> --region <region> --output json`
//! and decodes the JSON document it prints. Credentials come from the
//! operator's usual AWS environment.

use std::path::PathBuf;
use std::process::Command;

use serde::Deserialize;
use tracing::{debug, info};

use crate::cidr;
use crate::error::{IaasError, IaasResult};
use crate::provider::{HostedZone, Iaas, Provider};
use crate::zones::longest_matching_zone;

/// Operator size name → RDS instance class.
const DB_SIZES: &[(&str, &str)] = &[
    ("small", "db.t2.small"),
    ("medium", "db.t2.medium"),
    ("large", "db.m4.large"),
    ("xlarge", "db.m4.xlarge"),
    ("2xlarge", "db.m4.2xlarge"),
    ("4xlarge", "db.m4.4xlarge"),
];

#[derive(Debug, Clone)]
pub struct AwsProvider {
    binary: PathBuf,
    region: String,
}

impl AwsProvider {
    pub fn new(binary: impl Into<PathBuf>, region: &str) -> Self {
        Self {
            binary: binary.into(),
            region: region.to_string(),
        }
    }

    fn run(&self, args: &[&str]) -> IaasResult<Vec<u8>> {
        let mut cmd = Command::new(&self.binary);
        cmd.args(args)
            .arg("--region")
            .arg(&self.region)
            .arg("--output")
            .arg("json");

        debug!("Running: {:?}", cmd);

        let output = cmd.output().map_err(|e| IaasError::Exec {
            binary: self.binary.display().to_string(),
            reason: e.to_string(),
        })?;

        if !output.status.success() {
            return Err(IaasError::CommandFailed {
                command: format!("aws {}", args.join(" ")),
                code: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(output.stdout)
    }

    fn run_json<T: for<'de> Deserialize<'de>>(&self, args: &[&str]) -> IaasResult<T> {
        let stdout = self.run(args)?;
        serde_json::from_slice(&stdout).map_err(|e| IaasError::Parse {
            command: format!("aws {}", args.join(" ")),
            reason: e.to_string(),
        })
    }
}

impl Provider for AwsProvider {
    fn iaas(&self) -> Iaas {
        Iaas::Aws
    }

    fn region(&self) -> &str {
        &self.region
    }

    fn zone(&self) -> String {
        format!("{}a", self.region)
    }

    fn db_type(&self, size: &str) -> Option<String> {
        DB_SIZES
            .iter()
            .find(|(name, _)| *name == size)
            .map(|(_, class)| class.to_string())
    }

    fn check_for_whitelisted_ip(&self, ip: &str, security_group: &str) -> IaasResult<bool> {
        let groups: DescribeSecurityGroups = self.run_json(&[
            "ec2",
            "describe-security-groups",
            "--group-ids",
            security_group,
        ])?;
        Ok(groups.allows(ip))
    }

    fn delete_vms_in_vpc(&self, vpc_id: &str) -> IaasResult<Vec<String>> {
        let filter = format!("Name=vpc-id,Values={vpc_id}");
        let instances: DescribeInstances =
            self.run_json(&["ec2", "describe-instances", "--filters", &filter])?;
        let ids = instances.live_instance_ids();
        if ids.is_empty() {
            debug!(%vpc_id, "no instances to terminate");
            return Ok(ids);
        }

        let mut args = vec!["ec2", "terminate-instances", "--instance-ids"];
        args.extend(ids.iter().map(String::as_str));
        self.run(&args)?;
        info!(%vpc_id, count = ids.len(), "terminated instances");
        Ok(ids)
    }

    fn find_longest_matching_hosted_zone(&self, domain: &str) -> IaasResult<Option<HostedZone>> {
        let zones: ListHostedZones = self.run_json(&["route53", "list-hosted-zones"])?;
        Ok(longest_matching_zone(
            domain,
            zones
                .hosted_zones
                .iter()
                .map(|z| (z.name.as_str(), z.id.as_str())),
        ))
    }
}

// ── aws CLI documents ──────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeSecurityGroups {
    #[serde(default)]
    security_groups: Vec<SecurityGroup>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SecurityGroup {
    #[serde(default)]
    ip_permissions: Vec<IpPermission>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct IpPermission {
    #[serde(default)]
    ip_ranges: Vec<IpRange>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct IpRange {
    cidr_ip: String,
}

impl DescribeSecurityGroups {
    fn allows(&self, ip: &str) -> bool {
        self.security_groups
            .iter()
            .flat_map(|g| &g.ip_permissions)
            .flat_map(|p| &p.ip_ranges)
            .any(|r| cidr::contains(&r.cidr_ip, ip))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeInstances {
    #[serde(default)]
    reservations: Vec<Reservation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Reservation {
    #[serde(default)]
    instances: Vec<Instance>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Instance {
    instance_id: String,
    state: Option<InstanceState>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InstanceState {
    name: String,
}

impl DescribeInstances {
    fn live_instance_ids(&self) -> Vec<String> {
        self.reservations
            .iter()
            .flat_map(|r| &r.instances)
            .filter(|i| {
                i.state
                    .as_ref()
                    .is_none_or(|s| s.name != "terminated" && s.name != "shutting-down")
            })
            .map(|i| i.instance_id.clone())
            .collect()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ListHostedZones {
    #[serde(default)]
    hosted_zones: Vec<ZoneEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ZoneEntry {
    id: String,
    name: String,
}
