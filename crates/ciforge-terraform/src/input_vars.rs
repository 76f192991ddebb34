//! Provisioner input variables.
//!
//! The factory is a pure function of the deployment config and the provider:
//! it copies the fields the definition needs and fills empty optional fields
//! from provider capabilities or fixed network defaults. Identical inputs
//! always produce byte-identical variable files.

use ciforge_core::Config;
use ciforge_core::request::DEFAULT_DB_SIZE;
use ciforge_iaas::{Iaas, Provider};
use serde::Serialize;

use crate::error::{TerraformError, TerraformResult};

pub const DEFAULT_NETWORK_CIDR: &str = "10.0.0.0/16";
pub const DEFAULT_PUBLIC_CIDR: &str = "10.0.0.0/24";
pub const DEFAULT_PRIVATE_CIDR: &str = "10.0.1.0/24";
pub const DEFAULT_DATABASE_NAME: &str = "bosh";
pub const DEFAULT_ALLOW_IPS: &str = "0.0.0.0/0";

const AWS_DEFINITION: &str = include_str!("../assets/aws.tf");

/// Variables for one provisioner run, per cloud.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputVars {
    Aws(AwsInputVars),
}

impl InputVars {
    pub fn iaas(&self) -> Iaas {
        match self {
            InputVars::Aws(_) => Iaas::Aws,
        }
    }

    pub fn deployment(&self) -> &str {
        match self {
            InputVars::Aws(vars) => &vars.deployment,
        }
    }

    /// The infrastructure definition these variables are applied to.
    pub fn definition(&self) -> &'static str {
        match self {
            InputVars::Aws(_) => AWS_DEFINITION,
        }
    }

    /// Contents of `terraform.tfvars.json`.
    pub fn to_tfvars_json(&self) -> TerraformResult<Vec<u8>> {
        let result = match self {
            InputVars::Aws(vars) => serde_json::to_vec_pretty(vars),
        };
        result.map_err(|e| TerraformError::Serialize(e.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AwsInputVars {
    pub deployment: String,
    pub project: String,
    pub region: String,
    pub availability_zone: String,
    /// Quoted, comma-joined CIDR list, e.g. `"10.1.2.3/32", "10.0.0.0/8"`.
    pub allow_ips: String,
    pub source_access_ip: String,
    pub network_cidr: String,
    pub public_cidr: String,
    pub private_cidr: String,
    pub rds_instance_class: String,
    pub rds_username: String,
    pub rds_password: String,
    pub rds_default_database_name: String,
}

/// Builds provisioner input variables from a deployment config.
pub trait InputVarsFactory {
    fn new_input_vars(&self, config: &Config, provider: &dyn Provider) -> TerraformResult<InputVars>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AwsInputVarsFactory;

impl InputVarsFactory for AwsInputVarsFactory {
    fn new_input_vars(&self, config: &Config, provider: &dyn Provider) -> TerraformResult<InputVars> {
        let rds_instance_class = if config.rds_instance_class.is_empty() {
            provider
                .db_type(DEFAULT_DB_SIZE)
                .ok_or_else(|| TerraformError::UnknownDbSize(DEFAULT_DB_SIZE.to_string()))?
        } else {
            config.rds_instance_class.clone()
        };

        Ok(InputVars::Aws(AwsInputVars {
            deployment: config.deployment.clone(),
            project: config.project.clone(),
            region: or_default(&config.region, provider.region()),
            availability_zone: or_default(&config.availability_zone, &provider.zone()),
            allow_ips: render_allow_ips(&config.allow_ips),
            source_access_ip: config.source_access_ip.clone(),
            network_cidr: or_default(&config.network_cidr, DEFAULT_NETWORK_CIDR),
            public_cidr: or_default(&config.public_cidr, DEFAULT_PUBLIC_CIDR),
            private_cidr: or_default(&config.private_cidr, DEFAULT_PRIVATE_CIDR),
            rds_instance_class,
            rds_username: config.rds_username.clone(),
            rds_password: config.rds_password.clone(),
            rds_default_database_name: or_default(
                &config.rds_default_database_name,
                DEFAULT_DATABASE_NAME,
            ),
        }))
    }
}

fn or_default(value: &str, default: &str) -> String {
    if value.is_empty() {
        default.to_string()
    } else {
        value.to_string()
    }
}

/// Render CIDRs in the definition's quoted list form.
pub fn render_allow_ips(cidrs: &[String]) -> String {
    if cidrs.is_empty() {
        return format!("\"{DEFAULT_ALLOW_IPS}\"");
    }
    cidrs
        .iter()
        .map(|c| format!("\"{c}\""))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use ciforge_iaas::{HostedZone, IaasResult};

    struct StubProvider;

    impl Provider for StubProvider {
        fn iaas(&self) -> Iaas {
            Iaas::Aws
        }
        fn region(&self) -> &str {
            "eu-west-1"
        }
        fn zone(&self) -> String {
            "eu-west-1a".to_string()
        }
        fn db_type(&self, size: &str) -> Option<String> {
            (size == "small").then(|| "db.t2.small".to_string())
        }
        fn check_for_whitelisted_ip(&self, _ip: &str, _sg: &str) -> IaasResult<bool> {
            Ok(true)
        }
        fn delete_vms_in_vpc(&self, _vpc_id: &str) -> IaasResult<Vec<String>> {
            Ok(Vec::new())
        }
        fn find_longest_matching_hosted_zone(&self, _d: &str) -> IaasResult<Option<HostedZone>> {
            Ok(None)
        }
    }

    fn config() -> Config {
        Config {
            deployment: "ciforge-happymeal".to_string(),
            project: "happymeal".to_string(),
            region: "eu-west-1".to_string(),
            allow_ips: vec!["10.1.2.3/32".to_string(), "10.0.0.0/8".to_string()],
            rds_instance_class: "db.t2.medium".to_string(),
            rds_username: "admin".to_string(),
            rds_password: "s3cret".to_string(),
            ..Default::default()
        }
    }

    fn aws(vars: InputVars) -> AwsInputVars {
        match vars {
            InputVars::Aws(v) => v,
        }
    }

    #[test]
    fn copies_config_fields() {
        let vars = aws(AwsInputVarsFactory.new_input_vars(&config(), &StubProvider).unwrap());
        assert_eq!(vars.deployment, "ciforge-happymeal");
        assert_eq!(vars.rds_instance_class, "db.t2.medium");
        assert_eq!(vars.allow_ips, r#""10.1.2.3/32", "10.0.0.0/8""#);
        assert_eq!(vars.rds_password, "s3cret");
    }

    #[test]
    fn fills_empty_fields_with_defaults() {
        let config = Config {
            deployment: "ciforge-x".to_string(),
            ..Default::default()
        };
        let vars = aws(AwsInputVarsFactory.new_input_vars(&config, &StubProvider).unwrap());
        assert_eq!(vars.region, "eu-west-1");
        assert_eq!(vars.availability_zone, "eu-west-1a");
        assert_eq!(vars.rds_instance_class, "db.t2.small");
        assert_eq!(vars.network_cidr, DEFAULT_NETWORK_CIDR);
        assert_eq!(vars.public_cidr, DEFAULT_PUBLIC_CIDR);
        assert_eq!(vars.private_cidr, DEFAULT_PRIVATE_CIDR);
        assert_eq!(vars.rds_default_database_name, "bosh");
        assert_eq!(vars.allow_ips, "\"0.0.0.0/0\"");
    }

    #[test]
    fn derivation_is_deterministic() {
        let a = AwsInputVarsFactory.new_input_vars(&config(), &StubProvider).unwrap();
        let b = AwsInputVarsFactory.new_input_vars(&config(), &StubProvider).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.to_tfvars_json().unwrap(), b.to_tfvars_json().unwrap());
    }

    #[test]
    fn tfvars_json_uses_variable_names() {
        let vars = AwsInputVarsFactory.new_input_vars(&config(), &StubProvider).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&vars.to_tfvars_json().unwrap()).unwrap();
        assert_eq!(json["deployment"], "ciforge-happymeal");
        assert_eq!(json["rds_instance_class"], "db.t2.medium");
        assert_eq!(vars.deployment(), "ciforge-happymeal");
        assert_eq!(vars.iaas(), Iaas::Aws);
    }

    #[test]
    fn definition_declares_every_variable() {
        let vars = AwsInputVarsFactory.new_input_vars(&config(), &StubProvider).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&vars.to_tfvars_json().unwrap()).unwrap();
        for key in json.as_object().unwrap().keys() {
            assert!(
                vars.definition().contains(&format!("variable \"{key}\"")),
                "missing variable {key}"
            );
        }
    }
}
