//! Operator-facing text written at the end of a workflow.

use std::fmt;

use ciforge_core::Config;
use ciforge_workload::client::login_hint;
use serde::Serialize;

pub const PREVIOUS_CONFIG_NOTICE: &str = "USING PREVIOUS DEPLOYMENT CONFIG";
pub const DEPLOY_BANNER: &str = "DEPLOY SUCCESSFUL";
pub const DESTROY_BANNER: &str = "DESTROY SUCCESSFUL";
pub const LOCAL_ACCESS_WARNING: &str = "WARNING: allowing access from local machine";

pub fn dns_advisory(domain: &str, zone_name: &str, zone_id: &str) -> String {
    format!("WARNING: adding record {domain} to DNS zone {zone_name} with name {zone_id}")
}

pub fn not_whitelisted_warning(ip: &str) -> String {
    format!("WARNING: local IP address {ip} is not whitelisted for director access")
}

/// Success banner followed by the login command for the platform.
pub fn deploy_summary(config: &Config) -> String {
    format!(
        "{DEPLOY_BANNER}. Log in with:\n{}\n",
        login_hint(config)
    )
}

/// What `ciforge info` reports about a deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeploymentInfo {
    pub project: String,
    pub deployment: String,
    pub region: String,
    pub url: String,
    pub director_public_ip: String,
    pub username: String,
    pub password: String,
    pub credhub_url: String,
    pub local_ip: String,
    pub local_ip_whitelisted: bool,
}

impl DeploymentInfo {
    pub fn new(config: &Config, local_ip: String, local_ip_whitelisted: bool) -> Self {
        Self {
            project: config.project.clone(),
            deployment: config.deployment.clone(),
            region: config.region.clone(),
            url: format!("https://{}", config.public_host()),
            director_public_ip: config.director_public_ip.clone(),
            username: config.concourse_username.clone(),
            password: config.concourse_password.clone(),
            credhub_url: config.credhub_url.clone(),
            local_ip,
            local_ip_whitelisted,
        }
    }
}

impl fmt::Display for DeploymentInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Deployment: {} ({})", self.deployment, self.region)?;
        writeln!(f, "URL:        {}", self.url)?;
        writeln!(f, "Username:   {}", self.username)?;
        writeln!(f, "Password:   {}", self.password)?;
        writeln!(f, "Director:   {}", self.director_public_ip)?;
        if !self.credhub_url.is_empty() {
            writeln!(f, "CredHub:    {}", self.credhub_url)?;
        }
        let access = if self.local_ip_whitelisted {
            "whitelisted"
        } else {
            "not whitelisted"
        };
        writeln!(f, "Local IP:   {} ({access})", self.local_ip)
    }
}
