use ciforge_core::request::DEFAULT_DB_SIZE;
use ciforge_core::{DeployRequest, Settings};
use clap::Args;

use crate::wiring;

#[derive(Args)]
pub struct DeployArgs {
    /// Project name; the deployment is called ciforge-<project>
    pub project: String,
    /// AWS region (fixed once the deployment exists)
    #[arg(long)]
    pub region: Option<String>,
    /// Comma-separated CIDR blocks allowed to reach the platform
    #[arg(long)]
    pub allow_ips: Option<String>,
    /// Database size: small, medium, large, xlarge, 2xlarge or 4xlarge
    #[arg(long)]
    pub db_size: Option<String>,
    /// Custom domain for the platform's public endpoint
    #[arg(long)]
    pub domain: Option<String>,
    /// PEM certificate for the public endpoint
    #[arg(long, requires = "tls_key")]
    pub tls_cert: Option<String>,
    /// PEM private key for --tls-cert
    #[arg(long, requires = "tls_cert")]
    pub tls_key: Option<String>,
    /// Update a running platform without blocking on the director
    #[arg(long)]
    pub self_update: bool,
    /// Tag applied to the deployment, as key=value. Repeatable.
    #[arg(long = "add-tag", value_parser = parse_tag)]
    pub tags: Vec<String>,
}

impl DeployArgs {
    pub fn to_request(&self) -> DeployRequest {
        DeployRequest {
            allow_ips: self.allow_ips.clone(),
            db_size: self
                .db_size
                .clone()
                .unwrap_or_else(|| DEFAULT_DB_SIZE.to_string()),
            db_size_is_set: self.db_size.is_some(),
            region: self.region.clone(),
            domain: self.domain.clone(),
            self_update: self.self_update,
            tls_cert: self.tls_cert.clone(),
            tls_key: self.tls_key.clone(),
            tags: self.tags.clone(),
        }
    }
}

fn parse_tag(raw: &str) -> Result<String, String> {
    match raw.split_once('=') {
        Some((key, _)) if !key.is_empty() => Ok(raw.to_string()),
        _ => Err(format!("tag {raw:?} must look like key=value")),
    }
}

pub fn run(settings: &Settings, args: DeployArgs) -> anyhow::Result<()> {
    let request = args.to_request();
    let mut orchestrator =
        wiring::build_orchestrator(settings, &args.project, request.region.as_deref())?;
    orchestrator.deploy(&request)?;
    Ok(())
}
