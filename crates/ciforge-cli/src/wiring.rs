//! Production collaborators behind the orchestrator.

use std::path::{Path, PathBuf};
use std::time::Duration;

use ciforge_certs::RunScopedIssuer;
use ciforge_core::{Config, Settings};
use ciforge_director::BoshDirectorFactory;
use ciforge_iaas::AwsProvider;
use ciforge_orchestrator::{Collaborators, HttpIpChecker, Orchestrator, TracingSink};
use ciforge_state::{ConfigStore, RedbConfigStore};
use ciforge_terraform::{AwsInputVarsFactory, TerraformCli};
use ciforge_workload::FlyClientFactory;
use tracing::debug;

/// Region used for a new deployment when none is requested.
pub const DEFAULT_REGION: &str = "eu-west-1";

/// Settings file, then environment, then `--state-dir`.
pub fn load_settings(path: &Path, state_dir: Option<PathBuf>) -> anyhow::Result<Settings> {
    let mut settings = Settings::load_or_default(path)?.with_env_overrides();
    if let Some(dir) = state_dir {
        settings.state_dir = dir;
    }
    debug!(state_dir = %settings.state_dir.display(), "settings loaded");
    Ok(settings)
}

/// The requested region, else the stored deployment's, else the default.
fn resolve_region(store: &dyn ConfigStore, requested: Option<&str>) -> anyhow::Result<String> {
    if let Some(region) = requested {
        return Ok(region.to_string());
    }
    if store.config_exists()? {
        let stored = store.load()?.region;
        if !stored.is_empty() {
            return Ok(stored);
        }
    }
    Ok(DEFAULT_REGION.to_string())
}

pub fn build_orchestrator(
    settings: &Settings,
    project: &str,
    region: Option<&str>,
) -> anyhow::Result<Orchestrator> {
    let deployment = Config::deployment_name(project);
    std::fs::create_dir_all(&settings.state_dir)?;
    let store = RedbConfigStore::open(&settings.store_path(), &deployment)?;
    let region = resolve_region(&store, region)?;
    debug!(%deployment, %region, "wiring collaborators");

    let binaries = &settings.binaries;
    let probe_timeout = Duration::from_secs(settings.network.probe_timeout_secs);

    let collaborators = Collaborators {
        store: Box::new(store),
        provider: Box::new(AwsProvider::new(&binaries.aws, &region)),
        input_vars: Box::new(AwsInputVarsFactory),
        infrastructure: Box::new(TerraformCli::new(
            &binaries.terraform,
            settings.terraform_dir(&deployment),
        )),
        issuer: Box::new(RunScopedIssuer::new()),
        director: Box::new(BoshDirectorFactory::new(&binaries.bosh)),
        workload: Box::new(FlyClientFactory::new(&binaries.fly, probe_timeout)),
        ip_checker: Box::new(HttpIpChecker::new(
            settings.network.ip_check_address.clone(),
            probe_timeout,
        )),
        events: Box::new(TracingSink),
    };

    Ok(Orchestrator::new(
        project,
        env!("CARGO_PKG_VERSION"),
        collaborators,
        Box::new(std::io::stdout()),
        Box::new(std::io::stderr()),
    ))
}
