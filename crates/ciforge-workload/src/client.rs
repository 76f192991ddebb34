//! The running platform as the orchestrator sees it.

use std::io::Write;
use std::path::PathBuf;
use std::process::Command;
use std::time::Duration;

use ciforge_core::Config;
use tracing::{debug, info, warn};

use crate::error::{WorkloadError, WorkloadResult};
use crate::pipeline::{DEFAULT_PIPELINE_NAME, render_default_pipeline};
use crate::probe::get_blocking;

/// Path answered by a running platform without authentication.
const INFO_PATH: &str = "/api/v1/info";

/// Printed by `fly` when its version differs from the platform's.
const VERSION_DISCREPANCY_MARKER: &str = "out of sync with the target";

pub trait WorkloadClient {
    /// Whether the platform currently answers HTTP requests.
    fn can_connect(&self) -> WorkloadResult<bool>;

    /// Set and unpause the default pipeline.
    fn set_default_pipeline(&self, config: &Config, allow_version_discrepancy: bool)
    -> WorkloadResult<()>;
}

/// Builds a client for the platform described by a deployment config.
pub trait WorkloadFactory {
    fn build(&self, config: &Config) -> WorkloadResult<Box<dyn WorkloadClient>>;
}

/// `fly` arguments logging in to the deployment, without the binary name.
pub fn login_args(config: &Config) -> Vec<String> {
    let mut args = vec![
        "--target".to_string(),
        config.project.clone(),
        "login".to_string(),
    ];
    if !config.has_trusted_certificate() {
        args.push("--insecure".to_string());
    }
    args.extend([
        "--concourse-url".to_string(),
        format!("https://{}", config.public_host()),
        "--username".to_string(),
        config.concourse_username.clone(),
        "--password".to_string(),
        config.concourse_password.clone(),
    ]);
    args
}

/// The login command an operator can paste.
pub fn login_hint(config: &Config) -> String {
    format!("fly {}", login_args(config).join(" "))
}

#[derive(Debug, Clone)]
pub struct FlyClientFactory {
    binary: PathBuf,
    probe_timeout: Duration,
}

impl FlyClientFactory {
    pub fn new(binary: impl Into<PathBuf>, probe_timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            probe_timeout,
        }
    }
}

impl WorkloadFactory for FlyClientFactory {
    fn build(&self, config: &Config) -> WorkloadResult<Box<dyn WorkloadClient>> {
        Ok(Box::new(FlyClient {
            binary: self.binary.clone(),
            target: config.project.clone(),
            host: config.public_host().to_string(),
            login_args: login_args(config),
            probe_timeout: self.probe_timeout,
        }))
    }
}

/// Drives the `fly` CLI against one platform.
#[derive(Debug, Clone)]
pub struct FlyClient {
    binary: PathBuf,
    target: String,
    host: String,
    login_args: Vec<String>,
    probe_timeout: Duration,
}

impl FlyClient {
    fn run(&self, args: &[String]) -> WorkloadResult<String> {
        let mut cmd = Command::new(&self.binary);
        cmd.args(args);

        // Arguments include the admin password.
        debug!(subcommand = args.get(2).map(String::as_str), "Running fly");

        let output = cmd.output().map_err(|e| WorkloadError::Exec {
            binary: self.binary.display().to_string(),
            reason: e.to_string(),
        })?;

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        if !output.status.success() {
            return Err(WorkloadError::CommandFailed {
                command: args.get(2).cloned().unwrap_or_default(),
                code: output.status.code().unwrap_or(-1),
                output: combined.trim().to_string(),
            });
        }
        Ok(combined)
    }

    fn targeted(&self, subcommand: &str, rest: &[&str]) -> Vec<String> {
        let mut args = vec![
            "--target".to_string(),
            self.target.clone(),
            subcommand.to_string(),
        ];
        args.extend(rest.iter().map(|s| s.to_string()));
        args
    }
}

impl WorkloadClient for FlyClient {
    fn can_connect(&self) -> WorkloadResult<bool> {
        let address = format!("{}:80", self.host);
        match get_blocking(&address, INFO_PATH, self.probe_timeout) {
            Ok(resp) => {
                debug!(%address, status = resp.status, "platform reachable");
                Ok(true)
            }
            Err(e @ (WorkloadError::Http { .. } | WorkloadError::Timeout { .. })) => {
                debug!(%address, error = %e, "platform unreachable");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    fn set_default_pipeline(
        &self,
        config: &Config,
        allow_version_discrepancy: bool,
    ) -> WorkloadResult<()> {
        let login_output = self.run(&self.login_args)?;
        if let Some(line) = login_output
            .lines()
            .find(|l| l.contains(VERSION_DISCREPANCY_MARKER))
        {
            if !allow_version_discrepancy {
                return Err(WorkloadError::VersionDiscrepancy(line.trim().to_string()));
            }
            warn!(target_name = %self.target, "{}", line.trim());
        }

        let mut file = tempfile::Builder::new()
            .prefix("ciforge-pipeline")
            .suffix(".yml")
            .tempfile()?;
        file.write_all(&render_default_pipeline(config)?)?;
        file.flush()?;
        let path = file.path().display().to_string();

        self.run(&self.targeted(
            "set-pipeline",
            &["--non-interactive", "--pipeline", DEFAULT_PIPELINE_NAME, "--config", &path],
        ))?;
        self.run(&self.targeted("unpause-pipeline", &["--pipeline", DEFAULT_PIPELINE_NAME]))?;

        info!(target_name = %self.target, pipeline = DEFAULT_PIPELINE_NAME, "default pipeline set");
        Ok(())
    }
}
