//! Driving the `terraform` CLI.
//!
//! Each deployment gets its own working directory holding the embedded
//! definition (`main.tf`), the rendered `terraform.tfvars.json` and the
//! local state file. Every call restages the first two so the definition on
//! disk always matches the running binary.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use ciforge_core::ProvisionOutputs;
use tracing::{debug, info};

use crate::error::{TerraformError, TerraformResult};
use crate::input_vars::InputVars;
use crate::outputs::parse_outputs;

/// Local state file name inside the working directory.
pub const STATE_FILE: &str = "terraform.tfstate";

const DEFINITION_FILE: &str = "main.tf";
const VARS_FILE: &str = "terraform.tfvars.json";

/// Applies, destroys and reads back an infrastructure definition.
pub trait InfrastructureRunner {
    fn apply(&self, vars: &InputVars) -> TerraformResult<()>;

    fn build_outputs(&self, vars: &InputVars) -> TerraformResult<ProvisionOutputs>;

    fn destroy(&self, vars: &InputVars) -> TerraformResult<()>;
}

#[derive(Debug, Clone)]
pub struct TerraformCli {
    binary: PathBuf,
    work_dir: PathBuf,
}

impl TerraformCli {
    pub fn new(binary: impl Into<PathBuf>, work_dir: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            work_dir: work_dir.into(),
        }
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    fn stage(&self, vars: &InputVars) -> TerraformResult<()> {
        fs::create_dir_all(&self.work_dir)?;
        fs::write(self.work_dir.join(DEFINITION_FILE), vars.definition())?;
        fs::write(self.work_dir.join(VARS_FILE), vars.to_tfvars_json()?)?;
        debug!(dir = %self.work_dir.display(), "staged terraform definition");
        Ok(())
    }

    fn run(&self, args: &[&str]) -> TerraformResult<Vec<u8>> {
        let mut cmd = Command::new(&self.binary);
        cmd.args(args).current_dir(&self.work_dir);

        debug!("Running: {:?}", cmd);

        let output = cmd.output().map_err(|e| TerraformError::Exec {
            binary: self.binary.display().to_string(),
            reason: e.to_string(),
        })?;

        if !output.status.success() {
            let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
            combined.push_str(&String::from_utf8_lossy(&output.stderr));
            return Err(TerraformError::CommandFailed {
                command: args.first().copied().unwrap_or_default().to_string(),
                code: output.status.code().unwrap_or(-1),
                output: combined.trim().to_string(),
            });
        }
        Ok(output.stdout)
    }

    fn init(&self) -> TerraformResult<()> {
        self.run(&["init", "-input=false", "-no-color"])?;
        Ok(())
    }
}

impl InfrastructureRunner for TerraformCli {
    fn apply(&self, vars: &InputVars) -> TerraformResult<()> {
        self.stage(vars)?;
        self.init()?;
        info!(deployment = %vars.deployment(), iaas = %vars.iaas(), "applying infrastructure");
        self.run(&[
            "apply",
            "-auto-approve",
            "-input=false",
            "-no-color",
            &format!("-state={STATE_FILE}"),
        ])?;
        Ok(())
    }

    fn build_outputs(&self, vars: &InputVars) -> TerraformResult<ProvisionOutputs> {
        self.stage(vars)?;
        let stdout = self.run(&["output", "-json", &format!("-state={STATE_FILE}")])?;
        parse_outputs(&stdout)
    }

    fn destroy(&self, vars: &InputVars) -> TerraformResult<()> {
        self.stage(vars)?;
        self.init()?;
        info!(deployment = %vars.deployment(), "destroying infrastructure");
        self.run(&[
            "destroy",
            "-auto-approve",
            "-input=false",
            "-no-color",
            &format!("-state={STATE_FILE}"),
        ])?;
        Ok(())
    }
}
