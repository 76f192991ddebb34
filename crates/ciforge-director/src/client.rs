//! The director as the orchestrator sees it.

use std::path::PathBuf;

use ciforge_core::{Config, DirectorArtifacts, ProvisionOutputs};
use tracing::info;

use crate::credentials::DirectorCredentials;
use crate::error::DirectorResult;
use crate::manifest::render_manifest;
use crate::runner::DirectorRunner;

/// One director deployment or deletion, followed by exactly one cleanup.
pub trait DirectorClient {
    /// Create or converge the director.
    ///
    /// `prior` carries the stored state and credentials of an existing
    /// director; `None` means a fresh create. With `detach` the command is
    /// started and not waited for, and the returned state is the prior one.
    fn deploy(
        &mut self,
        prior: Option<DirectorArtifacts>,
        detach: bool,
    ) -> DirectorResult<DirectorArtifacts>;

    /// Delete the director described by `prior`.
    fn delete(&mut self, prior: DirectorArtifacts) -> DirectorResult<()>;

    /// Release local resources. Always called once, whatever happened before.
    fn cleanup(&mut self) -> DirectorResult<()>;
}

/// Builds a director client for a deployment once its infrastructure exists.
pub trait DirectorFactory {
    fn build(
        &self,
        config: &Config,
        outputs: &ProvisionOutputs,
    ) -> DirectorResult<Box<dyn DirectorClient>>;
}

/// Builds [`BoshDirector`]s driving the given binary.
#[derive(Debug, Clone)]
pub struct BoshDirectorFactory {
    binary: PathBuf,
}

impl BoshDirectorFactory {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl DirectorFactory for BoshDirectorFactory {
    fn build(
        &self,
        config: &Config,
        outputs: &ProvisionOutputs,
    ) -> DirectorResult<Box<dyn DirectorClient>> {
        Ok(Box::new(BoshDirector {
            binary: self.binary.clone(),
            config: config.clone(),
            outputs: outputs.clone(),
            runner: None,
        }))
    }
}

/// Renders the manifest and drives a [`DirectorRunner`].
#[derive(Debug)]
pub struct BoshDirector {
    binary: PathBuf,
    config: Config,
    outputs: ProvisionOutputs,
    runner: Option<DirectorRunner>,
}

impl BoshDirector {
    fn stage(
        &mut self,
        creds: &DirectorCredentials,
        prior_state: Option<&[u8]>,
    ) -> DirectorResult<&mut DirectorRunner> {
        let manifest = render_manifest(&self.config, &self.outputs, creds)?;
        let runner = DirectorRunner::stage(
            &self.binary,
            &manifest,
            prior_state,
            self.config.private_key.as_bytes(),
        )?;
        Ok(self.runner.insert(runner))
    }
}

impl DirectorClient for BoshDirector {
    fn deploy(
        &mut self,
        prior: Option<DirectorArtifacts>,
        detach: bool,
    ) -> DirectorResult<DirectorArtifacts> {
        let creds = DirectorCredentials::reuse_or_generate(prior.as_ref().map(|p| p.creds.as_slice()))?;
        let prior_state = prior.map(|p| p.state).filter(|s| !s.is_empty());

        info!(
            deployment = %self.config.deployment,
            converge = prior_state.is_some(),
            detach,
            "deploying director"
        );

        let runner = self.stage(&creds, prior_state.as_deref())?;
        let state = if detach {
            runner.deploy_detached()?;
            prior_state.unwrap_or_default()
        } else {
            runner.deploy()?
        };

        Ok(DirectorArtifacts {
            state,
            creds: creds.to_bytes()?,
        })
    }

    fn delete(&mut self, prior: DirectorArtifacts) -> DirectorResult<()> {
        let creds = DirectorCredentials::reuse_or_generate(Some(&prior.creds))?;
        info!(deployment = %self.config.deployment, "deleting director");
        let runner = self.stage(&creds, Some(&prior.state))?;
        runner.delete()
    }

    fn cleanup(&mut self) -> DirectorResult<()> {
        match self.runner.as_mut() {
            Some(runner) => runner.cleanup(),
            None => Ok(()),
        }
    }
}
