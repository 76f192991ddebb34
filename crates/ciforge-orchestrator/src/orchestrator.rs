//! Deploy, destroy and info workflows for one named deployment.
//!
//! Each step blocks on its collaborator and a failure stops the workflow
//! where it happened. Two commits per deploy (after provisioning and after
//! the director and workload steps) keep an interrupted run resumable.

use std::io::Write;

use ciforge_certs::CertificateIssuer;
use ciforge_core::config::UNRESTRICTED_CIDR;
use ciforge_core::secrets::generate_password;
use ciforge_core::{
    CertPurpose, Config, DIRECTOR_CREDS_ASSET, DIRECTOR_INTERNAL_IP, DIRECTOR_STATE_ASSET,
    DeployRequest, DirectorArtifacts, ProvisionOutputs, RequestError,
};
use ciforge_director::credentials::CREDHUB_CLI_USER;
use ciforge_director::{DirectorClient, DirectorCredentials, DirectorFactory};
use ciforge_iaas::Provider;
use ciforge_state::ConfigStore;
use ciforge_terraform::input_vars::{
    DEFAULT_DATABASE_NAME, DEFAULT_NETWORK_CIDR, DEFAULT_PRIVATE_CIDR, DEFAULT_PUBLIC_CIDR,
};
use ciforge_terraform::{InfrastructureRunner, InputVars, InputVarsFactory, STATE_FILE};
use ciforge_workload::{WorkloadClient, WorkloadFactory};
use tracing::{debug, info, warn};

use crate::error::{OrchestratorError, OrchestratorResult};
use crate::events::{CommitStage, DeployEvent, EventSink};
use crate::policy::DirectorPolicy;
use crate::source_ip::IpChecker;
use crate::summary::{
    DESTROY_BANNER, DeploymentInfo, LOCAL_ACCESS_WARNING, PREVIOUS_CONFIG_NOTICE, deploy_summary,
    dns_advisory, not_whitelisted_warning,
};

/// Username of generated admin accounts on a fresh deployment.
const ADMIN_USERNAME: &str = "admin";

/// Tag recording which ciforge release last converged the deployment.
const VERSION_TAG_KEY: &str = "ciforge-version";

/// Every external system a workflow touches.
pub struct Collaborators {
    /// Scoped to the deployment being orchestrated.
    pub store: Box<dyn ConfigStore>,
    pub provider: Box<dyn Provider>,
    pub input_vars: Box<dyn InputVarsFactory>,
    pub infrastructure: Box<dyn InfrastructureRunner>,
    pub issuer: Box<dyn CertificateIssuer>,
    pub director: Box<dyn DirectorFactory>,
    pub workload: Box<dyn WorkloadFactory>,
    pub ip_checker: Box<dyn IpChecker>,
    pub events: Box<dyn EventSink>,
}

pub struct Orchestrator {
    project: String,
    deployment: String,
    version: String,
    collaborators: Collaborators,
    /// Progress and success text.
    stdout: Box<dyn Write>,
    /// Warnings.
    stderr: Box<dyn Write>,
}

impl Orchestrator {
    pub fn new(
        project: &str,
        version: &str,
        collaborators: Collaborators,
        stdout: Box<dyn Write>,
        stderr: Box<dyn Write>,
    ) -> Self {
        Self {
            project: project.to_string(),
            deployment: Config::deployment_name(project),
            version: version.to_string(),
            collaborators,
            stdout,
            stderr,
        }
    }

    pub fn deployment(&self) -> &str {
        &self.deployment
    }

    fn emit(&self, event: DeployEvent) {
        self.collaborators.events.emit(event);
    }

    fn warn_operator(&mut self, message: &str) -> OrchestratorResult<()> {
        writeln!(self.stderr, "{message}")?;
        Ok(())
    }

    // ── Deploy ─────────────────────────────────────────────────────

    /// Create the deployment, or converge an existing one with `request`.
    pub fn deploy(&mut self, request: &DeployRequest) -> OrchestratorResult<()> {
        info!(deployment = %self.deployment, self_update = request.self_update, "deploy started");

        let mut config = self.load_or_init(request)?;
        self.apply_request(&mut config, request)?;

        let vars = self.derive_input_vars(&config)?;
        self.collaborators.infrastructure.apply(&vars)?;
        self.emit(DeployEvent::InfrastructureApplied);
        let outputs = self.extract_outputs(&vars)?;

        copy_outputs(&mut config, &outputs);
        self.commit(&config, CommitStage::Provisioned)?;

        self.issue_certificates(&mut config, &outputs, request)?;
        self.advise_dns(&config)?;

        config.tags = request.tags.clone();
        config.tags.push(format!("{VERSION_TAG_KEY}={}", self.version));
        config.version = self.version.clone();

        let artifacts = self.converge_director(&config, &outputs, request)?;
        harvest_credhub(&mut config, &artifacts)?;
        self.commit(&config, CommitStage::Converged)?;

        write!(self.stdout, "{}", deploy_summary(&config))?;
        info!(deployment = %self.deployment, "deploy finished");
        Ok(())
    }

    /// Load the stored config, or build a fresh one. Rejects a region change
    /// before anything is mutated.
    fn load_or_init(&mut self, request: &DeployRequest) -> OrchestratorResult<Config> {
        let exists = self.collaborators.store.config_exists()?;
        self.emit(DeployEvent::ConfigExistenceChecked { exists });

        request.validate()?;
        if request.db_size_is_set {
            self.db_type(&request.db_size)?;
        }

        if !exists {
            let config = self.initial_config(request)?;
            self.emit(DeployEvent::ConfigInitialized);
            return Ok(config);
        }

        let config = self.collaborators.store.load()?;
        self.emit(DeployEvent::ConfigLoaded);
        writeln!(self.stdout, "{PREVIOUS_CONFIG_NOTICE}")?;

        if let Some(requested) = &request.region {
            if *requested != config.region {
                return Err(OrchestratorError::RegionMismatch {
                    existing: config.region.clone(),
                    requested: requested.clone(),
                });
            }
        }
        Ok(config)
    }

    fn db_type(&self, size: &str) -> OrchestratorResult<String> {
        self.collaborators
            .provider
            .db_type(size)
            .ok_or_else(|| RequestError::UnknownDbSize(size.to_string()).into())
    }

    fn initial_config(&self, request: &DeployRequest) -> OrchestratorResult<Config> {
        let provider = &self.collaborators.provider;
        Ok(Config {
            version: self.version.clone(),
            deployment: self.deployment.clone(),
            project: self.project.clone(),
            region: request
                .region
                .clone()
                .unwrap_or_else(|| provider.region().to_string()),
            iaas: provider.iaas().to_string(),
            availability_zone: provider.zone(),
            allow_ips: vec![UNRESTRICTED_CIDR.to_string()],
            network_cidr: DEFAULT_NETWORK_CIDR.to_string(),
            public_cidr: DEFAULT_PUBLIC_CIDR.to_string(),
            private_cidr: DEFAULT_PRIVATE_CIDR.to_string(),
            director_username: ADMIN_USERNAME.to_string(),
            director_password: generate_password()?,
            rds_username: format!("{ADMIN_USERNAME}{}", generate_password()?),
            rds_password: generate_password()?,
            rds_default_database_name: DEFAULT_DATABASE_NAME.to_string(),
            concourse_username: ADMIN_USERNAME.to_string(),
            concourse_password: generate_password()?,
            tf_state_path: STATE_FILE.to_string(),
            rds_instance_class: self.db_type(&request.db_size)?,
            ..Default::default()
        })
    }

    /// Fold the request's overrides into the config.
    fn apply_request(&mut self, config: &mut Config, request: &DeployRequest) -> OrchestratorResult<()> {
        if let Some(allow_ips) = request.parsed_allow_ips()? {
            config.allow_ips = allow_ips;
        }

        let source_ip = self.collaborators.ip_checker.current_ip()?;
        debug!(%source_ip, "granting director access to local machine");
        config.source_access_ip = source_ip;
        if request.allow_ips.is_none() && config.allows_everyone() {
            self.warn_operator(LOCAL_ACCESS_WARNING)?;
        }

        if request.db_size_is_set {
            config.rds_instance_class = self.db_type(&request.db_size)?;
        }
        if let Some(domain) = &request.domain {
            config.domain = domain.clone();
        }
        Ok(())
    }

    fn derive_input_vars(&self, config: &Config) -> OrchestratorResult<InputVars> {
        let vars = self
            .collaborators
            .input_vars
            .new_input_vars(config, self.collaborators.provider.as_ref())?;
        self.emit(DeployEvent::InputVarsDerived);
        Ok(vars)
    }

    fn extract_outputs(&self, vars: &InputVars) -> OrchestratorResult<ProvisionOutputs> {
        let outputs = self.collaborators.infrastructure.build_outputs(vars)?;
        self.emit(DeployEvent::OutputsExtracted);
        Ok(outputs)
    }

    fn commit(&self, config: &Config, stage: CommitStage) -> OrchestratorResult<()> {
        self.collaborators.store.update(config)?;
        debug!(deployment = %self.deployment, ?stage, "config committed");
        self.emit(DeployEvent::ConfigCommitted { stage });
        Ok(())
    }

    /// Certificates are issued fresh on every run.
    fn issue_certificates(
        &self,
        config: &mut Config,
        outputs: &ProvisionOutputs,
        request: &DeployRequest,
    ) -> OrchestratorResult<()> {
        let issuer = &self.collaborators.issuer;

        let subjects = vec![
            outputs.director_public_ip.clone(),
            DIRECTOR_INTERNAL_IP.to_string(),
        ];
        let director = issuer.issue(&self.deployment, CertPurpose::Director, &subjects)?;
        config.director_ca_cert = director.ca_cert;
        config.director_cert = director.cert;
        config.director_key = director.key;
        self.emit(DeployEvent::CertificateIssued {
            purpose: CertPurpose::Director,
            subjects,
        });

        if let Some((cert, key)) = request.external_tls() {
            config.concourse_ca_cert = String::new();
            config.concourse_cert = cert.to_string();
            config.concourse_key = key.to_string();
            config.concourse_user_provided_cert = true;
            self.emit(DeployEvent::ExternalCertificateUsed);
            return Ok(());
        }

        let subjects = vec![config.public_host().to_string()];
        let public = issuer.issue(&self.deployment, CertPurpose::PublicEndpoint, &subjects)?;
        config.concourse_ca_cert = public.ca_cert;
        config.concourse_cert = public.cert;
        config.concourse_key = public.key;
        config.concourse_user_provided_cert = false;
        self.emit(DeployEvent::CertificateIssued {
            purpose: CertPurpose::PublicEndpoint,
            subjects,
        });
        Ok(())
    }

    /// A failed zone lookup only loses the advisory.
    fn advise_dns(&mut self, config: &Config) -> OrchestratorResult<()> {
        if config.domain.is_empty() {
            return Ok(());
        }
        let lookup = self
            .collaborators
            .provider
            .find_longest_matching_hosted_zone(&config.domain);
        match lookup {
            Ok(Some(zone)) => {
                self.warn_operator(&dns_advisory(&config.domain, &zone.name, &zone.id))?;
            }
            Ok(None) => debug!(domain = %config.domain, "no hosted zone matches domain"),
            Err(e) => warn!(domain = %config.domain, error = %e, "hosted zone lookup failed"),
        }
        Ok(())
    }

    /// The one place where the order depends on the mode.
    fn converge_director(
        &mut self,
        config: &Config,
        outputs: &ProvisionOutputs,
        request: &DeployRequest,
    ) -> OrchestratorResult<DirectorArtifacts> {
        let workload = self.collaborators.workload.build(config)?;
        let reachable = request.self_update && workload.can_connect()?;
        let policy = DirectorPolicy::select(request.self_update, reachable);
        info!(deployment = %self.deployment, ?policy, "converging director");

        let prior = self.load_director_artifacts()?;
        let converge = prior.is_some();
        let mut director = self.collaborators.director.build(config, outputs)?;

        match policy {
            DirectorPolicy::Converge => {
                let deployed = self.deploy_and_store(director.as_mut(), prior, false, converge);
                let artifacts = self.finish_director(director.as_mut(), deployed)?;
                self.set_pipeline(workload.as_ref(), config, false)?;
                Ok(artifacts)
            }
            DirectorPolicy::SelfUpdate => {
                self.set_pipeline(workload.as_ref(), config, true)?;
                let detached = policy.detaches_director();
                let deployed = self.deploy_and_store(director.as_mut(), prior, detached, converge);
                self.finish_director(director.as_mut(), deployed)
            }
        }
    }

    /// Both assets must exist for a deploy to count as a converge.
    fn load_director_artifacts(&self) -> OrchestratorResult<Option<DirectorArtifacts>> {
        let store = &self.collaborators.store;
        if !store.has_asset(DIRECTOR_STATE_ASSET)? || !store.has_asset(DIRECTOR_CREDS_ASSET)? {
            return Ok(None);
        }
        let state = store.load_asset(DIRECTOR_STATE_ASSET)?;
        self.emit(DeployEvent::DirectorAssetLoaded {
            name: DIRECTOR_STATE_ASSET.to_string(),
        });
        let creds = store.load_asset(DIRECTOR_CREDS_ASSET)?;
        self.emit(DeployEvent::DirectorAssetLoaded {
            name: DIRECTOR_CREDS_ASSET.to_string(),
        });
        Ok(Some(DirectorArtifacts { state, creds }))
    }

    fn deploy_and_store(
        &self,
        director: &mut dyn DirectorClient,
        prior: Option<DirectorArtifacts>,
        detached: bool,
        converge: bool,
    ) -> OrchestratorResult<DirectorArtifacts> {
        let artifacts = director.deploy(prior, detached)?;
        self.emit(DeployEvent::DirectorDeployed { detached, converge });
        for (name, contents) in [
            (DIRECTOR_STATE_ASSET, &artifacts.state),
            (DIRECTOR_CREDS_ASSET, &artifacts.creds),
        ] {
            self.collaborators.store.store_asset(name, contents)?;
            self.emit(DeployEvent::DirectorAssetStored {
                name: name.to_string(),
            });
        }
        Ok(artifacts)
    }

    /// Cleanup runs whatever happened before it; an earlier error wins.
    fn finish_director<T>(
        &self,
        director: &mut dyn DirectorClient,
        outcome: OrchestratorResult<T>,
    ) -> OrchestratorResult<T> {
        let cleaned = director.cleanup();
        let value = outcome?;
        cleaned?;
        self.emit(DeployEvent::DirectorCleanedUp);
        Ok(value)
    }

    fn set_pipeline(
        &self,
        workload: &dyn WorkloadClient,
        config: &Config,
        allow_version_discrepancy: bool,
    ) -> OrchestratorResult<()> {
        workload.set_default_pipeline(config, allow_version_discrepancy)?;
        self.emit(DeployEvent::DefaultPipelineSet);
        Ok(())
    }

    // ── Destroy ────────────────────────────────────────────────────

    /// Tear down the director, the workload VMs and the infrastructure,
    /// then forget the deployment.
    pub fn destroy(&mut self) -> OrchestratorResult<()> {
        info!(deployment = %self.deployment, "destroy started");
        let config = self.load_existing()?;
        let vars = self.derive_input_vars(&config)?;
        let outputs = self.extract_outputs(&vars)?;

        if self.collaborators.store.has_asset(DIRECTOR_STATE_ASSET)? {
            self.delete_director(&config, &outputs)?;
        }

        let removed = if config.vpc_id.is_empty() {
            Vec::new()
        } else {
            self.collaborators.provider.delete_vms_in_vpc(&config.vpc_id)?
        };
        info!(deployment = %self.deployment, count = removed.len(), "workload VMs terminated");
        self.emit(DeployEvent::VmsTornDown {
            count: removed.len(),
        });

        self.collaborators.infrastructure.destroy(&vars)?;
        self.emit(DeployEvent::InfrastructureDestroyed);

        let store = &self.collaborators.store;
        for name in [DIRECTOR_STATE_ASSET, DIRECTOR_CREDS_ASSET] {
            store.delete_asset(name)?;
            self.emit(DeployEvent::DirectorAssetDeleted {
                name: name.to_string(),
            });
        }
        self.collaborators.store.delete_all(&config)?;
        self.emit(DeployEvent::ConfigDeleted);

        writeln!(self.stdout, "{DESTROY_BANNER}")?;
        info!(deployment = %self.deployment, "destroy finished");
        Ok(())
    }

    fn delete_director(&self, config: &Config, outputs: &ProvisionOutputs) -> OrchestratorResult<()> {
        let store = &self.collaborators.store;
        let state = store.load_asset(DIRECTOR_STATE_ASSET)?;
        self.emit(DeployEvent::DirectorAssetLoaded {
            name: DIRECTOR_STATE_ASSET.to_string(),
        });
        let creds = if store.has_asset(DIRECTOR_CREDS_ASSET)? {
            let creds = store.load_asset(DIRECTOR_CREDS_ASSET)?;
            self.emit(DeployEvent::DirectorAssetLoaded {
                name: DIRECTOR_CREDS_ASSET.to_string(),
            });
            creds
        } else {
            Vec::new()
        };

        let mut director = self.collaborators.director.build(config, outputs)?;
        let deleted = director
            .delete(DirectorArtifacts { state, creds })
            .map_err(OrchestratorError::from)
            .inspect(|_| self.emit(DeployEvent::DirectorDeleted));
        self.finish_director(director.as_mut(), deleted)
    }

    fn load_existing(&self) -> OrchestratorResult<Config> {
        let exists = self.collaborators.store.config_exists()?;
        self.emit(DeployEvent::ConfigExistenceChecked { exists });
        if !exists {
            return Err(OrchestratorError::NoDeployment(self.deployment.clone()));
        }
        let config = self.collaborators.store.load()?;
        self.emit(DeployEvent::ConfigLoaded);
        Ok(config)
    }

    // ── Info ───────────────────────────────────────────────────────

    /// Summarise the deployment and check the local machine can reach the
    /// director. Makes no mutating call.
    pub fn info(&mut self) -> OrchestratorResult<DeploymentInfo> {
        let config = self.load_existing()?;
        let ip = self.collaborators.ip_checker.current_ip()?;
        let whitelisted = self
            .collaborators
            .provider
            .check_for_whitelisted_ip(&ip, &config.director_security_group_id)?;
        if !whitelisted {
            self.warn_operator(&not_whitelisted_warning(&ip))?;
        }
        Ok(DeploymentInfo::new(&config, ip, whitelisted))
    }
}

/// First commit: network, addressing and key facts from provisioning.
fn copy_outputs(config: &mut Config, outputs: &ProvisionOutputs) {
    config.concourse_public_ip = outputs.atc_public_ip.clone();
    config.director_public_ip = outputs.director_public_ip.clone();
    config.nat_gateway_ip = outputs.nat_gateway_ip.clone();
    config.vpc_id = outputs.vpc_id.clone();
    config.public_subnet_id = outputs.public_subnet_id.clone();
    config.private_subnet_id = outputs.private_subnet_id.clone();
    config.atc_security_group_id = outputs.atc_security_group_id.clone();
    config.director_security_group_id = outputs.director_security_group_id.clone();
    config.vms_security_group_id = outputs.vms_security_group_id.clone();
    config.private_key = outputs.director_key_pair.clone();
    config.public_key = outputs.director_public_key.clone();
}

/// Workload broker access issued by the director.
fn harvest_credhub(config: &mut Config, artifacts: &DirectorArtifacts) -> OrchestratorResult<()> {
    let creds = DirectorCredentials::from_bytes(&artifacts.creds)?;
    config.credhub_url = DirectorCredentials::credhub_url(config.public_host());
    config.credhub_username = CREDHUB_CLI_USER.to_string();
    config.credhub_password = creds.credhub_cli_password;
    config.credhub_admin_client_secret = creds.credhub_admin_client_secret;
    config.credhub_ca_cert = config.director_ca_cert.clone();
    Ok(())
}
