//! Typed step events emitted while a workflow runs.
//!
//! Operator text (warnings, banners) is a separate contract written to the
//! orchestrator's output streams. Events are for whoever wants to follow the
//! step order: the binary logs them, tests record and assert on them.

use std::sync::{Arc, Mutex};

use ciforge_core::CertPurpose;
use tracing::info;

/// Which of the two per-deploy config commits happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitStage {
    /// After infrastructure outputs were copied in.
    Provisioned,
    /// After director and workload steps.
    Converged,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeployEvent {
    ConfigExistenceChecked { exists: bool },
    ConfigLoaded,
    ConfigInitialized,
    InputVarsDerived,
    InfrastructureApplied,
    OutputsExtracted,
    ConfigCommitted { stage: CommitStage },
    CertificateIssued { purpose: CertPurpose, subjects: Vec<String> },
    ExternalCertificateUsed,
    DirectorAssetLoaded { name: String },
    DirectorDeployed { detached: bool, converge: bool },
    DirectorAssetStored { name: String },
    DirectorCleanedUp,
    DefaultPipelineSet,
    DirectorDeleted,
    VmsTornDown { count: usize },
    InfrastructureDestroyed,
    DirectorAssetDeleted { name: String },
    ConfigDeleted,
}

/// Receives events in the order steps complete.
pub trait EventSink {
    fn emit(&self, event: DeployEvent);
}

/// Collects events in memory. Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<DeployEvent>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything emitted so far, oldest first.
    pub fn events(&self) -> Vec<DeployEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: DeployEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }
}

/// Logs each event at info level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: DeployEvent) {
        info!(?event, "step completed");
    }
}
