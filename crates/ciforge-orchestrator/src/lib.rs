//! ciforge-orchestrator — reconciles one named deployment with the
//! operator's intent.
//!
//! The orchestrator owns the step order of a run and nothing else. Every
//! external system is reached through a trait object handed in at
//! construction, so tests drive the same code with recording stand-ins.
//!
//! # Components
//!
//! - **`orchestrator`** — `Orchestrator` with the deploy, destroy and info workflows
//! - **`events`** — typed step events and the sinks that receive them
//! - **`policy`** — normal vs. self-update ordering of the director step
//! - **`source_ip`** — detection of the operator's outbound address
//! - **`summary`** — operator-facing banners and `DeploymentInfo`

pub mod error;
pub mod events;
pub mod orchestrator;
pub mod policy;
pub mod source_ip;
pub mod summary;

pub use error::{OrchestratorError, OrchestratorResult};
pub use events::{CommitStage, DeployEvent, EventSink, RecordingSink, TracingSink};
pub use orchestrator::{Collaborators, Orchestrator};
pub use policy::DirectorPolicy;
pub use source_ip::{HttpIpChecker, IpChecker};
pub use summary::DeploymentInfo;
