//! ciforge-terraform — infrastructure-as-code for a deployment.
//!
//! Converts a deployment [`Config`](ciforge_core::Config) into provisioner
//! input variables and drives the `terraform` CLI against an embedded
//! definition, extracting typed [`ProvisionOutputs`](ciforge_core::ProvisionOutputs).
//!
//! # Components
//!
//! - **`input_vars`** — `InputVars`, `AwsInputVars` and the factories that build them
//! - **`runner`** — `InfrastructureRunner` trait and `TerraformCli`
//! - **`outputs`** — parsing `terraform output -json`

pub mod error;
pub mod input_vars;
pub mod outputs;
pub mod runner;

pub use error::{TerraformError, TerraformResult};
pub use input_vars::{AwsInputVars, AwsInputVarsFactory, InputVars, InputVarsFactory};
pub use runner::{InfrastructureRunner, STATE_FILE, TerraformCli};
