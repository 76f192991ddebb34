//! ciforge-iaas — per-cloud capabilities behind one trait.
//!
//! The orchestrator only ever sees [`Provider`]. Each supported cloud gets
//! one implementation; today that is AWS, driven through the `aws` CLI.
//!
//! # Components
//!
//! - **`provider`** — the capability trait, `Iaas` and `HostedZone`
//! - **`aws`** — `AwsProvider`
//! - **`zones`** — longest-suffix hosted zone matching
//! - **`cidr`** — IPv4 CIDR containment for whitelist checks

pub mod aws;
pub mod cidr;
pub mod error;
pub mod provider;
pub mod zones;

pub use aws::AwsProvider;
pub use error::{IaasError, IaasResult};
pub use provider::{HostedZone, Iaas, Provider};
