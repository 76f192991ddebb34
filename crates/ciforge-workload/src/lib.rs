//! ciforge-workload — configuring the running CI platform.
//!
//! # Components
//!
//! - **`client`** — `WorkloadClient`/`WorkloadFactory` traits and the `fly`-driven `FlyClient`
//! - **`pipeline`** — the default self-update pipeline
//! - **`probe`** — minimal HTTP/1 GET used for reachability and IP detection

pub mod client;
pub mod error;
pub mod pipeline;
pub mod probe;

pub use client::{FlyClient, FlyClientFactory, WorkloadClient, WorkloadFactory};
pub use error::{WorkloadError, WorkloadResult};
pub use probe::{ProbeResponse, get_blocking, http_get};
