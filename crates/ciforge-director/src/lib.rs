//! ciforge-director — installing and removing the VM-orchestration director.
//!
//! The director is managed with its own `create-env`/`delete-env` commands,
//! which keep their view of the world in a state file. Everything here is
//! about staging that state, the rendered manifest and the SSH key into a
//! private scratch directory, running the command there and reading back
//! the result.
//!
//! # Components
//!
//! - **`runner`** — `DirectorRunner`, the staged command wrapper and its state machine
//! - **`manifest`** — director manifest rendering
//! - **`credentials`** — `DirectorCredentials` generated on first deploy and reused after
//! - **`client`** — `DirectorClient`/`DirectorFactory` traits and the `BoshDirector` implementation

pub mod client;
pub mod credentials;
pub mod error;
pub mod manifest;
pub mod runner;

pub use client::{BoshDirector, BoshDirectorFactory, DirectorClient, DirectorFactory};
pub use credentials::DirectorCredentials;
pub use error::{DirectorError, DirectorResult};
pub use runner::{DirectorRunner, RunnerState};
