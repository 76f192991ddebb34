pub mod config;
pub mod request;
pub mod secrets;
pub mod settings;
pub mod types;

pub use config::{Config, DEPLOYMENT_PREFIX};
pub use request::{DeployRequest, RequestError};
pub use settings::Settings;
pub use types::*;
