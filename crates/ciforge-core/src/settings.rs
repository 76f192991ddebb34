//! ciforge.toml operator settings.
//!
//! Every field is optional in the file; missing fields fall back to
//! [`Settings::default`]. Environment variables override the file and CLI
//! flags override both (the CLI applies those).

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable overriding [`Settings::state_dir`].
pub const STATE_DIR_ENV: &str = "CIFORGE_STATE_DIR";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Where the config store and provisioner working directories live.
    pub state_dir: PathBuf,
    pub binaries: BinariesConfig,
    pub network: NetworkConfig,
}

/// Paths of the external tools ciforge drives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BinariesConfig {
    pub terraform: PathBuf,
    pub bosh: PathBuf,
    pub fly: PathBuf,
    pub aws: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// `host:port` of a plain-HTTP service echoing the caller's address.
    pub ip_check_address: String,
    /// Timeout for reachability probes and IP detection.
    pub probe_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            state_dir: PathBuf::from(".ciforge"),
            binaries: BinariesConfig::default(),
            network: NetworkConfig::default(),
        }
    }
}

impl Default for BinariesConfig {
    fn default() -> Self {
        Self {
            terraform: PathBuf::from("terraform"),
            bosh: PathBuf::from("bosh"),
            fly: PathBuf::from("fly"),
            aws: PathBuf::from("aws"),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            ip_check_address: "checkip.amazonaws.com:80".to_string(),
            probe_timeout_secs: 5,
        }
    }
}

impl Settings {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&content)?;
        Ok(settings)
    }

    /// Load `path` if it exists, otherwise start from the defaults.
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        if path.is_file() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Apply `CIFORGE_STATE_DIR` when it is set.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(dir) = std::env::var(STATE_DIR_ENV) {
            if !dir.is_empty() {
                self.state_dir = PathBuf::from(dir);
            }
        }
        self
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Path of the redb config store.
    pub fn store_path(&self) -> PathBuf {
        self.state_dir.join("ciforge.redb")
    }

    /// Provisioner working directory for one deployment.
    pub fn terraform_dir(&self, deployment: &str) -> PathBuf {
        self.state_dir.join("terraform").join(deployment)
    }
}
