//! The operator's outbound address, as seen from the internet.

use std::net::IpAddr;
use std::time::Duration;

use ciforge_workload::get_blocking;
use tracing::debug;

use crate::error::{OrchestratorError, OrchestratorResult};

pub trait IpChecker {
    fn current_ip(&self) -> OrchestratorResult<String>;
}

/// Asks a plain-HTTP echo service, `checkip.amazonaws.com` by default.
#[derive(Debug, Clone)]
pub struct HttpIpChecker {
    address: String,
    timeout: Duration,
}

impl HttpIpChecker {
    pub fn new(address: impl Into<String>, timeout: Duration) -> Self {
        Self {
            address: address.into(),
            timeout,
        }
    }
}

impl IpChecker for HttpIpChecker {
    fn current_ip(&self) -> OrchestratorResult<String> {
        let resp = get_blocking(&self.address, "/", self.timeout)?;
        if !(200..300).contains(&resp.status) {
            return Err(OrchestratorError::InvalidSourceIp(format!(
                "{} answered with status {}",
                self.address, resp.status
            )));
        }
        parse_ip(&resp.body_text()).inspect(|ip| debug!(%ip, "detected outbound address"))
    }
}

fn parse_ip(body: &str) -> OrchestratorResult<String> {
    body.parse::<IpAddr>()
        .map(|ip| ip.to_string())
        .map_err(|_| OrchestratorError::InvalidSourceIp(format!("unexpected response {body:?}")))
}
