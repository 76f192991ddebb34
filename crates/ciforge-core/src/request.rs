//! Per-run operator overrides.
//!
//! A `DeployRequest` is never persisted. Only its effects land in the
//! deployment [`Config`](crate::Config).

use std::net::Ipv4Addr;
use std::str::FromStr;

use ipnet::Ipv4Net;
use thiserror::Error;

/// DB size used when the operator does not pick one.
pub const DEFAULT_DB_SIZE: &str = "small";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RequestError {
    #[error("invalid CIDR block or IP address in allow-list: {0}")]
    InvalidCidr(String),

    #[error("--tls-cert and --tls-key must be supplied together")]
    IncompleteTls,

    #[error("unknown DB size: {0}")]
    UnknownDbSize(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeployRequest {
    /// Comma-separated CIDR blocks. `None` keeps the stored allow-list.
    pub allow_ips: Option<String>,
    pub db_size: String,
    /// Whether `db_size` came from the operator rather than the default.
    pub db_size_is_set: bool,
    pub region: Option<String>,
    pub domain: Option<String>,
    pub self_update: bool,
    pub tls_cert: Option<String>,
    pub tls_key: Option<String>,
    /// Free-form `key=value` tags applied to the deployment.
    pub tags: Vec<String>,
}

impl Default for DeployRequest {
    fn default() -> Self {
        Self {
            allow_ips: None,
            db_size: DEFAULT_DB_SIZE.to_string(),
            db_size_is_set: false,
            region: None,
            domain: None,
            self_update: false,
            tls_cert: None,
            tls_key: None,
            tags: Vec::new(),
        }
    }
}

impl DeployRequest {
    /// Operator-supplied certificate and key, when both were given.
    pub fn external_tls(&self) -> Option<(&str, &str)> {
        match (&self.tls_cert, &self.tls_key) {
            (Some(cert), Some(key)) => Some((cert.as_str(), key.as_str())),
            _ => None,
        }
    }

    /// Check the fields that can be validated without touching anything.
    pub fn validate(&self) -> Result<(), RequestError> {
        if self.tls_cert.is_some() != self.tls_key.is_some() {
            return Err(RequestError::IncompleteTls);
        }
        if let Some(allow_ips) = &self.allow_ips {
            parse_allow_ips(allow_ips)?;
        }
        Ok(())
    }

    /// The explicit allow-list, parsed. `None` when the operator gave none.
    pub fn parsed_allow_ips(&self) -> Result<Option<Vec<String>>, RequestError> {
        self.allow_ips.as_deref().map(parse_allow_ips).transpose()
    }
}

/// Parse a comma-separated allow-list. Bare addresses become `/32` blocks
/// and host bits are cleared, so `192.168.1.5/16` is stored as `192.168.0.0/16`.
pub fn parse_allow_ips(input: &str) -> Result<Vec<String>, RequestError> {
    let mut blocks = Vec::new();
    for raw in input.split(',') {
        let entry = raw.trim();
        if entry.is_empty() {
            continue;
        }
        blocks.push(parse_block(entry)?.trunc().to_string());
    }
    if blocks.is_empty() {
        return Err(RequestError::InvalidCidr(input.to_string()));
    }
    Ok(blocks)
}

fn parse_block(entry: &str) -> Result<Ipv4Net, RequestError> {
    let invalid = || RequestError::InvalidCidr(entry.to_string());
    if entry.contains('/') {
        return Ipv4Net::from_str(entry).map_err(|_| invalid());
    }
    let addr: Ipv4Addr = entry.parse().map_err(|_| invalid())?;
    Ipv4Net::new(addr, 32).map_err(|_| invalid())
}
