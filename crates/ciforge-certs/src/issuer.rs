//! Run-scoped certificate authority.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::net::IpAddr;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use ciforge_core::{CertPurpose, CertificateBundle};
use rcgen::{
    BasicConstraints, Certificate, CertificateParams, DistinguishedName, DnType, IsCa, KeyPair,
    SanType,
};
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::error::{CertError, CertResult};

const ORGANIZATION: &str = "ciforge";
const CA_VALIDITY_YEARS: i32 = 10;
const LEAF_VALIDITY_YEARS: i32 = 2;

/// Issues certificate bundles signed by an authority named `ca_name`.
pub trait CertificateIssuer {
    fn issue(
        &self,
        ca_name: &str,
        purpose: CertPurpose,
        subjects: &[String],
    ) -> CertResult<CertificateBundle>;
}

struct Authority {
    key: KeyPair,
    cert: Certificate,
}

/// Keeps one freshly generated authority per CA name for its own lifetime.
///
/// Every leaf issued under the same name in one run chains to the same CA;
/// a new issuer (a new run) generates new authorities.
#[derive(Default)]
pub struct RunScopedIssuer {
    authorities: Mutex<HashMap<String, Authority>>,
}

impl RunScopedIssuer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CertificateIssuer for RunScopedIssuer {
    fn issue(
        &self,
        ca_name: &str,
        purpose: CertPurpose,
        subjects: &[String],
    ) -> CertResult<CertificateBundle> {
        if subjects.is_empty() {
            return Err(CertError::NoSubjects(purpose.label().to_string()));
        }

        let mut authorities = self.authorities.lock().map_err(|_| CertError::Poisoned)?;
        let authority = match authorities.entry(ca_name.to_string()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(generate_authority(ca_name)?),
        };

        let mut params = CertificateParams::default();
        let mut dn = DistinguishedName::new();
        dn.push(DnType::OrganizationName, ORGANIZATION);
        dn.push(DnType::CommonName, subjects[0].as_str());
        params.distinguished_name = dn;

        for subject in subjects {
            params.subject_alt_names.push(san_for(subject)?);
        }
        params.not_after = rcgen::date_time_ymd(year_from_now(LEAF_VALIDITY_YEARS), 1, 1);

        let key = KeyPair::generate()?;
        let cert = params.signed_by(&key, &authority.cert, &authority.key)?;

        info!(
            ca = %ca_name,
            purpose = purpose.label(),
            subjects = ?subjects,
            fingerprint = %fingerprint(cert.der()),
            "issued certificate"
        );

        Ok(CertificateBundle {
            purpose,
            subjects: subjects.to_vec(),
            ca_cert: authority.cert.pem(),
            cert: cert.pem(),
            key: key.serialize_pem(),
        })
    }
}

fn generate_authority(ca_name: &str) -> CertResult<Authority> {
    let mut params = CertificateParams::default();
    params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);

    let mut dn = DistinguishedName::new();
    dn.push(DnType::OrganizationName, ORGANIZATION);
    dn.push(DnType::CommonName, ca_name);
    params.distinguished_name = dn;
    params.not_after = rcgen::date_time_ymd(year_from_now(CA_VALIDITY_YEARS), 1, 1);

    let key = KeyPair::generate()?;
    let cert = params.self_signed(&key)?;

    debug!(ca = %ca_name, "generated certificate authority");
    Ok(Authority { key, cert })
}

fn san_for(subject: &str) -> CertResult<SanType> {
    if let Ok(ip) = subject.parse::<IpAddr>() {
        return Ok(SanType::IpAddress(ip));
    }
    let name = subject
        .to_string()
        .try_into()
        .map_err(|e: rcgen::Error| CertError::InvalidSubject {
            subject: subject.to_string(),
            reason: e.to_string(),
        })?;
    Ok(SanType::DnsName(name))
}

/// The calendar year `years` after the current one.
fn year_from_now(years: i32) -> i32 {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    let current_year = 1970 + (secs / 31_556_952) as i32;
    current_year + years
}

fn fingerprint(der: &[u8]) -> String {
    hex::encode(Sha256::digest(der))
}
