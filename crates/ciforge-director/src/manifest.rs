//! Director manifest rendering.
//!
//! The manifest is assembled as a JSON value and written out as YAML.
//! It is a pure function of the deployment config, the provisioning
//! outputs and the director credentials.

use ciforge_core::{Config, DIRECTOR_INTERNAL_IP, ProvisionOutputs};
use serde_json::{Value, json};

use crate::credentials::{CREDHUB_CLI_USER, CREDHUB_PORT, DirectorCredentials};
use crate::error::{DirectorError, DirectorResult};
use crate::runner::KEY_FILENAME;

const DIRECTOR_INSTANCE_TYPE: &str = "t2.small";
const DIRECTOR_DISK_SIZE_MB: u32 = 20_000;
const KEY_PAIR_SUFFIX: &str = "-director";

struct Release {
    name: &'static str,
    version: &'static str,
    url: &'static str,
}

const RELEASES: &[Release] = &[
    Release {
        name: "bosh",
        version: "271.2.0",
        url: "https://bosh.io/d/github.com/cloudfoundry/bosh?v=271.2.0",
    },
    Release {
        name: "bosh-aws-cpi",
        version: "91",
        url: "https://bosh.io/d/github.com/cloudfoundry/bosh-aws-cpi-release?v=91",
    },
    Release {
        name: "credhub",
        version: "2.12.2",
        url: "https://bosh.io/d/github.com/pivotal-cf/credhub-release?v=2.12.2",
    },
    Release {
        name: "uaa",
        version: "76.0.0",
        url: "https://bosh.io/d/github.com/cloudfoundry/uaa-release?v=76.0.0",
    },
];

const STEMCELL_URL: &str =
    "https://bosh.io/d/stemcells/bosh-aws-xen-hvm-ubuntu-jammy-go_agent?v=1.83";

/// Render the create-env manifest.
pub fn render_manifest(
    config: &Config,
    outputs: &ProvisionOutputs,
    creds: &DirectorCredentials,
) -> DirectorResult<Vec<u8>> {
    let manifest = manifest_value(config, outputs, creds);
    serde_yaml::to_string(&manifest)
        .map(String::into_bytes)
        .map_err(|e| DirectorError::Manifest(e.to_string()))
}

fn manifest_value(config: &Config, outputs: &ProvisionOutputs, creds: &DirectorCredentials) -> Value {
    let releases: Vec<Value> = RELEASES
        .iter()
        .map(|r| json!({ "name": r.name, "version": r.version, "url": r.url }))
        .collect();

    json!({
        "name": config.deployment,
        "releases": releases,
        "resource_pools": [{
            "name": "vms",
            "network": "default",
            "stemcell": { "url": STEMCELL_URL },
            "cloud_properties": {
                "instance_type": DIRECTOR_INSTANCE_TYPE,
                "ephemeral_disk": { "size": 25_000, "type": "gp2" },
                "availability_zone": config.availability_zone,
            },
        }],
        "disk_pools": [{
            "name": "disks",
            "disk_size": DIRECTOR_DISK_SIZE_MB,
            "cloud_properties": { "type": "gp2" },
        }],
        "networks": networks(config, outputs),
        "instance_groups": [{
            "name": "bosh",
            "instances": 1,
            "jobs": [
                { "name": "nats", "release": "bosh" },
                { "name": "director", "release": "bosh" },
                { "name": "health_monitor", "release": "bosh" },
                { "name": "aws_cpi", "release": "bosh-aws-cpi" },
                { "name": "credhub", "release": "credhub" },
                { "name": "uaa", "release": "uaa" },
            ],
            "resource_pool": "vms",
            "persistent_disk_pool": "disks",
            "networks": [
                { "name": "default", "static_ips": [DIRECTOR_INTERNAL_IP], "default": ["dns", "gateway"] },
                { "name": "public", "static_ips": [outputs.director_public_ip] },
            ],
            "properties": properties(config, outputs, creds),
        }],
        "cloud_provider": cloud_provider(config, outputs, creds),
    })
}

fn networks(config: &Config, outputs: &ProvisionOutputs) -> Value {
    json!([
        {
            "name": "default",
            "type": "manual",
            "subnets": [{
                "range": config.private_cidr,
                "gateway": gateway_for(&config.private_cidr),
                "dns": ["8.8.8.8"],
                "cloud_properties": { "subnet": outputs.private_subnet_id },
            }],
        },
        { "name": "public", "type": "vip" },
    ])
}

fn aws_properties(config: &Config, outputs: &ProvisionOutputs) -> Value {
    json!({
        "access_key_id": outputs.bosh_user_access_key_id,
        "secret_access_key": outputs.bosh_secret_access_key,
        "default_key_name": format!("{}{KEY_PAIR_SUFFIX}", config.deployment),
        "default_security_groups": [outputs.director_security_group_id],
        "region": config.region,
    })
}

fn properties(config: &Config, outputs: &ProvisionOutputs, creds: &DirectorCredentials) -> Value {
    json!({
        "nats": {
            "address": DIRECTOR_INTERNAL_IP,
            "user": "nats",
            "password": creds.nats_password,
        },
        "postgres": {
            "host": outputs.bosh_db_address,
            "port": outputs.bosh_db_port,
            "user": config.rds_username,
            "password": config.rds_password,
            "database": config.rds_default_database_name,
            "adapter": "postgres",
        },
        "blobstore": {
            "provider": "s3",
            "bucket_name": outputs.blobstore_bucket,
            "access_key_id": outputs.blobstore_user_access_key_id,
            "secret_access_key": outputs.blobstore_secret_access_key,
            "s3_region": config.region,
            "director": { "user": "director", "password": creds.blobstore_director_password },
            "agent": { "user": "agent", "password": creds.blobstore_agent_password },
        },
        "director": director_properties(config, outputs),
        "hm": {
            "director_account": { "user": "hm", "password": creds.hm_password },
            "resurrector_enabled": true,
        },
        "credhub": credhub_properties(config, creds),
        "uaa": uaa_properties(creds),
        "aws": aws_properties(config, outputs),
        "agent": { "mbus": format!("nats://nats:{}@{DIRECTOR_INTERNAL_IP}:4222", creds.nats_password) },
        "ntp": ["0.pool.ntp.org", "1.pool.ntp.org"],
    })
}

fn director_properties(config: &Config, outputs: &ProvisionOutputs) -> Value {
    json!({
        "address": DIRECTOR_INTERNAL_IP,
        "name": config.deployment,
        "db": { "host": outputs.bosh_db_address, "port": outputs.bosh_db_port },
        "cpi_job": "aws_cpi",
        "ssl": { "cert": config.director_cert, "key": config.director_key },
        "user_management": {
            "provider": "local",
            "local": {
                "users": [{
                    "name": config.director_username,
                    "password": config.director_password,
                }],
            },
        },
    })
}

fn credhub_properties(config: &Config, creds: &DirectorCredentials) -> Value {
    json!({
        "port": CREDHUB_PORT,
        "url": DirectorCredentials::credhub_url(config.public_host()),
        "tls": { "certificate": config.director_cert, "private_key": config.director_key },
        "ca_certificate": config.director_ca_cert,
        "encryption": {
            "keys": [{
                "provider_name": "internal",
                "key_properties": { "encryption_password": creds.credhub_encryption_password },
                "active": true,
            }],
            "providers": [{ "name": "internal", "type": "internal" }],
        },
        "authorization": {
            "permissions": [{
                "path": "/*",
                "actors": ["uaa-client:credhub_admin"],
                "operations": ["read", "write", "delete"],
            }],
        },
    })
}

fn uaa_properties(creds: &DirectorCredentials) -> Value {
    json!({
        "url": format!("https://{DIRECTOR_INTERNAL_IP}:8443"),
        "admin": { "client_secret": creds.uaa_admin_client_secret },
        "clients": {
            "credhub_admin": {
                "secret": creds.credhub_admin_client_secret,
                "authorized-grant-types": "client_credentials",
                "authorities": "credhub.read,credhub.write",
            },
            "credhub_cli": {
                "secret": "",
                "authorized-grant-types": "password,refresh_token",
                "scope": "credhub.read,credhub.write",
            },
        },
        "scim": {
            "users": [{
                "name": CREDHUB_CLI_USER,
                "password": creds.credhub_cli_password,
                "groups": ["credhub.read", "credhub.write"],
            }],
        },
    })
}

fn cloud_provider(config: &Config, outputs: &ProvisionOutputs, creds: &DirectorCredentials) -> Value {
    json!({
        "template": { "name": "aws_cpi", "release": "bosh-aws-cpi" },
        "ssh_tunnel": {
            "host": outputs.director_public_ip,
            "port": 22,
            "user": "vcap",
            "private_key": format!("./{KEY_FILENAME}"),
        },
        "mbus": format!("https://mbus:{}@{}:6868", creds.mbus_bootstrap_password, outputs.director_public_ip),
        "properties": {
            "aws": aws_properties(config, outputs),
            "agent": { "mbus": format!("https://mbus:{}@0.0.0.0:6868", creds.mbus_bootstrap_password) },
            "blobstore": { "provider": "local", "path": "/var/vcap/micro_bosh/data/cache" },
            "ntp": ["0.pool.ntp.org", "1.pool.ntp.org"],
        },
    })
}

/// First usable address of an IPv4 CIDR, e.g. `10.0.1.1` for `10.0.1.0/24`.
fn gateway_for(cidr: &str) -> String {
    let network = cidr.split('/').next().unwrap_or(cidr);
    let mut octets: Vec<&str> = network.split('.').collect();
    if octets.len() != 4 {
        return network.to_string();
    }
    octets.pop();
    format!("{}.1", octets.join("."))
}
