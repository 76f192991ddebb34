//! The default pipeline set on every deployment.
//!
//! It re-runs `ciforge deploy --self-update` for the deployment from inside
//! the platform whenever a new ciforge release appears, so the director and
//! platform keep converging without the operator's machine. Cloud
//! credentials are resolved by the platform from its credential broker.

use ciforge_core::Config;
use serde_json::{Value, json};

use crate::error::{WorkloadError, WorkloadResult};

pub const DEFAULT_PIPELINE_NAME: &str = "ciforge-self-update";

const RELEASE_REPOSITORY: &str = "ciforge";
const RELEASE_OWNER: &str = "ciforge-dev";

pub fn render_default_pipeline(config: &Config) -> WorkloadResult<Vec<u8>> {
    serde_yaml::to_string(&pipeline_value(config))
        .map(String::into_bytes)
        .map_err(|e| WorkloadError::Pipeline(e.to_string()))
}

fn pipeline_value(config: &Config) -> Value {
    let mut args = vec![
        "deploy".to_string(),
        config.project.clone(),
        "--region".to_string(),
        config.region.clone(),
        "--self-update".to_string(),
    ];
    if !config.domain.is_empty() {
        args.push("--domain".to_string());
        args.push(config.domain.clone());
    }

    json!({
        "resources": [{
            "name": "ciforge-release",
            "type": "github-release",
            "source": {
                "user": RELEASE_OWNER,
                "repository": RELEASE_REPOSITORY,
                "pre_release": false,
            },
        }],
        "jobs": [{
            "name": "self-update",
            "serial": true,
            "plan": [
                { "get": "ciforge-release", "trigger": true, "params": { "globs": ["ciforge-linux-amd64"] } },
                {
                    "task": "update",
                    "params": {
                        "AWS_REGION": config.region,
                        "AWS_ACCESS_KEY_ID": "((aws_access_key_id))",
                        "AWS_SECRET_ACCESS_KEY": "((aws_secret_access_key))",
                        "CIFORGE_DEPLOYMENT": config.deployment,
                    },
                    "config": {
                        "platform": "linux",
                        "image_resource": {
                            "type": "registry-image",
                            "source": { "repository": "ciforge/ciforge-runner" },
                        },
                        "inputs": [{ "name": "ciforge-release" }],
                        "run": {
                            "path": "sh",
                            "args": [
                                "-exc",
                                format!(
                                    "chmod +x ciforge-release/ciforge-linux-amd64 && ciforge-release/ciforge-linux-amd64 {}",
                                    args.join(" ")
                                ),
                            ],
                        },
                    },
                },
            ],
        }],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config {
            project: "happymeal".to_string(),
            deployment: "ciforge-happymeal".to_string(),
            region: "eu-west-1".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn self_update_job_targets_deployment() {
        let bytes = render_default_pipeline(&config()).unwrap();
        let pipeline: Value = serde_yaml::from_slice(&bytes).unwrap();
        let task = &pipeline["jobs"][0]["plan"][1];
        assert_eq!(task["params"]["AWS_REGION"], "eu-west-1");
        assert_eq!(task["params"]["CIFORGE_DEPLOYMENT"], "ciforge-happymeal");
        let script = task["config"]["run"]["args"][1].as_str().unwrap();
        assert!(script.ends_with("deploy happymeal --region eu-west-1 --self-update"));
    }

    #[test]
    fn domain_is_carried_into_self_update() {
        let config = Config {
            domain: "ci.google.com".to_string(),
            ..config()
        };
        let pipeline: Value =
            serde_yaml::from_slice(&render_default_pipeline(&config).unwrap()).unwrap();
        let script = pipeline["jobs"][0]["plan"][1]["config"]["run"]["args"][1]
            .as_str()
            .unwrap();
        assert!(script.ends_with("--self-update --domain ci.google.com"));
    }
}
