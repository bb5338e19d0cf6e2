//! # Container Secret Extractor
//!
//! Turns one container into the document the secure runtime agent decrypts
//! and reads at start-up:
//!
//! ```yaml
//! spec:
//!   containers:
//!   - name: api
//!     image: myapp:1.0
//!     command: [...]
//!     args: [...]
//!     env: [...]
//!     ports: [...]
//!     resources: {...}
//! ```
//!
//! Field names are consumed verbatim by the agent and must not change.

use crate::error::TransformError;
use k8s_openapi::api::core::v1::{Container, ContainerPort, EnvVar, ResourceRequirements};
use serde::{Deserialize, Serialize};

/// Top-level document stored (encrypted) in the companion ConfigMap
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecureContainerConfig {
    pub spec: SecureContainerPodSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecureContainerPodSpec {
    pub containers: Vec<ContainerSecrets>,
}

/// The sensitive subset of a container's fields
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerSecrets {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub command: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub env: Vec<EnvVar>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<ContainerPort>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<ResourceRequirements>,
}

impl From<&Container> for ContainerSecrets {
    fn from(container: &Container) -> Self {
        Self {
            name: container.name.clone(),
            image: container.image.clone(),
            command: container.command.clone().unwrap_or_default(),
            args: container.args.clone().unwrap_or_default(),
            env: container.env.clone().unwrap_or_default(),
            ports: container.ports.clone().unwrap_or_default(),
            resources: container.resources.clone(),
        }
    }
}

impl From<&Container> for SecureContainerConfig {
    fn from(container: &Container) -> Self {
        Self {
            spec: SecureContainerPodSpec {
                containers: vec![ContainerSecrets::from(container)],
            },
        }
    }
}

/// Serialize the secret document for one container
///
/// # Errors
///
/// Returns [`TransformError::Encode`] when YAML serialization fails.
pub fn extract_container(container: &Container) -> Result<Vec<u8>, TransformError> {
    let config = SecureContainerConfig::from(container);
    serde_yaml::to_string(&config)
        .map(String::into_bytes)
        .map_err(|source| TransformError::Encode {
            what: "container secrets",
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
    use std::collections::BTreeMap;

    fn api_container() -> Container {
        Container {
            name: "api".to_string(),
            image: Some("myapp:1.0".to_string()),
            command: Some(vec!["/bin/server".to_string()]),
            args: Some(vec!["--port".to_string(), "8080".to_string()]),
            env: Some(vec![EnvVar {
                name: "DB_PASSWORD".to_string(),
                value: Some("hunter2".to_string()),
                ..Default::default()
            }]),
            ports: Some(vec![ContainerPort {
                container_port: 8080,
                ..Default::default()
            }]),
            resources: Some(ResourceRequirements {
                limits: Some(BTreeMap::from([(
                    "memory".to_string(),
                    Quantity("128Mi".to_string()),
                )])),
                ..Default::default()
            }),
            working_dir: Some("/srv".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_extract_document_shape() {
        let bytes = extract_container(&api_container()).unwrap();
        let value: serde_yaml::Value = serde_yaml::from_slice(&bytes).unwrap();

        let containers = value["spec"]["containers"].as_sequence().unwrap();
        assert_eq!(containers.len(), 1);
        let container = &containers[0];
        assert_eq!(container["name"], serde_yaml::Value::from("api"));
        assert_eq!(container["image"], serde_yaml::Value::from("myapp:1.0"));
        assert_eq!(container["command"][0], serde_yaml::Value::from("/bin/server"));
        assert_eq!(container["args"][1], serde_yaml::Value::from("8080"));
        assert_eq!(container["env"][0]["name"], serde_yaml::Value::from("DB_PASSWORD"));
        assert_eq!(container["ports"][0]["containerPort"], serde_yaml::Value::from(8080));
        assert_eq!(
            container["resources"]["limits"]["memory"],
            serde_yaml::Value::from("128Mi")
        );
    }

    #[test]
    fn test_extract_keeps_only_sensitive_subset() {
        let bytes = extract_container(&api_container()).unwrap();
        let value: serde_yaml::Value = serde_yaml::from_slice(&bytes).unwrap();
        assert!(value["spec"]["containers"][0].get("workingDir").is_none());
    }

    #[test]
    fn test_extract_omits_empty_fields() {
        let container = Container {
            name: "bare".to_string(),
            ..Default::default()
        };
        let bytes = extract_container(&container).unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            "spec:\n  containers:\n  - name: bare\n"
        );
    }

    #[test]
    fn test_extracted_document_parses_back() {
        let container = api_container();
        let bytes = extract_container(&container).unwrap();
        let parsed: SecureContainerConfig = serde_yaml::from_slice(&bytes).unwrap();
        assert_eq!(parsed, SecureContainerConfig::from(&container));
    }
}
