//! # Secure Wrapper Builder
//!
//! Builds the two resources emitted per workload: the companion ConfigMap that
//! holds one encrypted blob per container, and the `SecureContainer` that
//! embeds the scrubbed workload and names the trusted runtime image.
//!
//! ```yaml
//! apiVersion: securecontainers.k8s.io/v1alpha1
//! kind: SecureContainer
//! metadata:
//!   name: secure-web
//! spec:
//!   secureContainerImageRef:
//!     name: raksh/secure-runtime:latest
//! object:
//!   apiVersion: apps/v1
//!   kind: Deployment
//!   ...
//! ```

use crate::constants::{
    CONFIG_MAP_PREFIX, SECURE_CONTAINER_API_VERSION, SECURE_CONTAINER_GROUP,
    SECURE_CONTAINER_KIND, SECURE_CONTAINER_VERSION, SECURE_PREFIX,
};
use crate::workload::Workload;
use k8s_openapi::api::core::v1::ConfigMap;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;

/// Reference to the trusted runtime image
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecureContainerImageRef {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecureContainerSpec {
    pub secure_container_image_ref: SecureContainerImageRef,
}

/// Secure-execution wrapper around a scrubbed workload
#[derive(Debug, Clone)]
pub struct SecureContainer {
    pub metadata: ObjectMeta,
    pub spec: SecureContainerSpec,
    pub object: Workload,
}

impl k8s_openapi::Resource for SecureContainer {
    const API_VERSION: &'static str = SECURE_CONTAINER_API_VERSION;
    const GROUP: &'static str = SECURE_CONTAINER_GROUP;
    const KIND: &'static str = SECURE_CONTAINER_KIND;
    const VERSION: &'static str = SECURE_CONTAINER_VERSION;
    const URL_PATH_SEGMENT: &'static str = "securecontainers";
    type Scope = k8s_openapi::NamespaceResourceScope;
}

impl k8s_openapi::Metadata for SecureContainer {
    type Ty = ObjectMeta;

    fn metadata(&self) -> &ObjectMeta {
        &self.metadata
    }

    fn metadata_mut(&mut self) -> &mut ObjectMeta {
        &mut self.metadata
    }
}

impl Serialize for SecureContainer {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct(SECURE_CONTAINER_KIND, 5)?;
        state.serialize_field("apiVersion", SECURE_CONTAINER_API_VERSION)?;
        state.serialize_field("kind", SECURE_CONTAINER_KIND)?;
        state.serialize_field("metadata", &self.metadata)?;
        state.serialize_field("spec", &self.spec)?;
        state.serialize_field("object", &self.object)?;
        state.end()
    }
}

/// `secure-configmap-<workload>`
#[must_use]
pub fn config_map_name(workload_name: &str) -> String {
    format!("{CONFIG_MAP_PREFIX}{workload_name}")
}

/// `secure-<workload>`
#[must_use]
pub fn secure_container_name(workload_name: &str) -> String {
    format!("{SECURE_PREFIX}{workload_name}")
}

/// Empty companion ConfigMap for a workload
#[must_use]
pub fn new_config_map(workload_name: &str, namespace: Option<String>) -> ConfigMap {
    ConfigMap {
        metadata: ObjectMeta {
            name: Some(config_map_name(workload_name)),
            namespace,
            ..Default::default()
        },
        data: Some(BTreeMap::new()),
        ..Default::default()
    }
}

/// Wrap a scrubbed workload, taking ownership of it
#[must_use]
pub fn new_secure_container(
    workload_name: &str,
    secure_container_image: &str,
    workload: Workload,
) -> SecureContainer {
    SecureContainer {
        metadata: ObjectMeta {
            name: Some(secure_container_name(workload_name)),
            ..Default::default()
        },
        spec: SecureContainerSpec {
            secure_container_image_ref: SecureContainerImageRef {
                name: secure_container_image.to_string(),
            },
        },
        object: workload,
    }
}
