//! # Transform
//!
//! Secures one decoded workload.
//!
//! The per-container steps are chained through [`PodSpecPipeline`], whose
//! type parameter records how far the pod spec has progressed:
//!
//! ```text
//! seal (extract + encrypt) -> Sealed -> mask -> Masked -> mount -> Mounted -> inject_vault
//! ```
//!
//! Masking is only reachable after every container has been sealed, and Vault
//! injection only after masking, so the environment it adds cannot be wiped.

use crate::config::TransformConfig;
use crate::crypto::Encryptor;
use crate::error::TransformError;
use crate::secure::{
    config_map_name, extract_container, insert_vault_secret, mask_sensitive_data,
    mount_config_map, new_config_map, new_secure_container, SecureContainer,
};
use crate::workload::Workload;
use k8s_openapi::api::core::v1::{ConfigMap, PodSpec};
use kube::ResourceExt;
use std::collections::BTreeMap;
use std::marker::PhantomData;
use tracing::{debug, warn};
use zeroize::Zeroizing;

/// Every container's secrets are in the ConfigMap
#[derive(Debug)]
pub struct Sealed;

/// Containers have been scrubbed
#[derive(Debug)]
pub struct Masked;

/// Secure volumes are attached
#[derive(Debug)]
pub struct Mounted;

/// A pod spec moving through the securing steps in order
#[derive(Debug)]
pub struct PodSpecPipeline<'a, S> {
    pod_spec: &'a mut PodSpec,
    _state: PhantomData<S>,
}

impl<'a, S> PodSpecPipeline<'a, S> {
    fn advance<T>(self) -> PodSpecPipeline<'a, T> {
        PodSpecPipeline {
            pod_spec: self.pod_spec,
            _state: PhantomData,
        }
    }
}

impl<'a> PodSpecPipeline<'a, Sealed> {
    /// Extract and encrypt every container into `config_map`, in order
    ///
    /// Containers sharing a name overwrite each other's entry; the last one wins.
    ///
    /// # Errors
    ///
    /// Stops at the first container that cannot be serialized or encrypted.
    pub fn seal(
        pod_spec: &'a mut PodSpec,
        config_map: &mut ConfigMap,
        encryptor: &dyn Encryptor,
    ) -> Result<Self, TransformError> {
        let data = config_map.data.get_or_insert_with(BTreeMap::new);

        for container in &pod_spec.containers {
            let plaintext = Zeroizing::new(extract_container(container)?);
            let ciphertext =
                encryptor
                    .encrypt(&plaintext)
                    .map_err(|source| TransformError::Encryption {
                        container: container.name.clone(),
                        source,
                    })?;

            debug!("Sealed container '{}'", container.name);
            if data.insert(container.name.clone(), ciphertext).is_some() {
                warn!(
                    "Duplicate container name '{}': keeping the later container's secrets",
                    container.name
                );
            }
        }

        Ok(Self {
            pod_spec,
            _state: PhantomData,
        })
    }

    #[must_use]
    pub fn mask(self, scratch_image: &str) -> PodSpecPipeline<'a, Masked> {
        mask_sensitive_data(self.pod_spec, scratch_image);
        self.advance()
    }
}

impl<'a> PodSpecPipeline<'a, Masked> {
    #[must_use]
    pub fn mount(self, config_map_name: &str) -> PodSpecPipeline<'a, Mounted> {
        mount_config_map(self.pod_spec, config_map_name);
        self.advance()
    }
}

impl PodSpecPipeline<'_, Mounted> {
    /// Add Vault references when a secret is configured; this is the last step
    pub fn inject_vault(self, vault_secret: Option<&str>) {
        if let Some(secret_name) = vault_secret {
            insert_vault_secret(self.pod_spec, secret_name);
        }
    }
}

/// The two resources produced for one workload, in output order
#[derive(Debug, Clone)]
pub struct SecuredWorkload {
    pub config_map: ConfigMap,
    pub secure_container: SecureContainer,
}

/// Secure a workload: seal its containers, scrub it, and wrap it
///
/// The workload itself is mutated and moved into the returned
/// `SecureContainer`; nothing is copied.
///
/// # Errors
///
/// Returns [`TransformError::ShapeMismatch`] when the workload has no name or
/// pod spec, and [`TransformError::Encryption`] when a container cannot be sealed.
pub fn secure_workload(
    mut workload: Workload,
    config: &TransformConfig,
    encryptor: &dyn Encryptor,
) -> Result<SecuredWorkload, TransformError> {
    let kind = workload.kind().to_string();

    let (workload_name, config_map) = {
        let parts = workload.parts_mut()?;
        let workload_name = parts.name(&kind)?;
        let mut config_map = new_config_map(&workload_name, parts.metadata.namespace.clone());

        PodSpecPipeline::seal(parts.pod_spec, &mut config_map, encryptor)?
            .mask(&config.scratch_image)
            .mount(&config_map_name(&workload_name))
            .inject_vault(config.vault_secret.as_deref());

        (workload_name, config_map)
    };

    let secure_container =
        new_secure_container(&workload_name, &config.secure_container_image, workload);
    debug!(
        "Secured {} '{}' as {} with ConfigMap {}",
        kind,
        workload_name,
        secure_container.name_any(),
        config_map.name_any()
    );

    Ok(SecuredWorkload {
        config_map,
        secure_container,
    })
}
