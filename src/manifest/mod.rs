//! # Manifest
//!
//! File-level processing: multi-document decode, per-document securing,
//! rendering, and output.
//!
//! ## Document Handling
//!
//! - Empty documents are ignored
//! - Documents of unregistered kinds are skipped with a warning
//! - Any other error fails the whole file and nothing is written
//!
//! Each secured document contributes two YAML documents to the output, the
//! ConfigMap first:
//!
//! ```yaml
//! ---
//! apiVersion: v1
//! kind: ConfigMap
//! ...
//! ---
//! apiVersion: securecontainers.k8s.io/v1alpha1
//! kind: SecureContainer
//! ...
//! ```

pub mod finder;
pub mod writer;

pub use finder::find_manifests;
pub use writer::{output_path, write_atomic};

use crate::config::TransformConfig;
use crate::constants::CONFIG_MAP_PREFIX;
use crate::crypto::{AesGcmEncryptor, Encryptor};
use crate::error::TransformError;
use crate::transform::{secure_workload, SecuredWorkload};
use crate::workload::KindRegistry;
use k8s_openapi::api::core::v1::ConfigMap;
use kube::ResourceExt;
use serde::Deserialize;
use serde_yaml::Value;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Decode every YAML document in `content`, in order
fn documents(content: &str) -> impl Iterator<Item = Result<Value, TransformError>> + '_ {
    serde_yaml::Deserializer::from_str(content)
        .map(|document| Value::deserialize(document).map_err(TransformError::Decode))
}

fn render(secured: &SecuredWorkload, out: &mut String) -> Result<(), TransformError> {
    let config_map = serde_yaml::to_string(&secured.config_map).map_err(|source| {
        TransformError::Encode {
            what: "ConfigMap",
            source,
        }
    })?;
    let secure_container =
        serde_yaml::to_string(&secured.secure_container).map_err(|source| {
            TransformError::Encode {
                what: "SecureContainer",
                source,
            }
        })?;

    out.push_str("---\n");
    out.push_str(&config_map);
    out.push_str("---\n");
    out.push_str(&secure_container);
    Ok(())
}

/// Record a generated `(namespace, name)` pair; `false` if it was already seen
fn note_generated(seen: &mut HashSet<(Option<String>, String)>, secured: &SecuredWorkload) -> bool {
    seen.insert((
        secured.config_map.namespace(),
        secured.secure_container.name_any(),
    ))
}

/// Secures every workload in a manifest file
///
/// Holds everything shared read-only between workers: the kind registry,
/// the transform settings, and the encryption gateway.
#[derive(Debug)]
pub struct ManifestTransformer {
    registry: KindRegistry,
    config: TransformConfig,
    encryptor: Box<dyn Encryptor>,
}

impl ManifestTransformer {
    #[must_use]
    pub fn new(
        registry: KindRegistry,
        config: TransformConfig,
        encryptor: impl Encryptor + 'static,
    ) -> Self {
        Self {
            registry,
            config,
            encryptor: Box::new(encryptor),
        }
    }

    #[must_use]
    pub fn config(&self) -> &TransformConfig {
        &self.config
    }

    /// Transform the documents of one manifest
    ///
    /// Returns `None` when no document could be processed.
    ///
    /// # Errors
    ///
    /// Fails on the first document that cannot be decoded or secured;
    /// unregistered kinds are skipped instead.
    pub fn transform_str(&self, content: &str) -> Result<Option<String>, TransformError> {
        let mut output = String::new();
        let mut secured_count = 0usize;
        let mut generated = HashSet::new();

        for document in documents(content) {
            let workload = match self.registry.decode(document?) {
                Ok(Some(workload)) => workload,
                Ok(None) => continue,
                Err(e) if e.is_skippable() => {
                    warn!("Skipping document: {}", e);
                    continue;
                }
                Err(e) => return Err(e),
            };

            let secured = secure_workload(workload, &self.config, self.encryptor.as_ref())?;
            if !note_generated(&mut generated, &secured) {
                warn!(
                    "Generated names {} and {} repeat within this manifest and will clash when applied",
                    secured.secure_container.name_any(),
                    secured.config_map.name_any()
                );
            }
            render(&secured, &mut output)?;
            secured_count += 1;
        }

        Ok((secured_count > 0).then_some(output))
    }

    /// Transform one manifest file and write its secured form
    ///
    /// Returns the output path, or `None` when the file was skipped because it
    /// held no processable document.
    ///
    /// # Errors
    ///
    /// Returns [`TransformError::Io`] when the file cannot be read or the
    /// output cannot be written, plus any error from [`Self::transform_str`].
    pub fn process_file(
        &self,
        path: &Path,
        output_dir: Option<&Path>,
    ) -> Result<Option<PathBuf>, TransformError> {
        info!("Processing {}...", path.display());

        let content = std::fs::read_to_string(path).map_err(|e| TransformError::io(path, e))?;
        let Some(rendered) = self.transform_str(&content)? else {
            warn!(
                "No supported workloads in {}, nothing written",
                path.display()
            );
            return Ok(None);
        };

        let target = output_path(path, output_dir);
        write_atomic(&target, &rendered)?;

        info!("Wrote to {}", target.display());
        info!("Processing {}...: DONE", path.display());
        Ok(Some(target))
    }
}

/// One decrypted entry of a generated ConfigMap
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecryptedEntry {
    pub config_map: String,
    pub container: String,
    pub plaintext: String,
}

/// Decrypt every entry of the generated ConfigMaps in a secured manifest
///
/// Only ConfigMaps named `secure-configmap-*` are considered; all other
/// documents are ignored.
///
/// # Errors
///
/// Fails when a document cannot be decoded or an entry does not decrypt.
pub fn decrypt_config_maps(
    content: &str,
    decryptor: &AesGcmEncryptor,
) -> Result<Vec<DecryptedEntry>, TransformError> {
    let mut entries = Vec::new();

    for document in documents(content) {
        let document = document?;
        if document.get("kind").and_then(Value::as_str) != Some("ConfigMap") {
            continue;
        }
        let config_map: ConfigMap =
            serde_yaml::from_value(document).map_err(TransformError::Decode)?;
        let name = config_map.name_any();
        if !name.starts_with(CONFIG_MAP_PREFIX) {
            continue;
        }

        for (container, ciphertext) in config_map.data.unwrap_or_default() {
            let plaintext =
                decryptor
                    .decrypt(&ciphertext)
                    .map_err(|source| TransformError::Encryption {
                        container: container.clone(),
                        source,
                    })?;
            entries.push(DecryptedEntry {
                config_map: name.clone(),
                container,
                plaintext: String::from_utf8_lossy(&plaintext).into_owned(),
            });
        }
    }

    Ok(entries)
}
