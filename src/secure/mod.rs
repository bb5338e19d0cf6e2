//! # Secure
//!
//! The per-container steps that turn a workload into its secured form.
//!
//! ## Steps
//!
//! 1. **Extract** each container's sensitive fields ([`extractor`])
//! 2. **Mask** the containers in place ([`masker`])
//! 3. **Mount** the companion ConfigMap into every container ([`mounter`])
//! 4. **Inject** Vault references, when configured ([`vault`])
//! 5. **Wrap** the result in a `SecureContainer` ([`wrapper`])
//!
//! The order is enforced by [`crate::transform`].

pub mod extractor;
pub mod masker;
pub mod mounter;
pub mod vault;
pub mod wrapper;

pub use extractor::{extract_container, ContainerSecrets, SecureContainerConfig};
pub use masker::mask_sensitive_data;
pub use mounter::{mount_config_map, secure_volume_name};
pub use vault::insert_vault_secret;
pub use wrapper::{
    config_map_name, new_config_map, new_secure_container, secure_container_name,
    SecureContainer, SecureContainerImageRef, SecureContainerSpec,
};
