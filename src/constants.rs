//! # Constants
//!
//! Shared constants used throughout the transformer.
//!
//! Names and paths in this module are part of the contract with the secure
//! runtime agent, which looks for its configuration at a fixed location.

/// Prefix for every generated resource name
pub const SECURE_PREFIX: &str = "secure-";

/// Prefix of the companion ConfigMap name (`secure-configmap-<workload>`)
pub const CONFIG_MAP_PREFIX: &str = "secure-configmap-";

/// Prefix of the per-container volume name (`secure-volume-<container>`)
pub const VOLUME_PREFIX: &str = "secure-volume-";

/// Directory the encrypted container configuration is mounted at
pub const SECURE_MOUNT_PATH: &str = "/etc/raksh";

/// File name of the encrypted configuration inside [`SECURE_MOUNT_PATH`]
pub const SECURE_CONFIG_FILE: &str = "raksh.properties";

/// Placeholder image used when masking containers
pub const DEFAULT_SCRATCH_IMAGE: &str = "scratch";

/// Suffix inserted before the extension of every output file
pub const OUTPUT_FILE_SUFFIX: &str = "-sc";

/// Manifest file extensions picked up during discovery
pub const MANIFEST_EXTENSIONS: [&str; 2] = ["yaml", "yml"];

/// Default pod-spec location for structurally compatible kinds
pub const DEFAULT_POD_SPEC_PATH: &[&str] = &["spec", "template", "spec"];

/// Pod-spec location for batch kinds that nest a job template
pub const JOB_TEMPLATE_POD_SPEC_PATH: &[&str] =
    &["spec", "jobTemplate", "spec", "template", "spec"];

/// SecureContainer API group
pub const SECURE_CONTAINER_GROUP: &str = "securecontainers.k8s.io";

/// SecureContainer API version
pub const SECURE_CONTAINER_VERSION: &str = "v1alpha1";

/// SecureContainer `apiVersion` (`<group>/<version>`)
pub const SECURE_CONTAINER_API_VERSION: &str = "securecontainers.k8s.io/v1alpha1";

/// SecureContainer kind
pub const SECURE_CONTAINER_KIND: &str = "SecureContainer";

/// AES-256 key length in bytes
pub const KEY_LEN: usize = 32;

/// AES-GCM nonce length in bytes
pub const NONCE_LEN: usize = 12;

/// Environment variables injected when a Vault secret is configured,
/// paired with the key they read from that secret
pub const VAULT_ENV_KEYS: [(&str, &str); 4] = [
    ("SC_VAULT_ADDR", "vaultAdd"),
    ("SC_VAULT_TOKEN", "vaultToken"),
    ("SC_VAULT_SECRET", "secretName"),
    ("SC_VAULT_SYMM_KEY", "keyName"),
];
