//! # rakshctl
//!
//! Rewrites Kubernetes workload manifests for confidential-computing runtimes.
//!
//! Every supported workload (Pod, Deployment, CronJob and any registered
//! structurally compatible kind) is turned into two resources:
//!
//! 1. **A ConfigMap** holding one encrypted blob per container with the
//!    container's image, command, arguments, environment, ports and resources
//! 2. **A SecureContainer** wrapping the workload after those fields have been
//!    scrubbed and the ConfigMap has been mounted into every container
//!
//! Only the secure runtime, which holds the key, can reconstruct the original
//! containers.
//!
//! ## Layout
//!
//! - [`workload`]: decoding and pod-spec access per kind
//! - [`secure`]: the individual securing steps
//! - [`transform`]: the ordered per-workload pipeline
//! - [`manifest`]: file discovery, multi-document handling and output
//! - [`runner`]: bounded parallel processing of many files

pub mod config;
pub mod constants;
pub mod crypto;
pub mod error;
pub mod manifest;
pub mod runner;
pub mod secure;
pub mod transform;
pub mod workload;

pub use config::{LogConfig, LogFormat, RunConfig, TransformConfig};
pub use crypto::{AesGcmEncryptor, Encryptor, SymmetricKey};
pub use error::TransformError;
pub use manifest::ManifestTransformer;
pub use runner::{run, FileOutcome, FileReport, RunReport};
pub use transform::{secure_workload, SecuredWorkload};
pub use workload::{KindRegistry, KindSpec, Workload};
