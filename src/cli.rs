//! # rakshctl CLI
//!
//! Command-line definitions.
//!
//! ## Usage
//!
//! ```bash
//! # Secure every manifest under ./deploy, writing next to the inputs
//! rakshctl app create -f ./deploy -i raksh/secure-runtime:latest --key-file ./raksh.key
//!
//! # Write into a separate tree and inject Vault references
//! rakshctl app create -f ./deploy -i raksh/secure-runtime:latest \
//!     --key "$RAKSH_KEY" --output ./secured --vault-secret vault-creds
//!
//! # Treat a custom kind as a workload
//! rakshctl app create -f ./deploy -i raksh/secure-runtime:latest --key-file ./raksh.key \
//!     --workload-kind 'example.com/v1/Worker=spec.podTemplate.spec'
//!
//! # Check what a generated ConfigMap holds
//! rakshctl app decrypt -f ./deploy/web-sc.yaml --key-file ./raksh.key
//! ```

use clap::{Args, Parser, Subcommand};
use rakshctl::constants::DEFAULT_SCRATCH_IMAGE;
use rakshctl::crypto::{KeyError, SymmetricKey};
use rakshctl::KindSpec;
use std::path::PathBuf;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    "\ngit: ",
    env!("BUILD_GIT_HASH"),
    "\nbuilt: ",
    env!("BUILD_DATETIME"),
);

/// Secure Kubernetes workload manifests for confidential-computing runtimes
#[derive(Parser, Debug)]
#[command(name = "rakshctl", version, long_version = LONG_VERSION)]
#[command(
    after_help = "\
Supported workload kinds:
  v1/Pod, apps/v1/Deployment, batch/v1/CronJob
  apps/v1/StatefulSet, apps/v1/DaemonSet, apps/v1/ReplicaSet, v1/ReplicationController
  batch/v1/Job, batch/v1beta1/CronJob, batch/v2alpha1/CronJob
  and any kind added with --workload-kind
"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Work with application manifests
    #[command(subcommand)]
    App(AppCommands),
}

#[derive(Subcommand, Debug)]
pub enum AppCommands {
    /// Generate SecureContainer manifests from workload manifests
    Create(CreateArgs),
    /// Print the decrypted container configuration of generated ConfigMaps
    Decrypt(DecryptArgs),
}

/// Where the symmetric key comes from
#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
pub struct KeySource {
    /// Encryption key: base64 of 32 bytes, or a passphrase
    #[arg(long, env = "RAKSH_KEY", hide_env_values = true)]
    pub key: Option<String>,

    /// File containing the encryption key
    #[arg(long, env = "RAKSH_KEY_FILE")]
    pub key_file: Option<PathBuf>,
}

impl KeySource {
    /// Read the key from whichever source was given
    ///
    /// # Errors
    ///
    /// Propagates [`KeyError`] from reading or validating the material.
    pub fn load(&self) -> Result<SymmetricKey, KeyError> {
        match (&self.key, &self.key_file) {
            (Some(material), _) => SymmetricKey::from_material(material),
            (None, Some(path)) => SymmetricKey::from_file(path),
            (None, None) => Err(KeyError::Empty),
        }
    }
}

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Manifest file or directory to transform
    #[arg(short, long, env = "RAKSH_FILENAME")]
    pub filename: PathBuf,

    /// Trusted secure-runtime image referenced by every SecureContainer
    #[arg(short, long, env = "RAKSH_IMAGE")]
    pub image: String,

    /// Directory for generated files (defaults to next to each input)
    #[arg(short, long, env = "RAKSH_OUTPUT")]
    pub output: Option<PathBuf>,

    /// Placeholder image that replaces every container image
    #[arg(long, env = "RAKSH_SCRATCH_IMAGE", default_value = DEFAULT_SCRATCH_IMAGE)]
    pub scratch_image: String,

    #[command(flatten)]
    pub key: KeySource,

    /// Secret holding Vault connection details, injected into every container
    #[arg(long, env = "RAKSH_VAULT_SECRET")]
    pub vault_secret: Option<String>,

    /// Additional workload kind as <apiVersion>/<Kind>[=<pod.spec.path>]
    #[arg(long = "workload-kind", env = "RAKSH_WORKLOAD_KINDS", value_delimiter = ',')]
    pub workload_kinds: Vec<KindSpec>,

    /// Number of files processed in parallel
    #[arg(long, env = "RAKSH_WORKERS", value_parser = clap::value_parser!(u16).range(1..))]
    pub workers: Option<u16>,

    /// Continue with remaining files after a failure
    #[arg(long, env = "RAKSH_KEEP_GOING")]
    pub keep_going: bool,
}

#[derive(Args, Debug)]
pub struct DecryptArgs {
    /// Generated manifest file (`*-sc.yaml`)
    #[arg(short, long, env = "RAKSH_FILENAME")]
    pub filename: PathBuf,

    #[command(flatten)]
    pub key: KeySource,
}
