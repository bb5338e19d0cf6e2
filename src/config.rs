//! # Configuration
//!
//! Explicit configuration threaded through a run.
//!
//! Nothing in the transformation reads global state: the CLI builds these
//! values once and hands them down. Logging settings come from environment
//! variables with defaults.

use crate::constants::DEFAULT_SCRATCH_IMAGE;
use std::path::PathBuf;
use std::str::FromStr;

/// Settings consumed while securing a single workload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformConfig {
    /// Trusted runtime image referenced by every `SecureContainer`
    pub secure_container_image: String,
    /// Placeholder image that replaces every container image
    pub scratch_image: String,
    /// Secret holding Vault connection details; enables env injection
    pub vault_secret: Option<String>,
}

impl TransformConfig {
    #[must_use]
    pub fn new(secure_container_image: impl Into<String>) -> Self {
        Self {
            secure_container_image: secure_container_image.into(),
            scratch_image: DEFAULT_SCRATCH_IMAGE.to_string(),
            vault_secret: None,
        }
    }

    #[must_use]
    pub fn with_scratch_image(mut self, scratch_image: impl Into<String>) -> Self {
        self.scratch_image = scratch_image.into();
        self
    }

    #[must_use]
    pub fn with_vault_secret(mut self, vault_secret: Option<String>) -> Self {
        self.vault_secret = vault_secret.filter(|name| !name.is_empty());
        self
    }
}

/// Settings for processing a set of manifest files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// Root directory for output files; next to the input when unset
    pub output_dir: Option<PathBuf>,
    /// Maximum number of files transformed concurrently
    pub workers: usize,
    /// Stop dispatching new files after the first failure
    pub fail_fast: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            output_dir: None,
            workers: default_workers(),
            fail_fast: true,
        }
    }
}

/// Number of workers when none is configured
#[must_use]
pub fn default_workers() -> usize {
    env_var_or_default(
        "RAKSH_WORKERS",
        std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get),
    )
    .max(1)
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "pretty" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format '{other}'")),
        }
    }
}

/// Logging settings loaded from environment variables
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Filter directive used when `RUST_LOG` is not set
    pub default_filter: String,
    pub format: LogFormat,
}

impl LogConfig {
    /// Load configuration from environment variables with defaults
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            default_filter: env_var_or_default_str("RAKSH_LOG_LEVEL", "rakshctl=info"),
            format: env_var_or_default("RAKSH_LOG_FORMAT", LogFormat::Text),
        }
    }
}

/// Read environment variable and parse it, or return default
fn env_var_or_default<T: FromStr>(key: &str, default: T) -> T
where
    <T as FromStr>::Err: std::fmt::Debug,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Read environment variable as string or return default
fn env_var_or_default_str(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
