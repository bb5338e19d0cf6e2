//! # Errors
//!
//! Error taxonomy for manifest transformation.
//!
//! Only [`TransformError::UnregisteredKind`] is skippable: the document is
//! dropped with a warning and processing continues. Every other variant is
//! fatal for the file it occurred in.

use crate::crypto::EncryptionError;
use std::path::PathBuf;
use thiserror::Error;

/// Error type for transforming a single manifest
#[derive(Debug, Error)]
pub enum TransformError {
    /// The document's `apiVersion`/`kind` has no registered accessor
    #[error("unsupported object type {api_version}/{kind}")]
    UnregisteredKind { api_version: String, kind: String },

    /// A recognized object lacks the expected metadata or pod-spec path
    #[error("{kind}: {reason}")]
    ShapeMismatch { kind: String, reason: String },

    /// The encryption gateway failed for a container
    #[error("failed to encrypt container '{container}': {source}")]
    Encryption {
        container: String,
        #[source]
        source: EncryptionError,
    },

    /// Reading, writing, or creating a path failed
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A document could not be decoded
    #[error("failed to decode manifest: {0}")]
    Decode(#[source] serde_yaml::Error),

    /// A generated object could not be encoded
    #[error("failed to encode {what}: {source}")]
    Encode {
        what: &'static str,
        #[source]
        source: serde_yaml::Error,
    },

    /// A worker task died before reporting a result
    #[error("worker task failed: {0}")]
    Worker(String),
}

impl TransformError {
    pub(crate) fn shape(kind: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ShapeMismatch {
            kind: kind.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Check if this error only skips the current document
    #[must_use]
    pub fn is_skippable(&self) -> bool {
        matches!(self, Self::UnregisteredKind { .. })
    }
}
