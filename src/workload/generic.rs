//! # Generic Workloads
//!
//! Structural access to workload kinds without a dedicated typed variant.
//!
//! The document is kept as an ordered YAML mapping so that fields this tool
//! knows nothing about survive the round trip. Metadata is looked up by name
//! and the pod spec by a [`FieldPath`] such as `spec.template.spec`. Only the
//! pod spec is materialized into a typed [`PodSpec`]; it is written back into
//! the same slot when the workload is serialized.

use crate::error::TransformError;
use crate::workload::WorkloadParts;
use k8s_openapi::api::core::v1::PodSpec;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::core::GroupVersionKind;
use serde::ser::Error as _;
use serde::{Serialize, Serializer};
use serde_yaml::{Mapping, Value};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error parsing a [`FieldPath`]
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid field path '{0}': segments must be non-empty and dot-separated")]
pub struct FieldPathError(String);

/// Dot-separated path into a YAML document
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldPath(Vec<String>);

impl FromStr for FieldPath {
    type Err = FieldPathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let segments: Vec<String> = s.split('.').map(str::to_string).collect();
        if segments.iter().any(String::is_empty) {
            return Err(FieldPathError(s.to_string()));
        }
        Ok(Self(segments))
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("."))
    }
}

impl FieldPath {
    /// Path from segments known to be non-empty
    pub(crate) fn from_segments(segments: &[&str]) -> Self {
        Self(segments.iter().map(|segment| (*segment).to_string()).collect())
    }

    /// Path made of the first `len` segments, used in error messages
    fn prefix(&self, len: usize) -> String {
        self.0[..len].join(".")
    }

    /// Find the value at this path
    ///
    /// # Errors
    ///
    /// A missing or null segment yields the path up to and including it.
    pub fn lookup<'a>(&self, root: &'a Mapping) -> Result<&'a Value, String> {
        let mut current = root;
        for (index, segment) in self.0.iter().enumerate() {
            let value = current
                .get(segment.as_str())
                .filter(|v| !v.is_null())
                .ok_or_else(|| self.prefix(index + 1))?;
            if index + 1 == self.0.len() {
                return Ok(value);
            }
            current = value.as_mapping().ok_or_else(|| self.prefix(index + 1))?;
        }
        Err(String::new())
    }

    /// Overwrite the value at this path, which must already exist
    ///
    /// # Errors
    ///
    /// Yields the first path prefix that is missing or not a mapping.
    pub fn replace(&self, root: &mut Mapping, new_value: Value) -> Result<(), String> {
        let Some((last, parents)) = self.0.split_last() else {
            return Err(String::new());
        };

        let mut current = root;
        for (index, segment) in parents.iter().enumerate() {
            current = current
                .get_mut(segment.as_str())
                .and_then(Value::as_mapping_mut)
                .ok_or_else(|| self.prefix(index + 1))?;
        }

        let slot = current
            .get_mut(last.as_str())
            .ok_or_else(|| self.to_string())?;
        *slot = new_value;
        Ok(())
    }
}

#[derive(Debug, Clone)]
struct Resolved {
    metadata: ObjectMeta,
    pod_spec: PodSpec,
}

/// A workload of a structurally compatible, registered kind
#[derive(Debug, Clone)]
pub struct GenericWorkload {
    gvk: GroupVersionKind,
    document: Mapping,
    pod_spec_path: FieldPath,
    resolved: Option<Resolved>,
}

impl GenericWorkload {
    #[must_use]
    pub fn new(gvk: GroupVersionKind, document: Mapping, pod_spec_path: FieldPath) -> Self {
        Self {
            gvk,
            document,
            pod_spec_path,
            resolved: None,
        }
    }

    #[must_use]
    pub fn gvk(&self) -> &GroupVersionKind {
        &self.gvk
    }

    #[must_use]
    pub fn pod_spec_path(&self) -> &FieldPath {
        &self.pod_spec_path
    }

    /// Locate metadata and pod spec, materializing them on first access
    ///
    /// # Errors
    ///
    /// Returns [`TransformError::ShapeMismatch`] when metadata or the pod
    /// spec is absent, and [`TransformError::Decode`] when either is malformed.
    pub fn parts_mut(&mut self) -> Result<WorkloadParts<'_>, TransformError> {
        let resolved = match self.resolved.take() {
            Some(resolved) => resolved,
            None => resolve(&self.gvk.kind, &self.document, &self.pod_spec_path)?,
        };
        let resolved = self.resolved.insert(resolved);
        Ok(WorkloadParts {
            metadata: &resolved.metadata,
            pod_spec: &mut resolved.pod_spec,
        })
    }
}

fn resolve(kind: &str, document: &Mapping, path: &FieldPath) -> Result<Resolved, TransformError> {
    let metadata = match document.get("metadata") {
        Some(value) if !value.is_null() => {
            serde_yaml::from_value::<ObjectMeta>(value.clone()).map_err(TransformError::Decode)?
        }
        _ => return Err(TransformError::shape(kind, "metadata is required value")),
    };

    let pod_spec = path
        .lookup(document)
        .map_err(|missing| TransformError::shape(kind, format!("{missing} is required value")))?;
    let pod_spec =
        serde_yaml::from_value::<PodSpec>(pod_spec.clone()).map_err(TransformError::Decode)?;

    Ok(Resolved { metadata, pod_spec })
}

impl Serialize for GenericWorkload {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let Some(resolved) = &self.resolved else {
            return self.document.serialize(serializer);
        };

        let mut document = self.document.clone();
        let pod_spec = serde_yaml::to_value(&resolved.pod_spec).map_err(S::Error::custom)?;
        self.pod_spec_path
            .replace(&mut document, pod_spec)
            .map_err(|missing| S::Error::custom(format!("{missing} disappeared from document")))?;
        document.serialize(serializer)
    }
}
