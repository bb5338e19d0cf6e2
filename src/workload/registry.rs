//! # Kind Registry
//!
//! Maps `apiVersion`/`kind` to the accessor that knows where the pod spec lives.
//!
//! Documents whose kind is not registered are reported as
//! [`TransformError::UnregisteredKind`] and skipped by the caller. Additional
//! structurally compatible kinds can be registered at run time with a
//! [`KindSpec`] such as `example.com/v1/Workflow=spec.template.spec`.

use crate::constants::{DEFAULT_POD_SPEC_PATH, JOB_TEMPLATE_POD_SPEC_PATH};
use crate::error::TransformError;
use crate::workload::generic::{FieldPath, FieldPathError, GenericWorkload};
use crate::workload::Workload;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::batch::v1::CronJob;
use k8s_openapi::api::core::v1::Pod;
use kube::core::{GroupVersionKind, TypeMeta};
use serde_yaml::Value;
use std::collections::HashMap;
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

/// How the pod spec of a registered kind is reached
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Accessor {
    /// Typed `batch/v1` CronJob
    CronJob,
    /// Typed `v1` Pod
    Pod,
    /// Typed `apps/v1` Deployment
    Deployment,
    /// Generic document navigated by field path
    Structural(FieldPath),
}

/// Build a [`GroupVersionKind`] from an `apiVersion` string and a kind
#[must_use]
pub fn gvk_from(api_version: &str, kind: &str) -> GroupVersionKind {
    let (group, version) = api_version.split_once('/').unwrap_or(("", api_version));
    GroupVersionKind {
        group: group.to_string(),
        version: version.to_string(),
        kind: kind.to_string(),
    }
}

fn gvk_of<K: k8s_openapi::Resource>() -> GroupVersionKind {
    gvk_from(K::API_VERSION, K::KIND)
}

/// Error parsing a [`KindSpec`]
#[derive(Debug, Error)]
pub enum KindSpecError {
    #[error("expected <apiVersion>/<Kind>[=<field.path>], got '{0}'")]
    Format(String),
    #[error(transparent)]
    Path(#[from] FieldPathError),
}

/// A user-supplied structural kind registration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KindSpec {
    pub gvk: GroupVersionKind,
    pub pod_spec_path: FieldPath,
}

impl FromStr for KindSpec {
    type Err = KindSpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (type_part, path) = match s.split_once('=') {
            Some((type_part, path)) => (type_part, path.parse()?),
            None => (s, FieldPath::from_segments(DEFAULT_POD_SPEC_PATH)),
        };
        let (api_version, kind) = type_part
            .trim()
            .rsplit_once('/')
            .filter(|(api_version, kind)| !api_version.is_empty() && !kind.is_empty())
            .ok_or_else(|| KindSpecError::Format(s.to_string()))?;

        Ok(Self {
            gvk: gvk_from(api_version, kind),
            pod_spec_path: path,
        })
    }
}

/// Registered workload kinds
#[derive(Debug, Clone)]
pub struct KindRegistry {
    kinds: HashMap<GroupVersionKind, Accessor>,
}

impl Default for KindRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl KindRegistry {
    /// Registry with no kinds at all
    #[must_use]
    pub fn empty() -> Self {
        Self {
            kinds: HashMap::new(),
        }
    }

    /// Registry with every kind this tool knows out of the box
    #[must_use]
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        registry.register(gvk_of::<CronJob>(), Accessor::CronJob);
        registry.register(gvk_of::<Pod>(), Accessor::Pod);
        registry.register(gvk_of::<Deployment>(), Accessor::Deployment);

        let template_kinds = [
            ("apps/v1", "StatefulSet"),
            ("apps/v1", "DaemonSet"),
            ("apps/v1", "ReplicaSet"),
            ("v1", "ReplicationController"),
            ("batch/v1", "Job"),
        ];
        let job_template_kinds = [("batch/v1beta1", "CronJob"), ("batch/v2alpha1", "CronJob")];

        for (segments, kinds) in [
            (DEFAULT_POD_SPEC_PATH, template_kinds.as_slice()),
            (JOB_TEMPLATE_POD_SPEC_PATH, job_template_kinds.as_slice()),
        ] {
            let path = FieldPath::from_segments(segments);
            for (api_version, kind) in kinds {
                registry.register(
                    gvk_from(api_version, kind),
                    Accessor::Structural(path.clone()),
                );
            }
        }
        registry
    }

    /// Register (or replace) the accessor for a kind
    pub fn register(&mut self, gvk: GroupVersionKind, accessor: Accessor) -> Option<Accessor> {
        self.kinds.insert(gvk, accessor)
    }

    /// Register a user-supplied structural kind
    pub fn register_spec(&mut self, spec: KindSpec) -> Option<Accessor> {
        debug!(
            "Registering structural kind {}/{} with pod spec at {}",
            spec.gvk.group, spec.gvk.kind, spec.pod_spec_path
        );
        self.register(spec.gvk, Accessor::Structural(spec.pod_spec_path))
    }

    #[must_use]
    pub fn lookup(&self, type_meta: &TypeMeta) -> Option<&Accessor> {
        self.kinds
            .get(&gvk_from(&type_meta.api_version, &type_meta.kind))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    /// Decode one YAML document into a [`Workload`]
    ///
    /// Returns `Ok(None)` for empty documents. Documents without a registered
    /// `apiVersion`/`kind` (including ones with no type information at all)
    /// fail with [`TransformError::UnregisteredKind`].
    ///
    /// # Errors
    ///
    /// Besides unregistered kinds, non-mapping documents are a
    /// [`TransformError::ShapeMismatch`] and malformed typed objects a
    /// [`TransformError::Decode`].
    pub fn decode(&self, document: Value) -> Result<Option<Workload>, TransformError> {
        let mapping = match document {
            Value::Null => return Ok(None),
            Value::Mapping(mapping) => mapping,
            _ => return Err(TransformError::shape("<unknown>", "document is not a mapping")),
        };

        let field = |name: &str| {
            mapping
                .get(name)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        let type_meta = TypeMeta {
            api_version: field("apiVersion"),
            kind: field("kind"),
        };

        let Some(accessor) = self.lookup(&type_meta) else {
            return Err(TransformError::UnregisteredKind {
                api_version: type_meta.api_version,
                kind: type_meta.kind,
            });
        };

        let workload = match accessor {
            Accessor::CronJob => Workload::CronJob(typed(mapping)?),
            Accessor::Pod => Workload::Pod(typed(mapping)?),
            Accessor::Deployment => Workload::Deployment(typed(mapping)?),
            Accessor::Structural(path) => Workload::Generic(GenericWorkload::new(
                gvk_from(&type_meta.api_version, &type_meta.kind),
                mapping,
                path.clone(),
            )),
        };
        Ok(Some(workload))
    }
}

fn typed<K: serde::de::DeserializeOwned>(mapping: serde_yaml::Mapping) -> Result<K, TransformError> {
    serde_yaml::from_value(Value::Mapping(mapping)).map_err(TransformError::Decode)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(yaml: &str) -> Result<Option<Workload>, TransformError> {
        KindRegistry::builtin().decode(serde_yaml::from_str(yaml).unwrap())
    }

    mod kind_spec_tests {
        use super::*;

        #[test]
        fn test_parse_with_default_path() {
            let spec: KindSpec = "example.com/v1/Workflow".parse().unwrap();
            assert_eq!(spec.gvk.group, "example.com");
            assert_eq!(spec.gvk.version, "v1");
            assert_eq!(spec.gvk.kind, "Workflow");
            assert_eq!(spec.pod_spec_path.to_string(), "spec.template.spec");
        }

        #[test]
        fn test_parse_with_explicit_path() {
            let spec: KindSpec = "v1/Runner=spec.podSpec".parse().unwrap();
            assert_eq!(spec.gvk.group, "");
            assert_eq!(spec.gvk.version, "v1");
            assert_eq!(spec.pod_spec_path.to_string(), "spec.podSpec");
        }

        #[test]
        fn test_parse_errors() {
            assert!(matches!(
                "Workflow".parse::<KindSpec>(),
                Err(KindSpecError::Format(_))
            ));
            assert!(matches!(
                "v1/Runner=spec..x".parse::<KindSpec>(),
                Err(KindSpecError::Path(_))
            ));
        }
    }

    mod registry_tests {
        use super::*;

        #[test]
        fn test_builtin_kinds() {
            let registry = KindRegistry::builtin();
            let lookup = |api_version: &str, kind: &str| {
                registry
                    .lookup(&TypeMeta {
                        api_version: api_version.to_string(),
                        kind: kind.to_string(),
                    })
                    .cloned()
            };

            assert_eq!(lookup("v1", "Pod"), Some(Accessor::Pod));
            assert_eq!(lookup("apps/v1", "Deployment"), Some(Accessor::Deployment));
            assert_eq!(lookup("batch/v1", "CronJob"), Some(Accessor::CronJob));
            assert_eq!(
                lookup("batch/v2alpha1", "CronJob"),
                Some(Accessor::Structural(FieldPath::from_segments(
                    JOB_TEMPLATE_POD_SPEC_PATH
                )))
            );
            assert_eq!(
                lookup("v1", "ReplicationController"),
                Some(Accessor::Structural(FieldPath::from_segments(
                    DEFAULT_POD_SPEC_PATH
                )))
            );
            assert_eq!(lookup("v1", "Service"), None);
            assert_eq!(registry.len(), 10);
        }

        #[test]
        fn test_register_custom_kind() {
            let mut registry = KindRegistry::builtin();
            registry.register_spec("example.com/v1/Workflow".parse().unwrap());
            let doc = serde_yaml::from_str(
                "apiVersion: example.com/v1\nkind: Workflow\nmetadata:\n  name: wf\nspec:\n  template:\n    spec:\n      containers:\n      - name: step\n",
            )
            .unwrap();
            let workload = registry.decode(doc).unwrap().unwrap();
            assert_eq!(workload.kind(), "Workflow");
            assert!(matches!(workload, Workload::Generic(_)));
        }
    }

    mod decode_tests {
        use super::*;

        #[test]
        fn test_decode_typed_deployment() {
            let workload = decode(
                "apiVersion: apps/v1\nkind: Deployment\nmetadata:\n  name: web\nspec:\n  selector: {}\n  template:\n    spec:\n      containers:\n      - name: api\n        image: myapp:1.0\n",
            )
            .unwrap()
            .unwrap();
            assert!(matches!(workload, Workload::Deployment(_)));
        }

        #[test]
        fn test_decode_structural_stateful_set() {
            let workload = decode(
                "apiVersion: apps/v1\nkind: StatefulSet\nmetadata:\n  name: db\nspec:\n  template:\n    spec:\n      containers: []\n",
            )
            .unwrap()
            .unwrap();
            assert!(matches!(workload, Workload::Generic(_)));
            assert_eq!(workload.kind(), "StatefulSet");
        }

        #[test]
        fn test_decode_unregistered_kind() {
            let err = decode("apiVersion: v1\nkind: Service\nmetadata:\n  name: svc\n").unwrap_err();
            assert!(err.is_skippable());
        }

        #[test]
        fn test_decode_without_type_meta_is_unregistered() {
            let err = decode("replicaCount: 3\n").unwrap_err();
            assert!(matches!(err, TransformError::UnregisteredKind { .. }));
        }

        #[test]
        fn test_decode_empty_document() {
            assert!(KindRegistry::builtin().decode(Value::Null).unwrap().is_none());
        }

        #[test]
        fn test_decode_scalar_document() {
            let err = KindRegistry::builtin()
                .decode(Value::from("just a string"))
                .unwrap_err();
            assert!(matches!(err, TransformError::ShapeMismatch { .. }));
        }

        #[test]
        fn test_decode_malformed_typed_object() {
            let err = decode("apiVersion: v1\nkind: Pod\nmetadata:\n  name: p\nspec:\n  containers: 5\n")
                .unwrap_err();
            assert!(matches!(err, TransformError::Decode(_)));
        }
    }
}
