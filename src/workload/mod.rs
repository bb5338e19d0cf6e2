//! # Workloads
//!
//! Decoded workload resources and uniform access to their pod spec.
//!
//! ## Supported Shapes
//!
//! - **Pod** (`v1`): pod spec at `spec`
//! - **Deployment** (`apps/v1`): pod spec at `spec.template.spec`
//! - **CronJob** (`batch/v1`): pod spec at `spec.jobTemplate.spec.template.spec`
//! - **Generic**: any other registered kind, navigated structurally by a
//!   configurable field path (see [`generic`])
//!
//! Which kinds exist at all is decided by the [`registry::KindRegistry`].

pub mod generic;
pub mod registry;

pub use generic::{FieldPath, GenericWorkload};
pub use registry::{Accessor, KindRegistry, KindSpec};

use crate::error::TransformError;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::batch::v1::CronJob;
use k8s_openapi::api::core::v1::{Pod, PodSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use serde::Serialize;

/// A decoded workload manifest
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Workload {
    CronJob(CronJob),
    Pod(Pod),
    Deployment(Deployment),
    Generic(GenericWorkload),
}

/// Borrowed view of a workload's metadata and its single pod spec
#[derive(Debug)]
pub struct WorkloadParts<'a> {
    pub metadata: &'a ObjectMeta,
    pub pod_spec: &'a mut PodSpec,
}

impl WorkloadParts<'_> {
    /// Workload name, which every generated resource name is derived from
    ///
    /// # Errors
    ///
    /// Returns [`TransformError::ShapeMismatch`] when the name is missing or empty.
    pub fn name(&self, kind: &str) -> Result<String, TransformError> {
        self.metadata
            .name
            .clone()
            .filter(|name| !name.is_empty())
            .ok_or_else(|| TransformError::shape(kind, "metadata.name is required value"))
    }
}

impl Workload {
    /// Resource kind, for diagnostics
    #[must_use]
    pub fn kind(&self) -> &str {
        match self {
            Self::CronJob(_) => <CronJob as k8s_openapi::Resource>::KIND,
            Self::Pod(_) => <Pod as k8s_openapi::Resource>::KIND,
            Self::Deployment(_) => <Deployment as k8s_openapi::Resource>::KIND,
            Self::Generic(generic) => generic.gvk().kind.as_str(),
        }
    }

    /// Locate the object metadata and the pod spec of this workload
    ///
    /// # Errors
    ///
    /// Fails with [`TransformError::ShapeMismatch`] when the kind-specific path
    /// to the pod spec is absent.
    pub fn parts_mut(&mut self) -> Result<WorkloadParts<'_>, TransformError> {
        let kind = self.kind().to_string();
        let missing = |path: &str| TransformError::shape(&kind, format!("{path} is required value"));

        match self {
            Self::CronJob(cron_job) => {
                let job_spec = cron_job
                    .spec
                    .as_mut()
                    .ok_or_else(|| missing("spec"))?
                    .job_template
                    .spec
                    .as_mut()
                    .ok_or_else(|| missing("spec.jobTemplate.spec"))?;
                let pod_spec = job_spec
                    .template
                    .spec
                    .as_mut()
                    .ok_or_else(|| missing("spec.jobTemplate.spec.template.spec"))?;
                Ok(WorkloadParts {
                    metadata: &cron_job.metadata,
                    pod_spec,
                })
            }
            Self::Pod(pod) => Ok(WorkloadParts {
                metadata: &pod.metadata,
                pod_spec: pod.spec.as_mut().ok_or_else(|| missing("spec"))?,
            }),
            Self::Deployment(deployment) => {
                let pod_spec = deployment
                    .spec
                    .as_mut()
                    .ok_or_else(|| missing("spec"))?
                    .template
                    .spec
                    .as_mut()
                    .ok_or_else(|| missing("spec.template.spec"))?;
                Ok(WorkloadParts {
                    metadata: &deployment.metadata,
                    pod_spec,
                })
            }
            Self::Generic(generic) => generic.parts_mut(),
        }
    }
}

impl From<CronJob> for Workload {
    fn from(value: CronJob) -> Self {
        Self::CronJob(value)
    }
}

impl From<Pod> for Workload {
    fn from(value: Pod) -> Self {
        Self::Pod(value)
    }
}

impl From<Deployment> for Workload {
    fn from(value: Deployment) -> Self {
        Self::Deployment(value)
    }
}

impl From<GenericWorkload> for Workload {
    fn from(value: GenericWorkload) -> Self {
        Self::Generic(value)
    }
}
