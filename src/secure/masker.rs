//! # Sensitive Data Masker
//!
//! Scrubs every container of a pod spec once its secrets have been sealed.

use k8s_openapi::api::core::v1::PodSpec;

/// Replace each image with `scratch_image` and drop command, args, and env
///
/// Containers are mutated in place so their order and every other field
/// (ports, health checks, mounts, ...) are preserved.
pub fn mask_sensitive_data(pod_spec: &mut PodSpec, scratch_image: &str) {
    for container in &mut pod_spec.containers {
        container.image = Some(scratch_image.to_string());
        container.command = None;
        container.args = None;
        container.env = None;
    }
}
