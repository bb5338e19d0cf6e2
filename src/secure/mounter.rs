//! # Secure Volume Mounter
//!
//! Mounts each container's entry of the companion ConfigMap as
//! `/etc/raksh/raksh.properties`, read-only.

use crate::constants::{SECURE_CONFIG_FILE, SECURE_MOUNT_PATH, VOLUME_PREFIX};
use k8s_openapi::api::core::v1::{ConfigMapVolumeSource, KeyToPath, PodSpec, Volume, VolumeMount};

/// Volume name for a container's secure configuration
#[must_use]
pub fn secure_volume_name(container_name: &str) -> String {
    format!("{VOLUME_PREFIX}{container_name}")
}

/// Append one ConfigMap-backed volume and one mount per container
pub fn mount_config_map(pod_spec: &mut PodSpec, config_map_name: &str) {
    let mut volumes = Vec::with_capacity(pod_spec.containers.len());

    for container in &mut pod_spec.containers {
        let volume_name = secure_volume_name(&container.name);

        volumes.push(Volume {
            name: volume_name.clone(),
            config_map: Some(ConfigMapVolumeSource {
                name: config_map_name.to_string(),
                items: Some(vec![KeyToPath {
                    key: container.name.clone(),
                    path: SECURE_CONFIG_FILE.to_string(),
                    ..Default::default()
                }]),
                ..Default::default()
            }),
            ..Default::default()
        });

        container
            .volume_mounts
            .get_or_insert_with(Vec::new)
            .push(VolumeMount {
                name: volume_name,
                mount_path: SECURE_MOUNT_PATH.to_string(),
                read_only: Some(true),
                ..Default::default()
            });
    }

    pod_spec.volumes.get_or_insert_with(Vec::new).extend(volumes);
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::core::v1::{Container, EmptyDirVolumeSource};

    fn pod_spec() -> PodSpec {
        PodSpec {
            containers: vec![
                Container {
                    name: "api".to_string(),
                    volume_mounts: Some(vec![VolumeMount {
                        name: "cache".to_string(),
                        mount_path: "/cache".to_string(),
                        ..Default::default()
                    }]),
                    ..Default::default()
                },
                Container {
                    name: "worker".to_string(),
                    ..Default::default()
                },
            ],
            volumes: Some(vec![Volume {
                name: "cache".to_string(),
                empty_dir: Some(EmptyDirVolumeSource::default()),
                ..Default::default()
            }]),
            ..Default::default()
        }
    }

    #[test]
    fn test_one_volume_and_mount_per_container() {
        let mut spec = pod_spec();
        mount_config_map(&mut spec, "secure-configmap-web");

        let volumes = spec.volumes.as_ref().unwrap();
        let names: Vec<&str> = volumes.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["cache", "secure-volume-api", "secure-volume-worker"]);

        for container in &spec.containers {
            let mount = container.volume_mounts.as_ref().unwrap().last().unwrap();
            assert_eq!(mount.name, format!("secure-volume-{}", container.name));
            assert_eq!(mount.mount_path, "/etc/raksh");
            assert_eq!(mount.read_only, Some(true));
        }
        // Existing mounts are kept ahead of the secure one
        assert_eq!(spec.containers[0].volume_mounts.as_ref().unwrap().len(), 2);
    }

    #[test]
    fn test_volume_references_container_key() {
        let mut spec = pod_spec();
        mount_config_map(&mut spec, "secure-configmap-web");

        let volume = spec
            .volumes
            .as_ref()
            .unwrap()
            .iter()
            .find(|v| v.name == "secure-volume-worker")
            .unwrap();
        let source = volume.config_map.as_ref().unwrap();
        assert_eq!(source.name, "secure-configmap-web");
        let items = source.items.as_ref().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].key, "worker");
        assert_eq!(items[0].path, "raksh.properties");
    }
}
