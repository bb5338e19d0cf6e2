//! # Vault Secret Injector
//!
//! Gives every container the references it needs to reach Vault at run time.
//! Must run after masking, which clears the environment.

use crate::constants::VAULT_ENV_KEYS;
use k8s_openapi::api::core::v1::{EnvVar, EnvVarSource, PodSpec, SecretKeySelector};

fn vault_env(secret_name: &str) -> Vec<EnvVar> {
    VAULT_ENV_KEYS
        .iter()
        .map(|(env_name, key)| EnvVar {
            name: (*env_name).to_string(),
            value_from: Some(EnvVarSource {
                secret_key_ref: Some(SecretKeySelector {
                    name: secret_name.to_string(),
                    key: (*key).to_string(),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            ..Default::default()
        })
        .collect()
}

/// Append the Vault environment references to every container
pub fn insert_vault_secret(pod_spec: &mut PodSpec, secret_name: &str) {
    let env = vault_env(secret_name);
    for container in &mut pod_spec.containers {
        container
            .env
            .get_or_insert_with(Vec::new)
            .extend(env.iter().cloned());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::core::v1::Container;

    #[test]
    fn test_insert_vault_secret() {
        let mut pod_spec = PodSpec {
            containers: vec![
                Container {
                    name: "a".to_string(),
                    ..Default::default()
                },
                Container {
                    name: "b".to_string(),
                    ..Default::default()
                },
            ],
            ..Default::default()
        };

        insert_vault_secret(&mut pod_spec, "vault-creds");

        for container in &pod_spec.containers {
            let env = container.env.as_ref().unwrap();
            let pairs: Vec<(&str, &str, &str)> = env
                .iter()
                .map(|var| {
                    let selector = var
                        .value_from
                        .as_ref()
                        .and_then(|source| source.secret_key_ref.as_ref())
                        .unwrap();
                    (var.name.as_str(), selector.name.as_str(), selector.key.as_str())
                })
                .collect();
            assert_eq!(
                pairs,
                vec![
                    ("SC_VAULT_ADDR", "vault-creds", "vaultAdd"),
                    ("SC_VAULT_TOKEN", "vault-creds", "vaultToken"),
                    ("SC_VAULT_SECRET", "vault-creds", "secretName"),
                    ("SC_VAULT_SYMM_KEY", "vault-creds", "keyName"),
                ]
            );
        }
    }

    #[test]
    fn test_vault_vars_carry_no_literal_values() {
        let mut pod_spec = PodSpec {
            containers: vec![Container {
                name: "a".to_string(),
                ..Default::default()
            }],
            ..Default::default()
        };
        insert_vault_secret(&mut pod_spec, "vault-creds");
        assert!(pod_spec.containers[0]
            .env
            .as_ref()
            .unwrap()
            .iter()
            .all(|var| var.value.is_none()));
    }
}
