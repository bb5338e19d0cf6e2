//! Shared helpers for integration tests

#![allow(dead_code, reason = "Not every test binary uses every helper")]

use rakshctl::{AesGcmEncryptor, KindRegistry, ManifestTransformer, SymmetricKey, TransformConfig};
use serde_yaml::Value;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const SECURE_IMAGE: &str = "raksh/secure-runtime:1.0";
pub const KEY_MATERIAL: &str = "integration-test-passphrase";

pub fn encryptor() -> AesGcmEncryptor {
    AesGcmEncryptor::new(SymmetricKey::from_material(KEY_MATERIAL).unwrap())
}

pub fn transformer(config: TransformConfig) -> ManifestTransformer {
    ManifestTransformer::new(KindRegistry::builtin(), config, encryptor())
}

pub fn write(dir: &Path, relative: &str, content: &str) -> PathBuf {
    let path = dir.join(relative);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, content).unwrap();
    path
}

/// Split a generated file into its YAML documents
pub fn documents(content: &str) -> Vec<Value> {
    serde_yaml::Deserializer::from_str(content)
        .map(|document| Value::deserialize(document).unwrap())
        .collect()
}

pub const WEB_DEPLOYMENT: &str = r"apiVersion: apps/v1
kind: Deployment
metadata:
  name: web
  namespace: default
spec:
  replicas: 2
  selector:
    matchLabels:
      app: web
  template:
    metadata:
      labels:
        app: web
    spec:
      containers:
      - name: api
        image: myapp:1.0
        command: [/app/server]
        args: [--listen, ':8080']
        env:
        - name: DATABASE_URL
          value: postgres://user:pw@db/app
        ports:
        - containerPort: 8080
        resources:
          limits:
            cpu: 500m
            memory: 256Mi
";

pub const NIGHTLY_CRONJOB: &str = r"apiVersion: batch/v1
kind: CronJob
metadata:
  name: nightly
  namespace: jobs
spec:
  schedule: '0 2 * * *'
  jobTemplate:
    spec:
      template:
        spec:
          restartPolicy: OnFailure
          containers:
          - name: backup
            image: backup:2
            args: [--target, s3://bucket]
";
