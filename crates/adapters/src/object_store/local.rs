// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Filesystem-backed object store

use super::{validate_key, ObjectStore, ObjectStoreError};
use async_trait::async_trait;
use kiln_core::ObjectsConfig;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Stores each object at `<root>/<bucket>/<key>`
#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    bucket_dir: PathBuf,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>, bucket: &str) -> Self {
        Self {
            bucket_dir: root.into().join(bucket),
        }
    }

    pub fn from_config(config: &ObjectsConfig) -> Self {
        Self::new(&config.root, &config.bucket)
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, ObjectStoreError> {
        validate_key(key)?;
        Ok(self.bucket_dir.join(key))
    }
}

fn not_found(key: &str) -> impl FnOnce(std::io::Error) -> ObjectStoreError + '_ {
    move |e| match e.kind() {
        ErrorKind::NotFound => ObjectStoreError::NotFound(key.to_string()),
        _ => ObjectStoreError::Io(e),
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn get(&self, key: &str) -> Result<Vec<u8>, ObjectStoreError> {
        let path = self.path_for(key)?;
        tokio::fs::read(&path).await.map_err(not_found(key))
    }

    async fn put(&self, key: &str, data: Vec<u8>) -> Result<(), ObjectStoreError> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        // write then rename so readers never see a partial object
        let tmp = path.with_extension("partial");
        tokio::fs::write(&tmp, data).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn download(&self, key: &str, dest: &Path) -> Result<u64, ObjectStoreError> {
        let path = self.path_for(key)?;
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::copy(&path, dest).await.map_err(not_found(key))
    }
}

#[cfg(test)]
#[path = "local_tests.rs"]
mod tests;
