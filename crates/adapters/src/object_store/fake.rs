// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake object store for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{validate_key, ObjectStore, ObjectStoreError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Recorded object store call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectCall {
    Get { key: String },
    Put { key: String, len: usize },
    Download { key: String, dest: PathBuf },
}

/// In-memory object store that records every call
#[derive(Clone, Default)]
pub struct FakeObjectStore {
    objects: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    calls: Arc<Mutex<Vec<ObjectCall>>>,
}

impl FakeObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an object without recording a call
    pub fn insert(&self, key: impl Into<String>, data: impl Into<Vec<u8>>) {
        self.objects
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.into(), data.into());
    }

    pub fn object(&self, key: &str) -> Option<Vec<u8>> {
        self.objects
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .cloned()
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<ObjectCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn record(&self, call: ObjectCall) {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(call);
    }
}

#[async_trait]
impl ObjectStore for FakeObjectStore {
    async fn get(&self, key: &str) -> Result<Vec<u8>, ObjectStoreError> {
        self.record(ObjectCall::Get {
            key: key.to_string(),
        });
        validate_key(key)?;
        self.object(key)
            .ok_or_else(|| ObjectStoreError::NotFound(key.to_string()))
    }

    async fn put(&self, key: &str, data: Vec<u8>) -> Result<(), ObjectStoreError> {
        self.record(ObjectCall::Put {
            key: key.to_string(),
            len: data.len(),
        });
        validate_key(key)?;
        self.insert(key, data);
        Ok(())
    }

    async fn download(&self, key: &str, dest: &Path) -> Result<u64, ObjectStoreError> {
        self.record(ObjectCall::Download {
            key: key.to_string(),
            dest: dest.to_path_buf(),
        });
        validate_key(key)?;
        let data = self
            .object(key)
            .ok_or_else(|| ObjectStoreError::NotFound(key.to_string()))?;
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(dest, &data).await?;
        Ok(data.len() as u64)
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
