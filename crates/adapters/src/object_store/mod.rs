// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Object storage holding uploaded tool source bundles

mod local;

pub use local::LocalObjectStore;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeObjectStore, ObjectCall};

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

/// Errors from object store operations
#[derive(Debug, Error)]
pub enum ObjectStoreError {
    #[error("object not found: {0}")]
    NotFound(String),
    #[error("invalid object key: {0}")]
    InvalidKey(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Key-addressed blob storage
#[async_trait]
pub trait ObjectStore: Clone + Send + Sync + 'static {
    async fn get(&self, key: &str) -> Result<Vec<u8>, ObjectStoreError>;

    async fn put(&self, key: &str, data: Vec<u8>) -> Result<(), ObjectStoreError>;

    /// Copy the object to `dest`, returning the number of bytes written
    async fn download(&self, key: &str, dest: &Path) -> Result<u64, ObjectStoreError>;
}

/// Reject keys that could escape the bucket
pub(crate) fn validate_key(key: &str) -> Result<(), ObjectStoreError> {
    use std::path::Component;

    let path = Path::new(key);
    let escapes = path
        .components()
        .any(|c| !matches!(c, Component::Normal(_)));
    if key.is_empty() || key.ends_with('/') || escapes {
        return Err(ObjectStoreError::InvalidKey(key.to_string()));
    }
    Ok(())
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
