// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runtime cluster orchestration for deployed tools

mod noop;

pub use noop::NoOpOrchestrator;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeOrchestrator, FakeWorkload, OrchestratorCall, OrchestratorOp};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from orchestrator operations
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("already exists: {0}")]
    AlreadyExists(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("orchestrator API error: {0}")]
    Api(String),
}

/// Desired workload for one tool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkloadSpec {
    pub name: String,
    pub namespace: String,
    pub image: String,
    pub port: u16,
    #[serde(default)]
    pub env: Vec<(String, String)>,
}

impl WorkloadSpec {
    pub fn handle(&self) -> WorkloadHandle {
        WorkloadHandle::new(&self.name, &self.namespace)
    }
}

/// Reference to a workload and its endpoint
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkloadHandle {
    pub name: String,
    pub namespace: String,
}

impl WorkloadHandle {
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
        }
    }
}

/// Creates and removes workloads and their network endpoints
#[async_trait]
pub trait Orchestrator: Clone + Send + Sync + 'static {
    /// Fails with `AlreadyExists` when a workload of that name exists
    async fn create_workload(&self, spec: &WorkloadSpec)
        -> Result<WorkloadHandle, OrchestratorError>;

    async fn delete_workload(&self, handle: &WorkloadHandle) -> Result<(), OrchestratorError>;

    async fn scale_workload(
        &self,
        handle: &WorkloadHandle,
        replicas: u32,
    ) -> Result<(), OrchestratorError>;

    /// Expose the workload, returning its access address
    async fn create_endpoint(&self, handle: &WorkloadHandle) -> Result<String, OrchestratorError>;

    async fn delete_endpoint(&self, handle: &WorkloadHandle) -> Result<(), OrchestratorError>;
}
