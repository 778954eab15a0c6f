// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Orchestrator that only logs

use super::{Orchestrator, OrchestratorError, WorkloadHandle, WorkloadSpec};
use async_trait::async_trait;
use kiln_core::DeployConfig;

/// Accepts every request; endpoint addresses come from the configured template
#[derive(Debug, Clone)]
pub struct NoOpOrchestrator {
    deploy: DeployConfig,
}

impl NoOpOrchestrator {
    pub fn new(deploy: DeployConfig) -> Self {
        Self { deploy }
    }
}

#[async_trait]
impl Orchestrator for NoOpOrchestrator {
    async fn create_workload(
        &self,
        spec: &WorkloadSpec,
    ) -> Result<WorkloadHandle, OrchestratorError> {
        tracing::debug!(name = %spec.name, image = %spec.image, "noop create_workload");
        Ok(spec.handle())
    }

    async fn delete_workload(&self, handle: &WorkloadHandle) -> Result<(), OrchestratorError> {
        tracing::debug!(name = %handle.name, "noop delete_workload");
        Ok(())
    }

    async fn scale_workload(
        &self,
        handle: &WorkloadHandle,
        replicas: u32,
    ) -> Result<(), OrchestratorError> {
        tracing::debug!(name = %handle.name, replicas, "noop scale_workload");
        Ok(())
    }

    async fn create_endpoint(&self, handle: &WorkloadHandle) -> Result<String, OrchestratorError> {
        Ok(self.deploy.endpoint_for(&handle.name))
    }

    async fn delete_endpoint(&self, handle: &WorkloadHandle) -> Result<(), OrchestratorError> {
        tracing::debug!(name = %handle.name, "noop delete_endpoint");
        Ok(())
    }
}
