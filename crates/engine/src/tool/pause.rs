// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! pause_marked → pausing → paused

use super::{ignore_not_found, workload_name};
use crate::error::HandlerError;
use crate::handler::Handler;
use async_trait::async_trait;
use kiln_adapters::{Orchestrator, WorkloadHandle};
use kiln_core::{DeployConfig, Resource, ToolPayload};

/// Scales the workload to zero; the workload itself is kept
pub struct PauseHandler<R> {
    orchestrator: R,
    deploy: DeployConfig,
}

impl<R: Orchestrator> PauseHandler<R> {
    pub fn new(orchestrator: R, deploy: DeployConfig) -> Self {
        Self {
            orchestrator,
            deploy,
        }
    }
}

#[async_trait]
impl<R: Orchestrator> Handler<ToolPayload> for PauseHandler<R> {
    async fn handle(&self, resource: &mut Resource<ToolPayload>) -> Result<(), HandlerError> {
        let handle = WorkloadHandle::new(workload_name(&resource.id), &self.deploy.namespace);
        ignore_not_found(self.orchestrator.scale_workload(&handle, 0).await)?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "pause_tests.rs"]
mod tests;
