// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! delete_marked → deleting → deleted

use super::{ignore_not_found, workload_name};
use crate::error::HandlerError;
use crate::handler::Handler;
use async_trait::async_trait;
use kiln_adapters::{Orchestrator, WorkloadHandle};
use kiln_core::{DeployConfig, Resource, ToolPayload};

pub struct DeleteHandler<R> {
    orchestrator: R,
    deploy: DeployConfig,
}

impl<R: Orchestrator> DeleteHandler<R> {
    pub fn new(orchestrator: R, deploy: DeployConfig) -> Self {
        Self {
            orchestrator,
            deploy,
        }
    }
}

#[async_trait]
impl<R: Orchestrator> Handler<ToolPayload> for DeleteHandler<R> {
    async fn handle(&self, resource: &mut Resource<ToolPayload>) -> Result<(), HandlerError> {
        // Named from the id, not the payload: a failed deploy may leave a
        // workload that was never recorded
        let handle = WorkloadHandle::new(workload_name(&resource.id), &self.deploy.namespace);

        ignore_not_found(self.orchestrator.delete_endpoint(&handle).await)?;
        ignore_not_found(self.orchestrator.delete_workload(&handle).await)?;

        resource.payload.deploy_name = None;
        resource.payload.service_url = None;
        Ok(())
    }
}

#[cfg(test)]
#[path = "delete_tests.rs"]
mod tests;
