// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! queued → deploying → running

use super::{ignore_not_found, workload_name};
use crate::error::HandlerError;
use crate::handler::Handler;
use async_trait::async_trait;
use kiln_adapters::{Orchestrator, OrchestratorError, WorkloadHandle, WorkloadSpec};
use kiln_core::{DeployConfig, Resource, ToolPayload, Transition};
use kiln_storage::{Filter, ResourceStore, Update};

/// Creates the workload and its endpoint, rolling back on partial failure
pub struct DeployHandler<S, R> {
    store: S,
    orchestrator: R,
    deploy: DeployConfig,
}

impl<S: ResourceStore, R: Orchestrator> DeployHandler<S, R> {
    pub fn new(store: S, orchestrator: R, deploy: DeployConfig) -> Self {
        Self {
            store,
            orchestrator,
            deploy,
        }
    }

    fn workload_spec(&self, resource: &Resource<ToolPayload>) -> Result<WorkloadSpec, HandlerError> {
        let image = resource
            .payload
            .image
            .clone()
            .ok_or_else(|| HandlerError::fatal("tool has no built image"))?;
        Ok(WorkloadSpec {
            name: workload_name(&resource.id),
            namespace: self.deploy.namespace.clone(),
            image,
            port: self.deploy.port,
            env: resource
                .payload
                .env
                .iter()
                .map(|env| (env.name.clone(), env.value.clone()))
                .collect(),
        })
    }

    /// Create the workload, replacing one left behind by an interrupted attempt
    async fn create_workload(&self, spec: &WorkloadSpec) -> Result<WorkloadHandle, HandlerError> {
        match self.orchestrator.create_workload(spec).await {
            Err(OrchestratorError::AlreadyExists(_)) => {
                tracing::warn!(name = %spec.name, "replacing existing workload");
                ignore_not_found(self.orchestrator.delete_workload(&spec.handle()).await)?;
                Ok(self.orchestrator.create_workload(spec).await?)
            }
            other => Ok(other?),
        }
    }

    async fn create_endpoint(&self, handle: &WorkloadHandle) -> Result<String, OrchestratorError> {
        match self.orchestrator.create_endpoint(handle).await {
            Err(OrchestratorError::AlreadyExists(_)) => {
                tracing::warn!(name = %handle.name, "replacing existing endpoint");
                ignore_not_found(self.orchestrator.delete_endpoint(handle).await)?;
                self.orchestrator.create_endpoint(handle).await
            }
            other => other,
        }
    }

    /// Persist the deployment onto the still-claimed resource
    async fn record(&self, resource: &Resource<ToolPayload>) -> Result<(), HandlerError> {
        let payload = serde_json::to_value(&resource.payload)
            .map_err(|e| HandlerError::fatal(format!("failed to encode resource: {}", e)))?;
        let filter = Filter::new()
            .id(&resource.id)
            .state(Transition::DEPLOY.mid())
            .in_progress(true);
        match self.store.update_one(&filter, &Update::new().payload(payload)).await {
            Ok(0) => Err(HandlerError::fatal(
                "failed to record deployment: resource no longer claimed",
            )),
            Ok(_) => Ok(()),
            Err(e) => Err(HandlerError::fatal(format!(
                "failed to record deployment: {}",
                e
            ))),
        }
    }

    async fn rollback_endpoint(&self, handle: &WorkloadHandle) {
        if let Err(e) = ignore_not_found(self.orchestrator.delete_endpoint(handle).await) {
            tracing::error!(name = %handle.name, error = %e, "endpoint rollback failed");
        }
    }

    async fn rollback_workload(&self, handle: &WorkloadHandle) {
        if let Err(e) = ignore_not_found(self.orchestrator.delete_workload(handle).await) {
            tracing::error!(name = %handle.name, error = %e, "workload rollback failed");
        }
    }
}

#[async_trait]
impl<S: ResourceStore, R: Orchestrator> Handler<ToolPayload> for DeployHandler<S, R> {
    async fn handle(&self, resource: &mut Resource<ToolPayload>) -> Result<(), HandlerError> {
        let spec = self.workload_spec(resource)?;
        let handle = self.create_workload(&spec).await?;

        let address = match self.create_endpoint(&handle).await {
            Ok(address) => address,
            Err(e) => {
                self.rollback_workload(&handle).await;
                return Err(e.into());
            }
        };

        resource.payload.deploy_name = Some(handle.name.clone());
        resource.payload.service_url = Some(address);
        if let Err(e) = self.record(resource).await {
            self.rollback_endpoint(&handle).await;
            self.rollback_workload(&handle).await;
            resource.payload.deploy_name = None;
            resource.payload.service_url = None;
            return Err(e);
        }

        tracing::info!(
            name = %handle.name,
            service_url = resource.payload.service_url.as_deref().unwrap_or_default(),
            "tool deployed"
        );
        Ok(())
    }
}

#[cfg(test)]
#[path = "deploy_tests.rs"]
mod tests;
