// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced adapter wrappers for consistent observability

use crate::build::{BuildError, BuildId, BuildParams, BuildService, BuildStatus};
use crate::object_store::{ObjectStore, ObjectStoreError};
use crate::orchestrator::{Orchestrator, OrchestratorError, WorkloadHandle, WorkloadSpec};
use async_trait::async_trait;
use std::path::Path;
use std::time::Instant;
use tracing::Instrument;

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

/// Wrapper that adds tracing to any ObjectStore
#[derive(Clone)]
pub struct TracedObjectStore<O> {
    inner: O,
}

impl<O> TracedObjectStore<O> {
    pub fn new(inner: O) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<O: ObjectStore> ObjectStore for TracedObjectStore<O> {
    async fn get(&self, key: &str) -> Result<Vec<u8>, ObjectStoreError> {
        let span = tracing::info_span!("objects.get", key);
        async {
            let start = Instant::now();
            let result = self.inner.get(key).await;
            match &result {
                Ok(data) => tracing::debug!(bytes = data.len(), elapsed_ms = elapsed_ms(start), "fetched"),
                Err(e) => tracing::error!(elapsed_ms = elapsed_ms(start), error = %e, "get failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn put(&self, key: &str, data: Vec<u8>) -> Result<(), ObjectStoreError> {
        let span = tracing::info_span!("objects.put", key, bytes = data.len());
        async {
            let start = Instant::now();
            let result = self.inner.put(key, data).await;
            match &result {
                Ok(()) => tracing::info!(elapsed_ms = elapsed_ms(start), "stored"),
                Err(e) => tracing::error!(elapsed_ms = elapsed_ms(start), error = %e, "put failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn download(&self, key: &str, dest: &Path) -> Result<u64, ObjectStoreError> {
        let span = tracing::info_span!("objects.download", key, dest = %dest.display());
        async {
            let start = Instant::now();
            let result = self.inner.download(key, dest).await;
            match &result {
                Ok(bytes) => tracing::info!(bytes, elapsed_ms = elapsed_ms(start), "downloaded"),
                Err(e) => {
                    tracing::error!(elapsed_ms = elapsed_ms(start), error = %e, "download failed")
                }
            }
            result
        }
        .instrument(span)
        .await
    }
}

/// Wrapper that adds tracing to any BuildService
#[derive(Clone)]
pub struct TracedBuildService<B> {
    inner: B,
}

impl<B> TracedBuildService<B> {
    pub fn new(inner: B) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<B: BuildService> BuildService for TracedBuildService<B> {
    async fn start_build(&self, params: &BuildParams) -> Result<BuildId, BuildError> {
        let span = tracing::info_span!(
            "build.start",
            image_repo = %params.image_repo,
            image_tag = %params.image_tag,
        );
        async {
            tracing::info!(context_dir = %params.context_dir.display(), "starting");

            // Precondition: the build context must exist
            if !params.context_dir.is_dir() {
                tracing::error!("build context does not exist");
                return Err(BuildError::Start(format!(
                    "build context does not exist: {}",
                    params.context_dir.display()
                )));
            }

            let start = Instant::now();
            let result = self.inner.start_build(params).await;
            match &result {
                Ok(id) => tracing::info!(build_id = %id, elapsed_ms = elapsed_ms(start), "build started"),
                Err(e) => tracing::error!(elapsed_ms = elapsed_ms(start), error = %e, "start failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn build_status(&self, id: &BuildId) -> Result<BuildStatus, BuildError> {
        let result = self.inner.build_status(id).await;
        match &result {
            Ok(status) => tracing::trace!(build_id = %id, ?status, "polled"),
            Err(e) => tracing::warn!(build_id = %id, error = %e, "status poll failed"),
        }
        result
    }

    async fn fetch_report(&self, id: &BuildId) -> Result<serde_json::Value, BuildError> {
        let span = tracing::info_span!("build.report", build_id = %id);
        async {
            let result = self.inner.fetch_report(id).await;
            match &result {
                Ok(_) => tracing::debug!("report fetched"),
                Err(e) => tracing::error!(error = %e, "report fetch failed"),
            }
            result
        }
        .instrument(span)
        .await
    }
}

/// Wrapper that adds tracing to any Orchestrator
#[derive(Clone)]
pub struct TracedOrchestrator<O> {
    inner: O,
}

impl<O> TracedOrchestrator<O> {
    pub fn new(inner: O) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<O: Orchestrator> Orchestrator for TracedOrchestrator<O> {
    async fn create_workload(
        &self,
        spec: &WorkloadSpec,
    ) -> Result<WorkloadHandle, OrchestratorError> {
        let span = tracing::info_span!(
            "orchestrator.create_workload",
            name = %spec.name,
            namespace = %spec.namespace,
        );
        async {
            tracing::info!(image = %spec.image, env_count = spec.env.len(), "creating");
            let start = Instant::now();
            let result = self.inner.create_workload(spec).await;
            match &result {
                Ok(_) => tracing::info!(elapsed_ms = elapsed_ms(start), "workload created"),
                Err(OrchestratorError::AlreadyExists(_)) => {
                    tracing::warn!(elapsed_ms = elapsed_ms(start), "workload already exists")
                }
                Err(e) => tracing::error!(elapsed_ms = elapsed_ms(start), error = %e, "create failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn delete_workload(&self, handle: &WorkloadHandle) -> Result<(), OrchestratorError> {
        let span = tracing::info_span!("orchestrator.delete_workload", name = %handle.name);
        async {
            let result = self.inner.delete_workload(handle).await;
            // NotFound is routine here: the workload may never have been created
            match &result {
                Ok(()) => tracing::info!("workload deleted"),
                Err(OrchestratorError::NotFound(_)) => tracing::debug!("workload already gone"),
                Err(e) => tracing::error!(error = %e, "delete failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn scale_workload(
        &self,
        handle: &WorkloadHandle,
        replicas: u32,
    ) -> Result<(), OrchestratorError> {
        let span = tracing::info_span!("orchestrator.scale_workload", name = %handle.name, replicas);
        async {
            let result = self.inner.scale_workload(handle, replicas).await;
            match &result {
                Ok(()) => tracing::info!("workload scaled"),
                Err(e) => tracing::warn!(error = %e, "scale failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn create_endpoint(&self, handle: &WorkloadHandle) -> Result<String, OrchestratorError> {
        let span = tracing::info_span!("orchestrator.create_endpoint", name = %handle.name);
        async {
            let start = Instant::now();
            let result = self.inner.create_endpoint(handle).await;
            match &result {
                Ok(address) => tracing::info!(address = %address, elapsed_ms = elapsed_ms(start), "endpoint created"),
                Err(e) => tracing::error!(elapsed_ms = elapsed_ms(start), error = %e, "create failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn delete_endpoint(&self, handle: &WorkloadHandle) -> Result<(), OrchestratorError> {
        let span = tracing::info_span!("orchestrator.delete_endpoint", name = %handle.name);
        async {
            let result = self.inner.delete_endpoint(handle).await;
            match &result {
                Ok(()) => tracing::info!("endpoint deleted"),
                Err(OrchestratorError::NotFound(_)) => tracing::debug!("endpoint already gone"),
                Err(e) => tracing::error!(error = %e, "delete failed"),
            }
            result
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
