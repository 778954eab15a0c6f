// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake orchestrator for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{Orchestrator, OrchestratorError, WorkloadHandle, WorkloadSpec};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

/// Orchestrator operation, used to inject failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrchestratorOp {
    CreateWorkload,
    DeleteWorkload,
    ScaleWorkload,
    CreateEndpoint,
    DeleteEndpoint,
}

/// Recorded orchestrator call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrchestratorCall {
    CreateWorkload { name: String, image: String },
    DeleteWorkload { name: String },
    ScaleWorkload { name: String, replicas: u32 },
    CreateEndpoint { name: String },
    DeleteEndpoint { name: String },
}

/// A workload held by the fake
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeWorkload {
    pub spec: WorkloadSpec,
    pub replicas: u32,
    pub endpoint: Option<String>,
}

#[derive(Default)]
struct FakeState {
    workloads: HashMap<String, FakeWorkload>,
    failing: HashSet<OrchestratorOp>,
    calls: Vec<OrchestratorCall>,
}

/// In-memory cluster that records calls and can fail on demand
#[derive(Clone, Default)]
pub struct FakeOrchestrator {
    state: Arc<Mutex<FakeState>>,
}

impl FakeOrchestrator {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Make every subsequent `op` fail with an API error
    pub fn fail_on(&self, op: OrchestratorOp) {
        self.lock().failing.insert(op);
    }

    pub fn clear_failures(&self) {
        self.lock().failing.clear();
    }

    /// Seed a workload, e.g. one left behind by a crashed attempt
    pub fn insert_workload(&self, spec: WorkloadSpec) {
        self.lock().workloads.insert(
            spec.name.clone(),
            FakeWorkload {
                spec,
                replicas: 1,
                endpoint: None,
            },
        );
    }

    pub fn workload(&self, name: &str) -> Option<FakeWorkload> {
        self.lock().workloads.get(name).cloned()
    }

    pub fn workload_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.lock().workloads.keys().cloned().collect();
        names.sort();
        names
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<OrchestratorCall> {
        self.lock().calls.clone()
    }

    fn begin(&self, op: OrchestratorOp, call: OrchestratorCall) -> Result<(), OrchestratorError> {
        let mut state = self.lock();
        state.calls.push(call);
        if state.failing.contains(&op) {
            return Err(OrchestratorError::Api(format!("injected {:?} failure", op)));
        }
        Ok(())
    }
}

#[async_trait]
impl Orchestrator for FakeOrchestrator {
    async fn create_workload(
        &self,
        spec: &WorkloadSpec,
    ) -> Result<WorkloadHandle, OrchestratorError> {
        self.begin(
            OrchestratorOp::CreateWorkload,
            OrchestratorCall::CreateWorkload {
                name: spec.name.clone(),
                image: spec.image.clone(),
            },
        )?;
        let mut state = self.lock();
        if state.workloads.contains_key(&spec.name) {
            return Err(OrchestratorError::AlreadyExists(spec.name.clone()));
        }
        state.workloads.insert(
            spec.name.clone(),
            FakeWorkload {
                spec: spec.clone(),
                replicas: 1,
                endpoint: None,
            },
        );
        Ok(spec.handle())
    }

    async fn delete_workload(&self, handle: &WorkloadHandle) -> Result<(), OrchestratorError> {
        self.begin(
            OrchestratorOp::DeleteWorkload,
            OrchestratorCall::DeleteWorkload {
                name: handle.name.clone(),
            },
        )?;
        self.lock()
            .workloads
            .remove(&handle.name)
            .map(|_| ())
            .ok_or_else(|| OrchestratorError::NotFound(handle.name.clone()))
    }

    async fn scale_workload(
        &self,
        handle: &WorkloadHandle,
        replicas: u32,
    ) -> Result<(), OrchestratorError> {
        self.begin(
            OrchestratorOp::ScaleWorkload,
            OrchestratorCall::ScaleWorkload {
                name: handle.name.clone(),
                replicas,
            },
        )?;
        let mut state = self.lock();
        let workload = state
            .workloads
            .get_mut(&handle.name)
            .ok_or_else(|| OrchestratorError::NotFound(handle.name.clone()))?;
        workload.replicas = replicas;
        Ok(())
    }

    async fn create_endpoint(&self, handle: &WorkloadHandle) -> Result<String, OrchestratorError> {
        self.begin(
            OrchestratorOp::CreateEndpoint,
            OrchestratorCall::CreateEndpoint {
                name: handle.name.clone(),
            },
        )?;
        let mut state = self.lock();
        let workload = state
            .workloads
            .get_mut(&handle.name)
            .ok_or_else(|| OrchestratorError::NotFound(handle.name.clone()))?;
        let address = format!(
            "http://{}.{}.svc:{}",
            handle.name, handle.namespace, workload.spec.port
        );
        workload.endpoint = Some(address.clone());
        Ok(address)
    }

    async fn delete_endpoint(&self, handle: &WorkloadHandle) -> Result<(), OrchestratorError> {
        self.begin(
            OrchestratorOp::DeleteEndpoint,
            OrchestratorCall::DeleteEndpoint {
                name: handle.name.clone(),
            },
        )?;
        let mut state = self.lock();
        match state
            .workloads
            .get_mut(&handle.name)
            .and_then(|w| w.endpoint.take())
        {
            Some(_) => Ok(()),
            None => Err(OrchestratorError::NotFound(handle.name.clone())),
        }
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
