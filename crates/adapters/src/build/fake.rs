// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake build service for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{BuildError, BuildId, BuildParams, BuildService, BuildStatus};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

/// Recorded build call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildCall {
    Start { params: BuildParams },
    Status { id: BuildId },
    FetchReport { id: BuildId },
}

#[derive(Default)]
struct FakeState {
    /// Status sequence handed to every build started from now on
    script: Vec<BuildStatus>,
    /// Remaining statuses per build; the last one repeats
    builds: HashMap<BuildId, VecDeque<BuildStatus>>,
    report: Option<serde_json::Value>,
    fail_start: Option<String>,
    next_id: u64,
    calls: Vec<BuildCall>,
}

/// Build service whose outcomes are scripted by the test
///
/// Unscripted builds succeed on the first status poll and report `{}`.
#[derive(Clone, Default)]
pub struct FakeBuildService {
    state: Arc<Mutex<FakeState>>,
}

impl FakeBuildService {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Statuses returned by successive polls of each subsequently started build
    pub fn script(&self, statuses: Vec<BuildStatus>) {
        self.lock().script = statuses;
    }

    pub fn set_report(&self, report: serde_json::Value) {
        self.lock().report = Some(report);
    }

    /// Make `start_build` fail with `reason`
    pub fn fail_start(&self, reason: impl Into<String>) {
        self.lock().fail_start = Some(reason.into());
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<BuildCall> {
        self.lock().calls.clone()
    }

    /// Parameters of every started build
    pub fn started(&self) -> Vec<BuildParams> {
        self.lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                BuildCall::Start { params } => Some(params.clone()),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl BuildService for FakeBuildService {
    async fn start_build(&self, params: &BuildParams) -> Result<BuildId, BuildError> {
        let mut state = self.lock();
        state.calls.push(BuildCall::Start {
            params: params.clone(),
        });
        if let Some(reason) = &state.fail_start {
            return Err(BuildError::Start(reason.clone()));
        }

        state.next_id += 1;
        let id = BuildId(format!("build-{}", state.next_id));
        let mut statuses: VecDeque<_> = state.script.iter().cloned().collect();
        if statuses.is_empty() {
            statuses.push_back(BuildStatus::Succeeded);
        }
        state.builds.insert(id.clone(), statuses);
        Ok(id)
    }

    async fn build_status(&self, id: &BuildId) -> Result<BuildStatus, BuildError> {
        let mut state = self.lock();
        state.calls.push(BuildCall::Status { id: id.clone() });
        let statuses = state
            .builds
            .get_mut(id)
            .ok_or_else(|| BuildError::UnknownBuild(id.to_string()))?;
        let status = if statuses.len() > 1 {
            statuses.pop_front()
        } else {
            statuses.front().cloned()
        };
        status.ok_or_else(|| BuildError::UnknownBuild(id.to_string()))
    }

    async fn fetch_report(&self, id: &BuildId) -> Result<serde_json::Value, BuildError> {
        let mut state = self.lock();
        state.calls.push(BuildCall::FetchReport { id: id.clone() });
        if !state.builds.contains_key(id) {
            return Err(BuildError::UnknownBuild(id.to_string()));
        }
        Ok(state
            .report
            .clone()
            .unwrap_or_else(|| serde_json::json!({})))
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
