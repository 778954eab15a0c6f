// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
// Enable coverage(off) attribute for excluding test infrastructure
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Adapters for the external collaborators driven by transition handlers

pub mod build;
pub mod object_store;
pub mod orchestrator;
pub mod traced;

pub use build::{BuildError, BuildId, BuildParams, BuildService, BuildStatus, ShellBuildService};
pub use object_store::{LocalObjectStore, ObjectStore, ObjectStoreError};
pub use orchestrator::{
    NoOpOrchestrator, Orchestrator, OrchestratorError, WorkloadHandle, WorkloadSpec,
};
pub use traced::{TracedBuildService, TracedObjectStore, TracedOrchestrator};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use build::{BuildCall, FakeBuildService};
#[cfg(any(test, feature = "test-support"))]
pub use object_store::{FakeObjectStore, ObjectCall};
#[cfg(any(test, feature = "test-support"))]
pub use orchestrator::{FakeOrchestrator, FakeWorkload, OrchestratorCall, OrchestratorOp};
