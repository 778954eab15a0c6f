// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the engine

use kiln_adapters::{BuildError, ObjectStoreError, OrchestratorError};
use kiln_core::{ResourceState, TransitionError};
use kiln_storage::StoreError;
use thiserror::Error;

/// Outcome of a failed handler invocation
///
/// Only `Retry` puts the resource back in line; everything else parks it
/// in the error state until an operator resets it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandlerError {
    /// Preconditions not met yet
    #[error("{0}")]
    Retry(String),
    #[error("{0}")]
    Fatal(String),
}

impl HandlerError {
    pub fn retry(reason: impl Into<String>) -> Self {
        HandlerError::Retry(reason.into())
    }

    pub fn fatal(reason: impl Into<String>) -> Self {
        HandlerError::Fatal(reason.into())
    }
}

impl From<ObjectStoreError> for HandlerError {
    fn from(e: ObjectStoreError) -> Self {
        HandlerError::Fatal(e.to_string())
    }
}

impl From<BuildError> for HandlerError {
    fn from(e: BuildError) -> Self {
        HandlerError::Fatal(e.to_string())
    }
}

impl From<OrchestratorError> for HandlerError {
    fn from(e: OrchestratorError) -> Self {
        HandlerError::Fatal(e.to_string())
    }
}

impl From<StoreError> for HandlerError {
    fn from(e: StoreError) -> Self {
        HandlerError::Fatal(e.to_string())
    }
}

/// Errors from controller setup and shutdown
#[derive(Debug, Error)]
pub enum ControllerError {
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error("edge {0} already has a handler")]
    DuplicateRoute(kiln_core::Transition),
    #[error("crash recovery failed: {0}")]
    Recovery(#[source] StoreError),
    #[error("{in_flight} workers still running after drain timeout")]
    DrainTimeout { in_flight: usize },
}

/// Errors from inbound tool requests
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("resource not found: {0}")]
    NotFound(String),
    #[error("cannot {action} resource {id} (state {state}, in progress: {in_progress})")]
    InvalidState {
        id: String,
        action: &'static str,
        state: ResourceState,
        in_progress: bool,
    },
    #[error("invalid submission: {0}")]
    InvalidSubmission(String),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("malformed tool payload: {0}")]
    Payload(#[from] serde_json::Error),
}
