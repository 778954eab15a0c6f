// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Inbound tool requests
//!
//! Requests never drive work themselves. Each one is a single conditional
//! update that moves an idle resource into a state some loop claims from.

use crate::error::RequestError;
use chrono::{DateTime, Utc};
use kiln_core::{Clock, ResourceState, ToolEnv, ToolMetadata, ToolPayload};
use kiln_storage::{Document, Filter, ResourceStore, Update};
use serde::{Deserialize, Serialize};

/// A new tool as uploaded by a tenant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolSubmission {
    pub metadata: ToolMetadata,
    #[serde(default)]
    pub version: String,
    /// Bundle key; defaults to `<metadata.id>/source.tar.gz`
    #[serde(default)]
    pub source_key: Option<String>,
    #[serde(default)]
    pub env: Vec<ToolEnv>,
}

/// Operator view of one tool
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolStatus {
    pub id: String,
    pub tool_id: String,
    pub state: ResourceState,
    pub in_progress: bool,
    pub retry_times: u32,
    pub last_error: Option<String>,
    pub state_history: Vec<ResourceState>,
    pub updated_at: DateTime<Utc>,
    pub image: Option<String>,
    pub service_url: Option<String>,
}

impl ToolStatus {
    fn from_document(doc: Document) -> Result<Self, RequestError> {
        let resource = doc.decode::<ToolPayload>()?;
        let lifecycle = resource.lifecycle;
        Ok(Self {
            id: resource.id,
            tool_id: resource.payload.metadata.id,
            state: lifecycle.current_state,
            in_progress: lifecycle.in_progress,
            retry_times: lifecycle.retry_times,
            last_error: lifecycle.last_error,
            state_history: lifecycle.state_history,
            updated_at: lifecycle.updated_at,
            image: resource.payload.image,
            service_url: resource.payload.service_url,
        })
    }
}

/// Enqueue interface over the shared store
#[derive(Clone)]
pub struct ToolRequests<S, C> {
    store: S,
    clock: C,
}

impl<S: ResourceStore, C: Clock> ToolRequests<S, C> {
    pub fn new(store: S, clock: C) -> Self {
        Self { store, clock }
    }

    /// Record a new tool in `created`; the build loop picks it up
    pub async fn submit(&self, submission: ToolSubmission) -> Result<String, RequestError> {
        let tool_id = submission.metadata.id.trim();
        if tool_id.is_empty() {
            return Err(RequestError::InvalidSubmission(
                "metadata.id must not be empty".to_string(),
            ));
        }
        if submission.metadata.name.trim().is_empty() {
            return Err(RequestError::InvalidSubmission(
                "metadata.name must not be empty".to_string(),
            ));
        }
        let source_key = match submission.source_key {
            Some(key) if !key.trim().is_empty() => key,
            _ => ToolPayload::default_source_key(tool_id),
        };
        let payload = ToolPayload {
            version: submission.version,
            env: submission.env,
            ..ToolPayload::new(submission.metadata, source_key)
        };

        let doc = self
            .store
            .insert(ResourceState::Created, serde_json::to_value(&payload)?)
            .await?;
        tracing::info!(resource_id = %doc.id, tool_id = %payload.metadata.id, "tool submitted");
        Ok(doc.id)
    }

    pub async fn deploy(&self, id: &str) -> Result<(), RequestError> {
        self.enqueue(
            id,
            "deploy",
            &[ResourceState::Built, ResourceState::Paused],
            ResourceState::Queued,
        )
        .await
    }

    pub async fn delete(&self, id: &str) -> Result<(), RequestError> {
        self.enqueue(
            id,
            "delete",
            &[
                ResourceState::Built,
                ResourceState::Running,
                ResourceState::Paused,
                ResourceState::Error,
            ],
            ResourceState::DeleteMarked,
        )
        .await
    }

    pub async fn pause(&self, id: &str) -> Result<(), RequestError> {
        self.enqueue(
            id,
            "pause",
            &[ResourceState::Running],
            ResourceState::PauseMarked,
        )
        .await
    }

    /// Return a resource parked in `error` to the source state of the edge
    /// that failed, eligible immediately
    ///
    /// A resource with no recorded edge has nowhere to go back to and is
    /// refused.
    pub async fn reset(&self, id: &str) -> Result<(), RequestError> {
        let doc = self
            .store
            .get(id)
            .await?
            .ok_or_else(|| RequestError::NotFound(id.to_string()))?;
        // Error is never an edge source, so the recorded source is stable
        // while the resource stays in error
        let Some(source) = doc.lifecycle.source_state else {
            return Err(RequestError::InvalidState {
                id: id.to_string(),
                action: "reset",
                state: doc.lifecycle.current_state,
                in_progress: doc.lifecycle.in_progress,
            });
        };
        let update = Update::new()
            .state(source)
            .clear_error()
            .rebase_retries()
            .scheduled_at(self.clock.now());
        self.apply(id, "reset", &[ResourceState::Error], update).await
    }

    pub async fn status(&self, id: &str) -> Result<ToolStatus, RequestError> {
        let doc = self
            .store
            .get(id)
            .await?
            .ok_or_else(|| RequestError::NotFound(id.to_string()))?;
        ToolStatus::from_document(doc)
    }

    /// Every tool, optionally only those in `state`, oldest first
    pub async fn list(&self, state: Option<ResourceState>) -> Result<Vec<ToolStatus>, RequestError> {
        let filter = match state {
            Some(state) => Filter::new().state(state),
            None => Filter::new(),
        };
        self.store
            .list(&filter)
            .await?
            .into_iter()
            .map(ToolStatus::from_document)
            .collect()
    }

    async fn enqueue(
        &self,
        id: &str,
        action: &'static str,
        from: &[ResourceState],
        to: ResourceState,
    ) -> Result<(), RequestError> {
        let update = Update::new()
            .state(to)
            .rebase_retries()
            .scheduled_at(self.clock.now());
        self.apply(id, action, from, update).await
    }

    async fn apply(
        &self,
        id: &str,
        action: &'static str,
        from: &[ResourceState],
        update: Update,
    ) -> Result<(), RequestError> {
        let filter = Filter::new().id(id).states(from).in_progress(false);
        if self.store.update_one(&filter, &update).await? > 0 {
            tracing::info!(resource_id = id, action, "request accepted");
            return Ok(());
        }

        // Nothing matched; tell the caller why
        match self.store.get(id).await? {
            None => Err(RequestError::NotFound(id.to_string())),
            Some(doc) => Err(RequestError::InvalidState {
                id: id.to_string(),
                action,
                state: doc.lifecycle.current_state,
                in_progress: doc.lifecycle.in_progress,
            }),
        }
    }
}

#[cfg(test)]
#[path = "requests_tests.rs"]
mod tests;
