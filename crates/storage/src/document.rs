// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stored documents and the filter/update language over them

use chrono::{DateTime, Utc};
use kiln_core::{Lifecycle, Resource, ResourceState};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// One record per managed resource; the payload stays undecoded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub lifecycle: Lifecycle,
    pub payload: serde_json::Value,
}

impl Document {
    /// Decode the payload into a typed resource
    pub fn decode<P: DeserializeOwned>(&self) -> Result<Resource<P>, serde_json::Error> {
        let payload = P::deserialize(&self.payload)?;
        Ok(Resource {
            id: self.id.clone(),
            lifecycle: self.lifecycle.clone(),
            payload,
        })
    }
}

/// Conjunction of conditions a document must satisfy; unset fields match anything
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    pub id: Option<String>,
    /// Any of these states; empty matches every state
    pub current_states: Vec<ResourceState>,
    pub in_progress: Option<bool>,
    /// `scheduled_at <= t`
    pub scheduled_before: Option<DateTime<Utc>>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn state(mut self, state: ResourceState) -> Self {
        self.current_states = vec![state];
        self
    }

    pub fn states(mut self, states: &[ResourceState]) -> Self {
        self.current_states = states.to_vec();
        self
    }

    pub fn in_progress(mut self, in_progress: bool) -> Self {
        self.in_progress = Some(in_progress);
        self
    }

    pub fn scheduled_before(mut self, at: DateTime<Utc>) -> Self {
        self.scheduled_before = Some(at);
        self
    }

    pub fn matches(&self, doc: &Document) -> bool {
        let lifecycle = &doc.lifecycle;
        self.id.as_ref().is_none_or(|id| *id == doc.id)
            && (self.current_states.is_empty()
                || self.current_states.contains(&lifecycle.current_state))
            && self
                .in_progress
                .is_none_or(|flag| flag == lifecycle.in_progress)
            && self
                .scheduled_before
                .is_none_or(|at| lifecycle.scheduled_at <= at)
    }
}

/// How `current_state` changes under an update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateChange {
    To(ResourceState),
    /// Back to the recorded `source_state`; unchanged when none is recorded
    RevertToSource,
}

/// Field assignments applied atomically to every matched document
///
/// `updated_at` is always refreshed from the store's clock.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Update {
    pub state: Option<StateChange>,
    pub source_state: Option<ResourceState>,
    pub target_state: Option<ResourceState>,
    pub in_progress: Option<bool>,
    pub increment_retry: bool,
    /// Start a fresh retry budget without lowering `retry_times`
    pub rebase_retries: bool,
    pub scheduled_at: Option<DateTime<Utc>>,
    /// `Some(None)` clears the error
    pub last_error: Option<Option<String>>,
    pub push_history: Option<ResourceState>,
    pub payload: Option<serde_json::Value>,
}

impl Update {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(mut self, state: ResourceState) -> Self {
        self.state = Some(StateChange::To(state));
        self
    }

    pub fn revert_to_source(mut self) -> Self {
        self.state = Some(StateChange::RevertToSource);
        self
    }

    /// Record the edge being driven, for recovery
    pub fn edge(mut self, source: ResourceState, target: ResourceState) -> Self {
        self.source_state = Some(source);
        self.target_state = Some(target);
        self
    }

    pub fn in_progress(mut self, in_progress: bool) -> Self {
        self.in_progress = Some(in_progress);
        self
    }

    pub fn increment_retry(mut self) -> Self {
        self.increment_retry = true;
        self
    }

    pub fn rebase_retries(mut self) -> Self {
        self.rebase_retries = true;
        self
    }

    pub fn scheduled_at(mut self, at: DateTime<Utc>) -> Self {
        self.scheduled_at = Some(at);
        self
    }

    pub fn error(mut self, message: impl Into<String>) -> Self {
        self.last_error = Some(Some(message.into()));
        self
    }

    pub fn clear_error(mut self) -> Self {
        self.last_error = Some(None);
        self
    }

    pub fn push_history(mut self, state: ResourceState) -> Self {
        self.push_history = Some(state);
        self
    }

    pub fn payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Apply to a document in place
    pub fn apply(&self, doc: &mut Document, now: DateTime<Utc>) {
        let lifecycle = &mut doc.lifecycle;
        match self.state {
            Some(StateChange::To(state)) => lifecycle.current_state = state,
            Some(StateChange::RevertToSource) => {
                if let Some(source) = lifecycle.source_state {
                    lifecycle.current_state = source;
                }
            }
            None => {}
        }
        if let Some(source) = self.source_state {
            lifecycle.source_state = Some(source);
        }
        if let Some(target) = self.target_state {
            lifecycle.target_state = Some(target);
        }
        if let Some(in_progress) = self.in_progress {
            lifecycle.in_progress = in_progress;
        }
        if self.increment_retry {
            lifecycle.retry_times = lifecycle.retry_times.saturating_add(1);
        }
        if self.rebase_retries {
            lifecycle.retry_base = lifecycle.retry_times;
        }
        if let Some(at) = self.scheduled_at {
            lifecycle.scheduled_at = at;
        }
        if let Some(error) = &self.last_error {
            lifecycle.last_error = error.clone();
        }
        if let Some(state) = self.push_history {
            lifecycle.state_history.push(state);
        }
        if let Some(payload) = &self.payload {
            doc.payload = payload.clone();
        }
        lifecycle.updated_at = now;
    }
}

/// Which eligible document a `find_one_and_update` picks first
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    /// Earliest `scheduled_at`, then earliest `created_at`
    #[default]
    ScheduledAt,
    CreatedAt,
}

impl SortOrder {
    pub fn compare(&self, a: &Document, b: &Document) -> Ordering {
        let (la, lb) = (&a.lifecycle, &b.lifecycle);
        let primary = match self {
            SortOrder::ScheduledAt => la.scheduled_at.cmp(&lb.scheduled_at),
            SortOrder::CreatedAt => Ordering::Equal,
        };
        primary
            .then_with(|| la.created_at.cmp(&lb.created_at))
            .then_with(|| a.id.cmp(&b.id))
    }
}

#[cfg(test)]
#[path = "document_tests.rs"]
mod tests;
