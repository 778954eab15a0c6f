// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Managed resource records
//!
//! A resource is lifecycle bookkeeping plus a kind-specific payload. The
//! reconciler reads and writes only the lifecycle; handlers own the payload.

use crate::clock::Clock;
use crate::state::ResourceState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle fields shared by every managed resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lifecycle {
    pub current_state: ResourceState,
    /// Source of the edge most recently claimed; recovery reverts to it
    #[serde(default)]
    pub source_state: Option<ResourceState>,
    #[serde(default)]
    pub target_state: Option<ResourceState>,
    /// Set only by a claim, cleared only by the claiming worker or recovery
    #[serde(default)]
    pub in_progress: bool,
    /// Total retryable failures; never decreases
    #[serde(default)]
    pub retry_times: u32,
    /// `retry_times` when the latest request was accepted
    #[serde(default)]
    pub retry_base: u32,
    /// Not eligible for a claim before this time
    pub scheduled_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    #[serde(default)]
    pub state_history: Vec<ResourceState>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Lifecycle {
    /// Fresh lifecycle in `state`, eligible immediately
    pub fn new(state: ResourceState, clock: &impl Clock) -> Self {
        let now = clock.now();
        Self {
            current_state: state,
            source_state: None,
            target_state: None,
            in_progress: false,
            retry_times: 0,
            retry_base: 0,
            scheduled_at: now,
            last_error: None,
            state_history: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Retryable failures since the latest request was accepted
    pub fn retries_since_request(&self) -> u32 {
        self.retry_times.saturating_sub(self.retry_base)
    }
}

/// A resource with a decoded payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource<P> {
    pub id: String,
    pub lifecycle: Lifecycle,
    pub payload: P,
}

#[cfg(test)]
#[path = "resource_tests.rs"]
mod tests;
