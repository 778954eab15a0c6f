// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Resource lifecycle states
//!
//! ```text
//! created -> building -> built -> queued -> deploying -> running
//! running -> pause_marked -> pausing -> paused
//! built/running/paused/error -> delete_marked -> deleting -> deleted
//! building/deploying/deleting/pausing -> error
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Lifecycle state of a managed resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceState {
    /// Submitted, waiting to be built
    Created,
    Building,
    /// Build artifact exists, not deployed
    Built,
    /// Waiting to be deployed
    Queued,
    Deploying,
    Running,
    DeleteMarked,
    Deleting,
    Deleted,
    PauseMarked,
    Pausing,
    Paused,
    /// Frozen after a fatal handler error; needs an operator reset
    Error,
}

impl ResourceState {
    pub const ALL: [ResourceState; 13] = [
        ResourceState::Created,
        ResourceState::Building,
        ResourceState::Built,
        ResourceState::Queued,
        ResourceState::Deploying,
        ResourceState::Running,
        ResourceState::DeleteMarked,
        ResourceState::Deleting,
        ResourceState::Deleted,
        ResourceState::PauseMarked,
        ResourceState::Pausing,
        ResourceState::Paused,
        ResourceState::Error,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceState::Created => "created",
            ResourceState::Building => "building",
            ResourceState::Built => "built",
            ResourceState::Queued => "queued",
            ResourceState::Deploying => "deploying",
            ResourceState::Running => "running",
            ResourceState::DeleteMarked => "delete_marked",
            ResourceState::Deleting => "deleting",
            ResourceState::Deleted => "deleted",
            ResourceState::PauseMarked => "pause_marked",
            ResourceState::Pausing => "pausing",
            ResourceState::Paused => "paused",
            ResourceState::Error => "error",
        }
    }

    /// No further transitions leave this state
    pub fn is_terminal(&self) -> bool {
        matches!(self, ResourceState::Deleted)
    }
}

impl fmt::Display for ResourceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A state name outside the declared enumeration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown resource state: {0}")]
pub struct UnknownState(pub String);

impl FromStr for ResourceState {
    type Err = UnknownState;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ResourceState::ALL
            .iter()
            .find(|state| state.as_str() == s)
            .copied()
            .ok_or_else(|| UnknownState(s.to_string()))
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
