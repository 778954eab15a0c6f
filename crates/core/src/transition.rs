// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Declared transition edges
//!
//! Each edge is a `(source, mid, target)` triple driven by exactly one
//! reconcile loop. Edges must be filter-disjoint: a resource can satisfy at
//! most one loop's claim filter at any time.

use crate::state::ResourceState;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

/// Errors from declaring or looking up transition edges
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("edge {0} reuses a state within its own triple")]
    Degenerate(Transition),
    #[error("edge {0} uses reserved state {1}")]
    Reserved(Transition, ResourceState),
    #[error("state {state} is the source of both {first} and {second}")]
    DuplicateSource {
        state: ResourceState,
        first: Transition,
        second: Transition,
    },
    #[error("state {state} is the mid state of both {first} and {second}")]
    DuplicateMid {
        state: ResourceState,
        first: Transition,
        second: Transition,
    },
    #[error("mid state {state} of {edge} is also an endpoint of another edge")]
    MidOverlapsEndpoint {
        state: ResourceState,
        edge: Transition,
    },
    #[error("edge {0} is not declared")]
    Undeclared(Transition),
}

/// A `(source, mid, target)` edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Transition {
    source: ResourceState,
    mid: ResourceState,
    target: ResourceState,
}

impl Transition {
    /// Declare an edge, rejecting shapes no loop may drive
    pub fn new(
        source: ResourceState,
        mid: ResourceState,
        target: ResourceState,
    ) -> Result<Self, TransitionError> {
        let edge = Self {
            source,
            mid,
            target,
        };
        edge.validate()?;
        Ok(edge)
    }

    /// Check the triple on its own, without regard to other edges
    pub fn validate(&self) -> Result<(), TransitionError> {
        if self.source == self.mid || self.mid == self.target || self.source == self.target {
            return Err(TransitionError::Degenerate(*self));
        }
        // error is only ever written by the engine on a fatal outcome
        for state in [self.source, self.mid, self.target] {
            if state == ResourceState::Error {
                return Err(TransitionError::Reserved(*self, state));
            }
        }
        for state in [self.source, self.mid] {
            if state.is_terminal() {
                return Err(TransitionError::Reserved(*self, state));
            }
        }
        Ok(())
    }

    pub fn source(&self) -> ResourceState {
        self.source
    }

    pub fn mid(&self) -> ResourceState {
        self.mid
    }

    pub fn target(&self) -> ResourceState {
        self.target
    }
}

impl Transition {
    pub const BUILD: Transition = Transition {
        source: ResourceState::Created,
        mid: ResourceState::Building,
        target: ResourceState::Built,
    };
    pub const DEPLOY: Transition = Transition {
        source: ResourceState::Queued,
        mid: ResourceState::Deploying,
        target: ResourceState::Running,
    };
    pub const DELETE: Transition = Transition {
        source: ResourceState::DeleteMarked,
        mid: ResourceState::Deleting,
        target: ResourceState::Deleted,
    };
    pub const PAUSE: Transition = Transition {
        source: ResourceState::PauseMarked,
        mid: ResourceState::Pausing,
        target: ResourceState::Paused,
    };
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}->{}", self.source, self.mid, self.target)
    }
}

/// The full set of edges a controller may drive
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransitionTable {
    edges: Vec<Transition>,
}

impl TransitionTable {
    /// Build a table, validating every edge and their disjointness
    pub fn new(edges: Vec<Transition>) -> Result<Self, TransitionError> {
        let table = Self { edges };
        table.validate()?;
        Ok(table)
    }

    /// The tool lifecycle: build, deploy, delete, pause
    pub fn tool() -> Self {
        Self {
            edges: vec![
                Transition::BUILD,
                Transition::DEPLOY,
                Transition::DELETE,
                Transition::PAUSE,
            ],
        }
    }

    pub fn validate(&self) -> Result<(), TransitionError> {
        for edge in &self.edges {
            edge.validate()?;
        }

        for (i, first) in self.edges.iter().enumerate() {
            for second in self.edges.iter().skip(i + 1) {
                if first.source == second.source {
                    return Err(TransitionError::DuplicateSource {
                        state: first.source,
                        first: *first,
                        second: *second,
                    });
                }
                if first.mid == second.mid {
                    return Err(TransitionError::DuplicateMid {
                        state: first.mid,
                        first: *first,
                        second: *second,
                    });
                }
            }
        }

        let endpoints: HashSet<ResourceState> = self
            .edges
            .iter()
            .flat_map(|e| [e.source, e.target])
            .collect();
        if let Some(edge) = self.edges.iter().find(|e| endpoints.contains(&e.mid)) {
            return Err(TransitionError::MidOverlapsEndpoint {
                state: edge.mid,
                edge: *edge,
            });
        }

        Ok(())
    }

    pub fn edges(&self) -> &[Transition] {
        &self.edges
    }

    pub fn contains(&self, edge: &Transition) -> bool {
        self.edges.contains(edge)
    }

    /// Fail unless `edge` is declared in this table
    pub fn require(&self, edge: &Transition) -> Result<(), TransitionError> {
        if self.contains(edge) {
            Ok(())
        } else {
            Err(TransitionError::Undeclared(*edge))
        }
    }
}

#[cfg(test)]
#[path = "transition_tests.rs"]
mod tests;
