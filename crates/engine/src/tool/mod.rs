// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tool lifecycle handlers
//!
//! | edge | handler |
//! |---|---|
//! | created → building → built | [`BuildHandler`] |
//! | queued → deploying → running | [`DeployHandler`] |
//! | delete_marked → deleting → deleted | [`DeleteHandler`] |
//! | pause_marked → pausing → paused | [`PauseHandler`] |

mod build;
mod delete;
mod deploy;
mod manifest;
mod pause;

pub use build::BuildHandler;
pub use delete::DeleteHandler;
pub use deploy::DeployHandler;
pub use manifest::{BuildReport, ManifestError, ReportMetadata, ToolManifest, MANIFEST_FILE};
pub use pause::PauseHandler;

use crate::controller::Controller;
use crate::error::ControllerError;
use kiln_adapters::{BuildService, ObjectStore, Orchestrator, OrchestratorError};
use kiln_core::{Clock, Config, ToolPayload, Transition, TransitionTable};
use kiln_storage::ResourceStore;

/// Resource kind name used in logs
pub const KIND: &str = "tool";

/// Deterministic workload name, so a retried deploy finds its own leftovers
pub fn workload_name(resource_id: &str) -> String {
    format!("tool-{}", resource_id)
}

/// Treat an already-absent object as removed
fn ignore_not_found(result: Result<(), OrchestratorError>) -> Result<(), OrchestratorError> {
    match result {
        Err(OrchestratorError::NotFound(name)) => {
            tracing::debug!(name, "already absent");
            Ok(())
        }
        other => other,
    }
}

/// Controller for tools with all four lifecycle edges routed
pub fn controller<S, C, O, B, R>(
    store: S,
    clock: C,
    config: &Config,
    objects: O,
    builds: B,
    orchestrator: R,
) -> Result<Controller<ToolPayload, S, C>, ControllerError>
where
    S: ResourceStore,
    C: Clock,
    O: ObjectStore,
    B: BuildService,
    R: Orchestrator,
{
    let mut controller = Controller::new(
        KIND,
        store.clone(),
        clock,
        config.reconciler.clone(),
        TransitionTable::tool(),
    );
    controller.route(
        Transition::BUILD,
        BuildHandler::new(objects, builds, config.build.clone()),
    )?;
    controller.route(
        Transition::DEPLOY,
        DeployHandler::new(store, orchestrator.clone(), config.deploy.clone()),
    )?;
    controller.route(
        Transition::DELETE,
        DeleteHandler::new(orchestrator.clone(), config.deploy.clone()),
    )?;
    controller.route(
        Transition::PAUSE,
        PauseHandler::new(orchestrator, config.deploy.clone()),
    )?;
    Ok(controller)
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
