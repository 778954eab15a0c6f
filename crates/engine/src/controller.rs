// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-kind bootstrap: recovery first, then one loop per routed edge

use crate::error::ControllerError;
use crate::handler::Handler;
use crate::reconciler::Reconciler;
use crate::recovery::recover;
use kiln_core::{Clock, ReconcilerConfig, Transition, TransitionError, TransitionTable};
use kiln_storage::ResourceStore;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

type Route<P> = (Transition, Arc<dyn Handler<P>>);

/// Reconciles one resource kind across its declared edges
pub struct Controller<P, S, C> {
    kind: String,
    store: S,
    clock: C,
    config: ReconcilerConfig,
    table: Arc<TransitionTable>,
    routes: Vec<Route<P>>,
}

impl<P, S, C> Controller<P, S, C>
where
    P: Serialize + DeserializeOwned + Send + Sync + 'static,
    S: ResourceStore,
    C: Clock,
{
    pub fn new(
        kind: impl Into<String>,
        store: S,
        clock: C,
        config: ReconcilerConfig,
        table: TransitionTable,
    ) -> Self {
        Self {
            kind: kind.into(),
            store,
            clock,
            config,
            table: Arc::new(table),
            routes: Vec::new(),
        }
    }

    /// Bind a handler to a declared edge
    pub fn route(
        &mut self,
        edge: Transition,
        handler: impl Handler<P>,
    ) -> Result<(), ControllerError> {
        self.table.require(&edge)?;
        if self.routes.iter().any(|(routed, _)| *routed == edge) {
            return Err(ControllerError::DuplicateRoute(edge));
        }
        self.routes.push((edge, Arc::new(handler)));
        Ok(())
    }

    pub fn routes(&self) -> impl Iterator<Item = &Transition> {
        self.routes.iter().map(|(edge, _)| edge)
    }

    /// Recover orphaned claims, then launch every routed loop
    pub async fn start(self, cancel: CancellationToken) -> Result<ControllerHandle, ControllerError> {
        let recovered = recover(&self.store)
            .await
            .map_err(ControllerError::Recovery)?;

        let workers = TaskTracker::new();
        let reconciler = Reconciler::new(
            self.kind.as_str(),
            self.store,
            self.clock,
            self.config,
            self.table,
            workers.clone(),
        );

        let loops = self
            .routes
            .into_iter()
            .map(|(edge, handler)| {
                let reconciler = reconciler.clone();
                let cancel = cancel.clone();
                tokio::spawn(async move { reconciler.reconcile(edge, handler, cancel).await })
            })
            .collect::<Vec<_>>();

        tracing::info!(
            resource = %self.kind,
            recovered,
            loops = loops.len(),
            "controller started"
        );
        Ok(ControllerHandle {
            kind: self.kind,
            cancel,
            loops,
            workers,
            recovered,
        })
    }
}

/// Running controller; dropping it leaves loops running until `cancel` fires
pub struct ControllerHandle {
    kind: String,
    cancel: CancellationToken,
    loops: Vec<JoinHandle<Result<(), TransitionError>>>,
    workers: TaskTracker,
    recovered: u64,
}

impl ControllerHandle {
    /// Claims released by recovery at startup
    pub fn recovered(&self) -> u64 {
        self.recovered
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Workers currently running a handler
    pub fn in_flight(&self) -> usize {
        self.workers.len()
    }

    /// Stop claiming and drain in-flight workers
    ///
    /// Workers are never aborted; those still running after
    /// `drain_timeout` are reported and left to finish on their own.
    pub async fn shutdown(self, drain_timeout: Duration) -> Result<(), ControllerError> {
        tracing::info!(resource = %self.kind, in_flight = self.workers.len(), "shutting down");
        self.cancel.cancel();

        for handle in self.loops {
            match handle.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => tracing::error!(resource = %self.kind, error = %e, "loop exited with error"),
                Err(e) => tracing::error!(resource = %self.kind, error = %e, "loop task failed"),
            }
        }

        self.workers.close();
        if tokio::time::timeout(drain_timeout, self.workers.wait())
            .await
            .is_err()
        {
            let in_flight = self.workers.len();
            tracing::warn!(resource = %self.kind, in_flight, "drain timed out");
            return Err(ControllerError::DrainTimeout { in_flight });
        }

        tracing::info!(resource = %self.kind, "drained");
        Ok(())
    }
}

#[cfg(test)]
#[path = "controller_tests.rs"]
mod tests;
