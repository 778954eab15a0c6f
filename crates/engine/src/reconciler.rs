// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Claim, dispatch and settle loop for one transition edge

use crate::error::HandlerError;
use crate::handler::Handler;
use kiln_core::{
    deadline, Clock, Lifecycle, ReconcilerConfig, ResourceState, Transition, TransitionError,
    TransitionTable,
};
use kiln_storage::{Document, Filter, ResourceStore, SortOrder, StoreError, Update};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::Instrument;

/// Drives resources of one kind across declared edges
///
/// Each `reconcile` call owns its own worker pool of
/// `max_parallelism` slots; all workers are spawned on the shared tracker
/// so shutdown can wait for them.
#[derive(Clone)]
pub struct Reconciler<S, C> {
    kind: Arc<str>,
    store: S,
    clock: C,
    config: ReconcilerConfig,
    table: Arc<TransitionTable>,
    workers: TaskTracker,
}

impl<S: ResourceStore, C: Clock> Reconciler<S, C> {
    pub fn new(
        kind: impl Into<Arc<str>>,
        store: S,
        clock: C,
        config: ReconcilerConfig,
        table: Arc<TransitionTable>,
        workers: TaskTracker,
    ) -> Self {
        Self {
            kind: kind.into(),
            store,
            clock,
            config,
            table,
            workers,
        }
    }

    /// Run the loop for `edge` until `cancel` fires
    ///
    /// Returns once the loop stops claiming; dispatched workers keep
    /// running on the tracker.
    pub async fn reconcile<P>(
        &self,
        edge: Transition,
        handler: Arc<dyn Handler<P>>,
        cancel: CancellationToken,
    ) -> Result<(), TransitionError>
    where
        P: Serialize + DeserializeOwned + Send + Sync + 'static,
    {
        self.table.require(&edge)?;
        let pool = Arc::new(Semaphore::new(self.config.max_parallelism));
        tracing::info!(
            resource = %self.kind,
            edge = %edge,
            max_parallelism = self.config.max_parallelism,
            "reconcile loop started"
        );

        loop {
            let permit = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                permit = Arc::clone(&pool).acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
            };
            if cancel.is_cancelled() {
                break;
            }

            match self.claim(edge).await {
                Ok(Some(doc)) => {
                    let worker = self.clone();
                    let handler = Arc::clone(&handler);
                    self.workers.spawn(async move {
                        worker.work(edge, doc, handler).await;
                        drop(permit);
                    });
                }
                Ok(None) => {
                    drop(permit);
                    if !sleep_or_cancel(&cancel, self.config.poll_interval).await {
                        break;
                    }
                }
                Err(e) => {
                    drop(permit);
                    tracing::error!(
                        resource = %self.kind,
                        edge = %edge,
                        error = %e,
                        "claim failed"
                    );
                    if !sleep_or_cancel(&cancel, self.config.store_error_backoff).await {
                        break;
                    }
                }
            }
        }

        tracing::info!(resource = %self.kind, edge = %edge, "reconcile loop stopped");
        Ok(())
    }

    /// Atomically move one eligible resource from `source` into `mid`
    pub async fn claim(&self, edge: Transition) -> Result<Option<Document>, StoreError> {
        let filter = Filter::new()
            .state(edge.source())
            .in_progress(false)
            .scheduled_before(self.clock.now());
        let update = Update::new()
            .state(edge.mid())
            .edge(edge.source(), edge.target())
            .in_progress(true);
        self.store
            .find_one_and_update(&filter, &update, SortOrder::ScheduledAt)
            .await
    }

    async fn work<P>(&self, edge: Transition, doc: Document, handler: Arc<dyn Handler<P>>)
    where
        P: Serialize + DeserializeOwned + Send + Sync + 'static,
    {
        let span = tracing::info_span!(
            "reconcile",
            resource = %self.kind,
            resource_id = %doc.id,
            source_state = %edge.source(),
            target_state = %edge.target(),
            retry_times = doc.lifecycle.retry_times,
        );
        async {
            let mut resource = match doc.decode::<P>() {
                Ok(resource) => resource,
                Err(e) => {
                    tracing::error!(error = %e, "failed to decode resource");
                    let update = self.fatal(edge, format!("failed to decode resource: {}", e));
                    self.settle(edge, &doc.id, update).await;
                    return;
                }
            };

            let start = Instant::now();
            let outcome = handler.handle(&mut resource).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;

            let update = match outcome {
                Ok(()) => match serde_json::to_value(&resource.payload) {
                    Ok(payload) => {
                        tracing::info!(elapsed_ms, "transition succeeded");
                        self.success(edge, payload)
                    }
                    Err(e) => {
                        tracing::error!(elapsed_ms, error = %e, "failed to encode resource");
                        self.fatal(edge, format!("failed to encode resource: {}", e))
                    }
                },
                Err(HandlerError::Retry(reason)) if self.retries_exhausted(&resource.lifecycle) => {
                    tracing::error!(elapsed_ms, error = %reason, "retry limit exceeded");
                    self.fatal(edge, format!("retry limit exceeded: {}", reason))
                }
                Err(HandlerError::Retry(reason)) => {
                    tracing::warn!(elapsed_ms, error = %reason, "transition deferred");
                    self.retry(edge, reason)
                }
                Err(HandlerError::Fatal(reason)) => {
                    tracing::error!(elapsed_ms, error = %reason, "transition failed");
                    self.fatal(edge, reason)
                }
            };
            self.settle(edge, &resource.id, update).await;
        }
        .instrument(span)
        .await
    }

    fn retries_exhausted(&self, lifecycle: &Lifecycle) -> bool {
        self.config
            .max_retries
            .is_some_and(|limit| lifecycle.retries_since_request() >= limit)
    }

    fn success(&self, edge: Transition, payload: serde_json::Value) -> Update {
        Update::new()
            .state(edge.target())
            .in_progress(false)
            .clear_error()
            .push_history(edge.source())
            .payload(payload)
    }

    fn retry(&self, edge: Transition, reason: String) -> Update {
        Update::new()
            .state(edge.source())
            .in_progress(false)
            .increment_retry()
            .scheduled_at(deadline(self.clock.now(), self.config.retry_backoff))
            .error(reason)
            .push_history(edge.source())
    }

    fn fatal(&self, edge: Transition, reason: String) -> Update {
        Update::new()
            .state(ResourceState::Error)
            .in_progress(false)
            .error(reason)
            .push_history(edge.source())
    }

    /// Write the outcome, but only while the claim taken for `edge` still holds
    async fn settle(&self, edge: Transition, id: &str, update: Update) {
        let filter = Filter::new().id(id).state(edge.mid()).in_progress(true);
        match self.store.update_one(&filter, &update).await {
            Ok(0) => tracing::warn!("claim no longer held, outcome dropped"),
            Ok(_) => {}
            // the claim stays in place until the next recovery pass
            Err(e) => tracing::error!(error = %e, "failed to settle resource"),
        }
    }
}

/// Sleep unless cancelled first; returns false on cancellation
async fn sleep_or_cancel(cancel: &CancellationToken, duration: Duration) -> bool {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(duration) => true,
    }
}

#[cfg(test)]
#[path = "reconciler_tests.rs"]
mod tests;
