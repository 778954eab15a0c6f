// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle management: startup, shutdown, recovery.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

use fs2::FileExt;
use kiln_adapters::{
    BuildService, LocalObjectStore, NoOpOrchestrator, ObjectStore, Orchestrator,
    ShellBuildService, TracedBuildService, TracedObjectStore, TracedOrchestrator,
};
use kiln_core::{Config, ConfigError, SystemClock, UuidIdGen};
use kiln_engine::{tool, ControllerError, ControllerHandle, ToolRequests};
use kiln_storage::{StoreError, WalStore};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Store backing the daemon: WAL-journaled, wall clock, random ids
pub type DaemonStore = WalStore<SystemClock, UuidIdGen>;

/// Production adapters, wrapped with tracing
pub type DaemonAdapters = Adapters<
    TracedObjectStore<LocalObjectStore>,
    TracedBuildService<ShellBuildService>,
    TracedOrchestrator<NoOpOrchestrator>,
>;

/// External collaborators handed to the tool handlers
#[derive(Clone)]
pub struct Adapters<O, B, R> {
    pub objects: O,
    pub builds: B,
    pub orchestrator: R,
}

impl DaemonAdapters {
    pub fn from_config(config: &Config) -> Self {
        Self {
            objects: TracedObjectStore::new(LocalObjectStore::from_config(&config.objects)),
            builds: TracedBuildService::new(ShellBuildService::new(config.build.command.clone())),
            orchestrator: TracedOrchestrator::new(NoOpOrchestrator::new(config.deploy.clone())),
        }
    }
}

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("failed to acquire lock {}: daemon already running?", .0.display())]
    LockFailed(PathBuf, #[source] std::io::Error),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("controller error: {0}")]
    Controller(#[from] ControllerError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A running daemon
pub struct Daemon {
    config: Config,
    // NOTE(lifetime): Held to maintain exclusive file lock; released on drop
    #[allow(dead_code)]
    lock_file: File,
    controller: ControllerHandle,
    requests: ToolRequests<DaemonStore, SystemClock>,
}

impl Daemon {
    /// In-process enqueue interface onto the daemon's store
    pub fn requests(&self) -> &ToolRequests<DaemonStore, SystemClock> {
        &self.requests
    }

    /// Claims released by crash recovery during startup
    pub fn recovered(&self) -> u64 {
        self.controller.recovered()
    }

    pub fn in_flight(&self) -> usize {
        self.controller.in_flight()
    }

    /// Stop claiming, drain in-flight work, then release the lock
    pub async fn shutdown(self) -> Result<(), LifecycleError> {
        info!("shutting down daemon");
        let drained = self
            .controller
            .shutdown(self.config.reconciler.drain_timeout)
            .await;

        // Remove PID file; the lock itself goes with the file handle
        let lock_path = self.config.lock_path();
        if lock_path.exists() {
            if let Err(e) = std::fs::remove_file(&lock_path) {
                warn!(error = %e, "failed to remove PID file");
            }
        }

        drained?;
        info!("daemon shutdown complete");
        Ok(())
    }
}

/// Start the daemon with production adapters
pub async fn startup(config: &Config) -> Result<Daemon, LifecycleError> {
    startup_with(config, DaemonAdapters::from_config(config)).await
}

/// Start the daemon with the given adapters
pub async fn startup_with<O, B, R>(
    config: &Config,
    adapters: Adapters<O, B, R>,
) -> Result<Daemon, LifecycleError>
where
    O: ObjectStore,
    B: BuildService,
    R: Orchestrator,
{
    match startup_inner(config, adapters).await {
        Ok(daemon) => Ok(daemon),
        // Another daemon owns the PID file
        Err(e @ LifecycleError::LockFailed(..)) => Err(e),
        Err(e) => {
            cleanup_on_failure(config);
            Err(e)
        }
    }
}

/// Inner startup logic - cleanup_on_failure called if this fails
async fn startup_inner<O, B, R>(
    config: &Config,
    adapters: Adapters<O, B, R>,
) -> Result<Daemon, LifecycleError>
where
    O: ObjectStore,
    B: BuildService,
    R: Orchestrator,
{
    config.validate()?;

    // 1. Create state directory
    std::fs::create_dir_all(&config.state_dir)?;

    // 2. Acquire lock file FIRST - two daemons must never share a WAL
    let lock_path = config.lock_path();
    let mut lock_file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(false)
        .open(&lock_path)?;
    lock_file
        .try_lock_exclusive()
        .map_err(|e| LifecycleError::LockFailed(lock_path.clone(), e))?;
    lock_file.set_len(0)?;
    writeln!(lock_file, "{}", std::process::id())?;

    // 3. Create directories
    let wal_path = config.wal_path();
    if let Some(parent) = wal_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::create_dir_all(&config.build.workdir)?;

    // 4. Load state from WAL
    let store = DaemonStore::open(&wal_path, SystemClock, UuidIdGen)?;

    // 5. Recover orphaned claims and launch one loop per tool edge
    let controller = tool::controller(
        store.clone(),
        SystemClock,
        config,
        adapters.objects,
        adapters.builds,
        adapters.orchestrator,
    )?;
    let controller = controller.start(CancellationToken::new()).await?;

    info!(
        state_dir = %config.state_dir.display(),
        recovered = controller.recovered(),
        "daemon started"
    );

    Ok(Daemon {
        config: config.clone(),
        lock_file,
        controller,
        requests: ToolRequests::new(store, SystemClock),
    })
}

/// Clean up resources on startup failure
fn cleanup_on_failure(config: &Config) {
    let lock_path = config.lock_path();
    if lock_path.exists() {
        let _ = std::fs::remove_file(&lock_path);
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
