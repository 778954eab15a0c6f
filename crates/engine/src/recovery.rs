// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Crash recovery for claims orphaned by a previous process

use kiln_storage::{Filter, ResourceStore, StoreError, Update};

/// Release every claim: each in-progress resource returns to its source state
///
/// Must complete before any reconcile loop starts. Idempotent; returns the
/// number of resources released.
pub async fn recover<S: ResourceStore>(store: &S) -> Result<u64, StoreError> {
    let released = store
        .update_many(
            &Filter::new().in_progress(true),
            &Update::new().revert_to_source().in_progress(false),
        )
        .await?;

    if released > 0 {
        tracing::warn!(released, "released claims left by a previous run");
    } else {
        tracing::info!("no orphaned claims");
    }
    Ok(released)
}

#[cfg(test)]
#[path = "recovery_tests.rs"]
mod tests;
