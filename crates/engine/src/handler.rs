// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-edge business logic

use crate::error::HandlerError;
use async_trait::async_trait;
use kiln_core::Resource;

/// Business logic bound to one transition edge
///
/// Handlers may mutate the payload; the engine persists it on success.
/// They never touch lifecycle fields and must tolerate being invoked
/// again for the same resource after a crash.
#[async_trait]
pub trait Handler<P>: Send + Sync + 'static {
    async fn handle(&self, resource: &mut Resource<P>) -> Result<(), HandlerError>;
}
