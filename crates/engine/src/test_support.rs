// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared helpers for engine tests

use async_trait::async_trait;
use kiln_core::{FakeClock, ReconcilerConfig, ResourceState, SequentialIdGen};
use kiln_storage::{Document, Filter, MemoryStore, ResourceStore, SortOrder, StoreError, Update};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub type TestStore = MemoryStore<FakeClock, SequentialIdGen>;

pub fn store(clock: &FakeClock) -> TestStore {
    MemoryStore::in_memory(clock.clone(), SequentialIdGen::new("res"))
}

/// Loop settings that keep tests fast; backoff stays long so only the
/// fake clock can make a retried resource eligible again
pub fn fast_config() -> ReconcilerConfig {
    ReconcilerConfig {
        max_parallelism: 4,
        poll_interval: Duration::from_millis(5),
        retry_backoff: Duration::from_secs(10),
        store_error_backoff: Duration::from_millis(5),
        max_retries: None,
        drain_timeout: Duration::from_secs(5),
    }
}

/// Poll the store until `pred` holds for document `id`
pub async fn wait_for<S: ResourceStore>(
    store: &S,
    id: &str,
    pred: impl Fn(&Document) -> bool,
) -> Document {
    for _ in 0..1000 {
        if let Some(doc) = store.get(id).await.unwrap() {
            if pred(&doc) {
                return doc;
            }
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
    let current = store.get(id).await.unwrap();
    panic!("condition never held for {}: {:?}", id, current);
}

pub async fn wait_for_state<S: ResourceStore>(
    store: &S,
    id: &str,
    state: ResourceState,
) -> Document {
    wait_for(store, id, |doc| {
        doc.lifecycle.current_state == state && !doc.lifecycle.in_progress
    })
    .await
}

/// Store wrapper that fails claims and bulk updates on demand
#[derive(Clone)]
pub struct FaultyStore<S> {
    inner: S,
    failing_claims: Arc<AtomicUsize>,
    failing_bulk: Arc<AtomicUsize>,
    claim_attempts: Arc<AtomicUsize>,
}

impl<S> FaultyStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            failing_claims: Arc::new(AtomicUsize::new(0)),
            failing_bulk: Arc::new(AtomicUsize::new(0)),
            claim_attempts: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Fail the next `n` `find_one_and_update` calls
    pub fn fail_claims(&self, n: usize) {
        self.failing_claims.store(n, Ordering::SeqCst);
    }

    /// Fail the next `n` `update_many` calls
    pub fn fail_bulk(&self, n: usize) {
        self.failing_bulk.store(n, Ordering::SeqCst);
    }

    pub fn claim_attempts(&self) -> usize {
        self.claim_attempts.load(Ordering::SeqCst)
    }
}

fn take_failure(counter: &AtomicUsize) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

#[async_trait]
impl<S: ResourceStore> ResourceStore for FaultyStore<S> {
    async fn insert(
        &self,
        state: ResourceState,
        payload: serde_json::Value,
    ) -> Result<Document, StoreError> {
        self.inner.insert(state, payload).await
    }

    async fn get(&self, id: &str) -> Result<Option<Document>, StoreError> {
        self.inner.get(id).await
    }

    async fn list(&self, filter: &Filter) -> Result<Vec<Document>, StoreError> {
        self.inner.list(filter).await
    }

    async fn find_one_and_update(
        &self,
        filter: &Filter,
        update: &Update,
        sort: SortOrder,
    ) -> Result<Option<Document>, StoreError> {
        self.claim_attempts.fetch_add(1, Ordering::SeqCst);
        if take_failure(&self.failing_claims) {
            return Err(StoreError::Unavailable("injected claim failure".to_string()));
        }
        self.inner.find_one_and_update(filter, update, sort).await
    }

    async fn update_one(&self, filter: &Filter, update: &Update) -> Result<u64, StoreError> {
        self.inner.update_one(filter, update).await
    }

    async fn update_many(&self, filter: &Filter, update: &Update) -> Result<u64, StoreError> {
        if take_failure(&self.failing_bulk) {
            return Err(StoreError::Unavailable("injected bulk failure".to_string()));
        }
        self.inner.update_many(filter, update).await
    }
}

/// A gzipped tarball holding `files` (path, contents)
pub fn tar_gz(files: &[(&str, &str)]) -> Vec<u8> {
    let encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    let mut builder = tar::Builder::new(encoder);
    for (path, contents) in files {
        let mut header = tar::Header::new_gnu();
        header.set_size(contents.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, path, contents.as_bytes())
            .unwrap();
    }
    builder.into_inner().unwrap().finish().unwrap()
}

/// A tool resource as a handler receives it
pub fn tool_resource(
    id: &str,
    state: ResourceState,
) -> kiln_core::Resource<kiln_core::ToolPayload> {
    kiln_core::Resource {
        id: id.to_string(),
        lifecycle: kiln_core::Lifecycle::new(state, &FakeClock::new()),
        payload: kiln_core::ToolPayload::new(
            kiln_core::ToolMetadata {
                id: "weather".to_string(),
                name: "weather".to_string(),
                ..Default::default()
            },
            "weather/source.tar.gz",
        ),
    }
}
