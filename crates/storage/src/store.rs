// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The resource store contract and its local implementation

use crate::document::{Document, Filter, SortOrder, Update};
use crate::operation::Operation;
use crate::state::MaterializedState;
use crate::wal::{Wal, WalError};
use async_trait::async_trait;
use kiln_core::{Clock, IdGen, Lifecycle, ResourceState, SystemClock, UuidIdGen};
use std::path::Path;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors from store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("journal write failed: {0}")]
    Journal(#[from] WalError),
    #[error("document already exists: {0}")]
    Duplicate(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Durable, atomic single-document storage for managed resources
///
/// Every operation is linearizable per document: two concurrent
/// `find_one_and_update` calls never both observe the same pre-image.
#[async_trait]
pub trait ResourceStore: Clone + Send + Sync + 'static {
    /// Create a new document in `state`, eligible immediately
    async fn insert(
        &self,
        state: ResourceState,
        payload: serde_json::Value,
    ) -> Result<Document, StoreError>;

    async fn get(&self, id: &str) -> Result<Option<Document>, StoreError>;

    /// Matching documents, oldest first
    async fn list(&self, filter: &Filter) -> Result<Vec<Document>, StoreError>;

    /// Atomically update the first match under `sort`, returning the post-image
    async fn find_one_and_update(
        &self,
        filter: &Filter,
        update: &Update,
        sort: SortOrder,
    ) -> Result<Option<Document>, StoreError>;

    /// Update at most one match; returns the number matched
    async fn update_one(&self, filter: &Filter, update: &Update) -> Result<u64, StoreError>;

    /// Update every match; returns the number matched
    async fn update_many(&self, filter: &Filter, update: &Update) -> Result<u64, StoreError>;
}

/// Durable record of committed operations
pub trait Journal: Send + 'static {
    fn record(&mut self, op: &Operation) -> Result<(), StoreError>;
}

/// Journal for stores that do not outlive the process
#[derive(Debug, Default, Clone, Copy)]
pub struct NoJournal;

impl Journal for NoJournal {
    fn record(&mut self, _op: &Operation) -> Result<(), StoreError> {
        Ok(())
    }
}

impl Journal for Wal {
    fn record(&mut self, op: &Operation) -> Result<(), StoreError> {
        self.append(op)?;
        Ok(())
    }
}

struct Inner<J> {
    state: MaterializedState,
    journal: J,
}

impl<J: Journal> Inner<J> {
    /// Journal first; the in-memory view only changes once the write is durable
    fn commit(&mut self, op: Operation) -> Result<(), StoreError> {
        self.journal.record(&op)?;
        self.state.apply(&op);
        Ok(())
    }
}

/// Single-process store: materialized state behind one lock, plus a journal
pub struct LocalStore<J, C = SystemClock, I = UuidIdGen> {
    inner: Arc<Mutex<Inner<J>>>,
    clock: C,
    id_gen: I,
}

/// Volatile store for tests and embedding
pub type MemoryStore<C = SystemClock, I = UuidIdGen> = LocalStore<NoJournal, C, I>;

/// Store persisted to a write-ahead log
pub type WalStore<C = SystemClock, I = UuidIdGen> = LocalStore<Wal, C, I>;

impl<J, C: Clone, I: Clone> Clone for LocalStore<J, C, I> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            clock: self.clock.clone(),
            id_gen: self.id_gen.clone(),
        }
    }
}

impl<C: Clock, I: IdGen> LocalStore<NoJournal, C, I> {
    pub fn in_memory(clock: C, id_gen: I) -> Self {
        Self::with_state(MaterializedState::default(), NoJournal, clock, id_gen)
    }
}

impl<C: Clock, I: IdGen> LocalStore<Wal, C, I> {
    /// Replay the log at `path` and continue appending to it
    pub fn open(path: &Path, clock: C, id_gen: I) -> Result<Self, StoreError> {
        let ops = Wal::replay(path)?;
        let state = MaterializedState::from_operations(&ops);
        let wal = Wal::open(path)?;
        tracing::info!(
            path = %path.display(),
            operations = ops.len(),
            documents = state.len(),
            "resource store opened"
        );
        Ok(Self::with_state(state, wal, clock, id_gen))
    }
}

impl<J: Journal, C: Clock, I: IdGen> LocalStore<J, C, I> {
    fn with_state(state: MaterializedState, journal: J, clock: C, id_gen: I) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner { state, journal })),
            clock,
            id_gen,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner<J>> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Apply `update` to each id in turn, stopping at the first journal failure
    fn update_ids(
        &self,
        inner: &mut Inner<J>,
        ids: Vec<String>,
        update: &Update,
    ) -> Result<Vec<Document>, StoreError> {
        let now = self.clock.now();
        let mut updated = Vec::with_capacity(ids.len());
        for id in ids {
            let Some(current) = inner.state.get(&id) else {
                continue;
            };
            let mut document = current.clone();
            update.apply(&mut document, now);
            inner.commit(Operation::Update {
                document: document.clone(),
            })?;
            updated.push(document);
        }
        Ok(updated)
    }
}

#[async_trait]
impl<J: Journal, C: Clock, I: IdGen> ResourceStore for LocalStore<J, C, I> {
    async fn insert(
        &self,
        state: ResourceState,
        payload: serde_json::Value,
    ) -> Result<Document, StoreError> {
        let document = Document {
            id: self.id_gen.next(),
            lifecycle: Lifecycle::new(state, &self.clock),
            payload,
        };
        let mut inner = self.lock();
        if inner.state.contains(&document.id) {
            return Err(StoreError::Duplicate(document.id));
        }
        inner.commit(Operation::Insert {
            document: document.clone(),
        })?;
        Ok(document)
    }

    async fn get(&self, id: &str) -> Result<Option<Document>, StoreError> {
        Ok(self.lock().state.get(id).cloned())
    }

    async fn list(&self, filter: &Filter) -> Result<Vec<Document>, StoreError> {
        Ok(self
            .lock()
            .state
            .find(filter)
            .into_iter()
            .cloned()
            .collect())
    }

    async fn find_one_and_update(
        &self,
        filter: &Filter,
        update: &Update,
        sort: SortOrder,
    ) -> Result<Option<Document>, StoreError> {
        let mut inner = self.lock();
        let Some(id) = inner
            .state
            .select_one(filter, sort)
            .map(|doc| doc.id.clone())
        else {
            return Ok(None);
        };
        let mut updated = self.update_ids(&mut inner, vec![id], update)?;
        Ok(updated.pop())
    }

    async fn update_one(&self, filter: &Filter, update: &Update) -> Result<u64, StoreError> {
        let mut inner = self.lock();
        let Some(id) = inner
            .state
            .select_one(filter, SortOrder::CreatedAt)
            .map(|doc| doc.id.clone())
        else {
            return Ok(0);
        };
        let updated = self.update_ids(&mut inner, vec![id], update)?;
        Ok(updated.len() as u64)
    }

    async fn update_many(&self, filter: &Filter, update: &Update) -> Result<u64, StoreError> {
        let mut inner = self.lock();
        let ids = inner
            .state
            .find(filter)
            .into_iter()
            .map(|doc| doc.id.clone())
            .collect();
        let updated = self.update_ids(&mut inner, ids, update)?;
        Ok(updated.len() as u64)
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
