// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Materialized state from WAL replay

use crate::document::{Document, Filter, SortOrder};
use crate::operation::Operation;
use std::collections::HashMap;

/// Current documents keyed by id
#[derive(Debug, Default, Clone)]
pub struct MaterializedState {
    documents: HashMap<String, Document>,
}

impl MaterializedState {
    /// Rebuild from a replayed operation log
    pub fn from_operations<'a>(ops: impl IntoIterator<Item = &'a Operation>) -> Self {
        let mut state = Self::default();
        for op in ops {
            state.apply(op);
        }
        state
    }

    /// Apply an operation to update the state
    pub fn apply(&mut self, op: &Operation) {
        match op {
            Operation::Insert { document } | Operation::Update { document } => {
                self.documents.insert(document.id.clone(), document.clone());
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<&Document> {
        self.documents.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.documents.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Every matching document, oldest first
    pub fn find(&self, filter: &Filter) -> Vec<&Document> {
        let mut docs: Vec<_> = self
            .documents
            .values()
            .filter(|doc| filter.matches(doc))
            .collect();
        docs.sort_by(|a, b| SortOrder::CreatedAt.compare(a, b));
        docs
    }

    /// The first matching document under `sort`
    pub fn select_one(&self, filter: &Filter, sort: SortOrder) -> Option<&Document> {
        self.documents
            .values()
            .filter(|doc| filter.matches(doc))
            .min_by(|a, b| sort.compare(a, b))
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
