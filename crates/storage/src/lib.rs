// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Resource store: the single source of truth for every lifecycle
//!
//! All coordination between reconcile loops happens through the atomic
//! single-document operations exposed by [`ResourceStore`].

mod document;
mod operation;
mod state;
mod store;
mod wal;

pub use document::{Document, Filter, SortOrder, StateChange, Update};
pub use operation::Operation;
pub use state::MaterializedState;
pub use store::{Journal, LocalStore, MemoryStore, NoJournal, ResourceStore, StoreError, WalStore};
pub use wal::{Wal, WalError};
