// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Kiln reconcile engine
//!
//! One [`Reconciler`] loop per declared edge claims eligible resources from
//! the store, hands them to a [`Handler`] under a bounded worker pool, and
//! settles the outcome. [`Controller`] runs crash recovery and launches the
//! loops; [`tool`] holds the tool lifecycle handlers.

mod controller;
mod error;
mod handler;
mod reconciler;
mod recovery;
mod requests;
pub mod tool;

#[cfg(test)]
mod test_support;

pub use controller::{Controller, ControllerHandle};
pub use error::{ControllerError, HandlerError, RequestError};
pub use handler::Handler;
pub use reconciler::Reconciler;
pub use recovery::recover;
pub use requests::{ToolRequests, ToolStatus, ToolSubmission};
