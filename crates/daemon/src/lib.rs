// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! kiln-daemon: process bootstrap for `kilnd`

pub mod lifecycle;

pub use lifecycle::{startup, startup_with, Adapters, Daemon, DaemonStore, LifecycleError};
