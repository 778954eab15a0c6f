// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! kiln-core: domain model for the kiln reconciler
//!
//! This crate provides:
//! - The resource state enumeration and the declared transition edges
//! - Lifecycle bookkeeping shared by every managed resource
//! - Tool payload types
//! - Clock and ID abstractions so time and identity are testable
//! - TOML configuration

pub mod clock;
pub mod config;
pub mod id;
pub mod resource;
pub mod state;
pub mod tool;
pub mod transition;

pub use clock::{deadline, Clock, FakeClock, SystemClock};
pub use config::{
    BuildConfig, Config, ConfigError, DeployConfig, ObjectsConfig, ReconcilerConfig,
};
pub use id::{IdGen, SequentialIdGen, UuidIdGen};
pub use resource::{Lifecycle, Resource};
pub use state::{ResourceState, UnknownState};
pub use tool::{ToolDependency, ToolEnv, ToolMetadata, ToolPayload};
pub use transition::{Transition, TransitionError, TransitionTable};
