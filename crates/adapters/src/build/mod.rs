// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Container image build service

mod shell;

pub use shell::ShellBuildService;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{BuildCall, FakeBuildService};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Errors from build service operations
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("failed to start build: {0}")]
    Start(String),
    #[error("unknown build: {0}")]
    UnknownBuild(String),
    #[error("build report unavailable: {0}")]
    Report(String),
}

/// Inputs for a single image build
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildParams {
    /// Extracted source bundle used as the build context
    pub context_dir: PathBuf,
    pub image_repo: String,
    pub image_tag: String,
    pub source_key: String,
}

/// Opaque handle of a started build
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BuildId(pub String);

impl fmt::Display for BuildId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BuildStatus {
    InProgress,
    Succeeded,
    Failed { reason: String },
}

impl BuildStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, BuildStatus::InProgress)
    }
}

/// Starts image builds and reports on them
#[async_trait]
pub trait BuildService: Clone + Send + Sync + 'static {
    async fn start_build(&self, params: &BuildParams) -> Result<BuildId, BuildError>;

    async fn build_status(&self, id: &BuildId) -> Result<BuildStatus, BuildError>;

    /// The JSON report a succeeded build produced
    async fn fetch_report(&self, id: &BuildId) -> Result<serde_json::Value, BuildError>;
}
