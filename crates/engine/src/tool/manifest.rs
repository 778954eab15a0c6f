// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `tool.yml` manifests and build reports

use crate::error::HandlerError;
use kiln_core::{ToolDependency, ToolEnv};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const MANIFEST_FILE: &str = "tool.yml";

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("bundle has no tool.yml at {}", .0.display())]
    Missing(PathBuf),
    #[error("failed to read tool.yml: {0}")]
    Read(#[from] std::io::Error),
    #[error("failed to parse tool.yml: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("invalid tool.yml: {0}")]
    Invalid(String),
}

impl From<ManifestError> for HandlerError {
    fn from(e: ManifestError) -> Self {
        HandlerError::Fatal(e.to_string())
    }
}

/// Build definition shipped at the root of every source bundle
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ToolManifest {
    /// Entry module
    pub main: String,
    /// Tool class inside `main`
    pub class: String,
    #[serde(default)]
    pub dependencies: Vec<ToolDependency>,
    #[serde(default)]
    pub env: Vec<ToolEnv>,
}

impl ToolManifest {
    pub fn parse(raw: &str) -> Result<Self, ManifestError> {
        let manifest: ToolManifest = serde_yaml::from_str(raw)?;
        if manifest.main.trim().is_empty() {
            return Err(ManifestError::Invalid("`main` is empty".to_string()));
        }
        if manifest.class.trim().is_empty() {
            return Err(ManifestError::Invalid("`class` is empty".to_string()));
        }
        Ok(manifest)
    }

    /// Read the manifest from an extracted bundle directory
    pub fn load(dir: &Path) -> Result<Self, ManifestError> {
        let path = dir.join(MANIFEST_FILE);
        if !path.is_file() {
            return Err(ManifestError::Missing(dir.to_path_buf()));
        }
        Self::parse(&std::fs::read_to_string(&path)?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReportMetadata {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// What a succeeded build reports about the tool it packaged
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BuildReport {
    pub metadata: ReportMetadata,
    #[serde(default)]
    pub spec: serde_json::Value,
}

impl BuildReport {
    pub fn from_value(value: serde_json::Value) -> Result<Self, HandlerError> {
        serde_json::from_value(value)
            .map_err(|e| HandlerError::fatal(format!("failed to parse build report: {}", e)))
    }
}

#[cfg(test)]
#[path = "manifest_tests.rs"]
mod tests;
