// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tool payload carried by tool resources

use serde::{Deserialize, Serialize};

/// Descriptive metadata for a submitted tool
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolMetadata {
    /// Tenant-visible tool identifier; also the object-store prefix of its bundle
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub authors: Vec<String>,
}

/// An environment variable handed to the running tool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolEnv {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub secret: bool,
}

/// A package the tool needs at runtime
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolDependency {
    pub name: String,
    #[serde(default)]
    pub version: String,
}

/// Kind-specific data of a tool resource
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolPayload {
    pub metadata: ToolMetadata,
    #[serde(default)]
    pub version: String,
    /// Object-store key of the uploaded source bundle
    pub source_key: String,
    #[serde(default)]
    pub env: Vec<ToolEnv>,
    #[serde(default)]
    pub dependencies: Vec<ToolDependency>,
    /// Image reference produced by the build
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Function specification reported by the build, kept opaque
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_spec: Option<serde_json::Value>,
    /// Workload name in the runtime cluster
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deploy_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_url: Option<String>,
}

impl ToolPayload {
    pub fn new(metadata: ToolMetadata, source_key: impl Into<String>) -> Self {
        Self {
            metadata,
            source_key: source_key.into(),
            ..Self::default()
        }
    }

    /// Object key of the bundle for a tool that used the default layout
    pub fn default_source_key(tool_id: &str) -> String {
        format!("{}/source.tar.gz", tool_id)
    }
}

#[cfg(test)]
#[path = "tool_tests.rs"]
mod tests;
