// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon configuration
//!
//! Loaded from a TOML file. Every field has a default, so an empty file is a
//! valid configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Errors loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {}", .0.display(), .1)]
    Read(PathBuf, #[source] std::io::Error),
    #[error("failed to parse config {}: {}", .0.display(), .1)]
    Parse(PathBuf, #[source] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Directory holding the WAL, pid file and log
    pub state_dir: PathBuf,
    pub reconciler: ReconcilerConfig,
    pub objects: ObjectsConfig,
    pub build: BuildConfig,
    pub deploy: DeployConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            state_dir: PathBuf::from("/var/lib/kiln"),
            reconciler: ReconcilerConfig::default(),
            objects: ObjectsConfig::default(),
            build: BuildConfig::default(),
            deploy: DeployConfig::default(),
        }
    }
}

impl Config {
    /// Load and validate configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Read(path.to_path_buf(), e))?;
        let config: Config =
            toml::from_str(&content).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.reconciler.max_parallelism == 0 {
            return Err(ConfigError::Invalid(
                "reconciler.max_parallelism must be at least 1".to_string(),
            ));
        }
        if self.reconciler.poll_interval.is_zero() {
            // a zero poll interval turns an idle loop into a busy spin
            return Err(ConfigError::Invalid(
                "reconciler.poll_interval must be non-zero".to_string(),
            ));
        }
        if self.build.poll_interval.is_zero() {
            return Err(ConfigError::Invalid(
                "build.poll_interval must be non-zero".to_string(),
            ));
        }
        if !self.deploy.access_endpoint.contains("{name}") {
            return Err(ConfigError::Invalid(
                "deploy.access_endpoint must contain {name}".to_string(),
            ));
        }
        Ok(())
    }

    pub fn wal_path(&self) -> PathBuf {
        self.state_dir.join("wal").join("tools.wal")
    }

    pub fn lock_path(&self) -> PathBuf {
        self.state_dir.join("kilnd.pid")
    }

    pub fn log_path(&self) -> PathBuf {
        self.state_dir.join("kilnd.log")
    }
}

/// Reconcile loop tuning, shared by every edge of a controller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReconcilerConfig {
    /// Concurrent workers per edge
    pub max_parallelism: usize,
    /// Sleep when no resource is eligible
    #[serde(with = "humantime_serde")]
    pub poll_interval: Duration,
    /// Fixed delay before a retryable failure becomes eligible again
    #[serde(with = "humantime_serde")]
    pub retry_backoff: Duration,
    /// Extra sleep after the store fails a claim round-trip
    #[serde(with = "humantime_serde")]
    pub store_error_backoff: Duration,
    /// Retryable failures tolerated before the resource is failed; `None` is unbounded
    pub max_retries: Option<u32>,
    /// How long shutdown waits for in-flight workers
    #[serde(with = "humantime_serde")]
    pub drain_timeout: Duration,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            max_parallelism: 64,
            poll_interval: Duration::from_secs(1),
            retry_backoff: Duration::from_secs(10),
            store_error_backoff: Duration::from_secs(10),
            max_retries: None,
            drain_timeout: Duration::from_secs(30),
        }
    }
}

/// Object store layout
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ObjectsConfig {
    pub root: PathBuf,
    pub bucket: String,
}

impl Default for ObjectsConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("/var/lib/kiln/objects"),
            bucket: "tools".to_string(),
        }
    }
}

/// Build pipeline settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Scratch directory for extracted bundles
    pub workdir: PathBuf,
    pub registry: String,
    pub image_repo: String,
    /// Shell command run by the build service in the extracted bundle
    pub command: String,
    #[serde(with = "humantime_serde")]
    pub poll_interval: Duration,
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            workdir: std::env::temp_dir().join("kiln-build"),
            registry: "registry.local".to_string(),
            image_repo: "tools".to_string(),
            command: "docker build -t \"$KILN_IMAGE_REPO:$KILN_IMAGE_TAG\" . \
                      && docker run --rm \"$KILN_IMAGE_REPO:$KILN_IMAGE_TAG\" spec > \"$KILN_REPORT_PATH\""
                .to_string(),
            poll_interval: Duration::from_secs(5),
            timeout: Duration::from_secs(30 * 60),
        }
    }
}

/// Runtime cluster settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DeployConfig {
    pub namespace: String,
    /// Port the tool serves on inside its workload
    pub port: u16,
    /// Address template for a created endpoint; `{name}` is the workload name
    pub access_endpoint: String,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            namespace: "tools".to_string(),
            port: 9140,
            access_endpoint: "http://{name}.tools.svc.cluster.local:9140".to_string(),
        }
    }
}

impl DeployConfig {
    pub fn endpoint_for(&self, name: &str) -> String {
        self.access_endpoint.replace("{name}", name)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
