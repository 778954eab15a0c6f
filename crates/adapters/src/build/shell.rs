// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Build service that runs a configured shell command per build

use super::{BuildError, BuildId, BuildParams, BuildService, BuildStatus};
use async_trait::async_trait;
use std::collections::HashMap;
use std::fs::File;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::process::{Child, Command};

const REPORT_FILE: &str = "kiln-report.json";
const LOG_FILE: &str = "kiln-build.log";

struct ShellBuild {
    child: Child,
    report_path: PathBuf,
    log_path: PathBuf,
    status: BuildStatus,
}

/// Runs `sh -c <command>` in the build context directory
///
/// The command receives `KILN_IMAGE_REPO`, `KILN_IMAGE_TAG`,
/// `KILN_SOURCE_KEY`, `KILN_CONTEXT_DIR` and `KILN_REPORT_PATH`, and is
/// expected to write its JSON report to the latter.
#[derive(Clone)]
pub struct ShellBuildService {
    command: String,
    builds: Arc<Mutex<HashMap<BuildId, ShellBuild>>>,
    counter: Arc<AtomicU64>,
}

impl ShellBuildService {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            builds: Arc::new(Mutex::new(HashMap::new())),
            counter: Arc::new(AtomicU64::new(1)),
        }
    }
}

#[async_trait]
impl BuildService for ShellBuildService {
    async fn start_build(&self, params: &BuildParams) -> Result<BuildId, BuildError> {
        let id = BuildId(format!(
            "{}-{}",
            params.image_tag,
            self.counter.fetch_add(1, Ordering::SeqCst)
        ));
        let report_path = params.context_dir.join(REPORT_FILE);
        let log_path = params.context_dir.join(LOG_FILE);

        let log = File::create(&log_path).map_err(|e| BuildError::Start(e.to_string()))?;
        let log_err = log
            .try_clone()
            .map_err(|e| BuildError::Start(e.to_string()))?;

        let child = Command::new("sh")
            .arg("-c")
            .arg(&self.command)
            .current_dir(&params.context_dir)
            .env("KILN_IMAGE_REPO", &params.image_repo)
            .env("KILN_IMAGE_TAG", &params.image_tag)
            .env("KILN_SOURCE_KEY", &params.source_key)
            .env("KILN_CONTEXT_DIR", &params.context_dir)
            .env("KILN_REPORT_PATH", &report_path)
            .stdin(Stdio::null())
            .stdout(Stdio::from(log))
            .stderr(Stdio::from(log_err))
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| BuildError::Start(e.to_string()))?;

        self.builds.lock().unwrap_or_else(|e| e.into_inner()).insert(
            id.clone(),
            ShellBuild {
                child,
                report_path,
                log_path,
                status: BuildStatus::InProgress,
            },
        );
        Ok(id)
    }

    async fn build_status(&self, id: &BuildId) -> Result<BuildStatus, BuildError> {
        let mut builds = self.builds.lock().unwrap_or_else(|e| e.into_inner());
        let build = builds
            .get_mut(id)
            .ok_or_else(|| BuildError::UnknownBuild(id.to_string()))?;

        if build.status.is_terminal() {
            return Ok(build.status.clone());
        }

        build.status = match build.child.try_wait() {
            Ok(None) => BuildStatus::InProgress,
            Ok(Some(exit)) if exit.success() => BuildStatus::Succeeded,
            Ok(Some(exit)) => BuildStatus::Failed {
                reason: format!(
                    "build command exited with {} (see {})",
                    exit,
                    build.log_path.display()
                ),
            },
            Err(e) => BuildStatus::Failed {
                reason: format!("failed to poll build command: {}", e),
            },
        };
        Ok(build.status.clone())
    }

    async fn fetch_report(&self, id: &BuildId) -> Result<serde_json::Value, BuildError> {
        let report_path = {
            let builds = self.builds.lock().unwrap_or_else(|e| e.into_inner());
            let build = builds
                .get(id)
                .ok_or_else(|| BuildError::UnknownBuild(id.to_string()))?;
            if build.status != BuildStatus::Succeeded {
                return Err(BuildError::Report(format!("build {} has not succeeded", id)));
            }
            build.report_path.clone()
        };

        let raw = tokio::fs::read(&report_path)
            .await
            .map_err(|e| BuildError::Report(format!("{}: {}", report_path.display(), e)))?;
        let report = serde_json::from_slice(&raw)
            .map_err(|e| BuildError::Report(format!("{}: {}", report_path.display(), e)))?;

        self.builds
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(id);
        Ok(report)
    }
}

#[cfg(test)]
#[path = "shell_tests.rs"]
mod tests;
