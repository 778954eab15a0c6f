// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! created → building → built

use super::manifest::{BuildReport, ToolManifest, MANIFEST_FILE};
use crate::error::HandlerError;
use crate::handler::Handler;
use async_trait::async_trait;
use flate2::read::GzDecoder;
use kiln_adapters::{BuildId, BuildParams, BuildService, BuildStatus, ObjectStore};
use kiln_core::{BuildConfig, Resource, ToolPayload};
use std::fs::File;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

const BUNDLE_FILE: &str = "source.tar.gz";
const SOURCE_DIR: &str = "source";

/// Turns an uploaded source bundle into an image and a function spec
pub struct BuildHandler<O, B> {
    objects: O,
    builds: B,
    config: BuildConfig,
}

impl<O: ObjectStore, B: BuildService> BuildHandler<O, B> {
    pub fn new(objects: O, builds: B, config: BuildConfig) -> Self {
        Self {
            objects,
            builds,
            config,
        }
    }

    fn image_for(&self, resource_id: &str) -> String {
        format!(
            "{}/{}:{}",
            self.config.registry, self.config.image_repo, resource_id
        )
    }

    async fn build(
        &self,
        workdir: &Path,
        resource: &mut Resource<ToolPayload>,
    ) -> Result<(), HandlerError> {
        remove_dir(workdir).await.map_err(workdir_error)?;
        tokio::fs::create_dir_all(workdir)
            .await
            .map_err(workdir_error)?;

        let source_key = if resource.payload.source_key.is_empty() {
            ToolPayload::default_source_key(&resource.payload.metadata.id)
        } else {
            resource.payload.source_key.clone()
        };
        let bundle = workdir.join(BUNDLE_FILE);
        self.objects.download(&source_key, &bundle).await?;

        let source_dir = workdir.join(SOURCE_DIR);
        let (context_dir, manifest) =
            tokio::task::spawn_blocking(move || unpack_bundle(&bundle, &source_dir))
                .await
                .map_err(|e| HandlerError::fatal(format!("bundle extraction panicked: {}", e)))??;
        tracing::info!(
            main = %manifest.main,
            class = %manifest.class,
            dependencies = manifest.dependencies.len(),
            "manifest loaded"
        );

        let params = BuildParams {
            context_dir,
            image_repo: format!("{}/{}", self.config.registry, self.config.image_repo),
            image_tag: resource.id.clone(),
            source_key,
        };
        let build_id = self.builds.start_build(&params).await?;
        self.wait_for(&build_id).await?;
        let report = BuildReport::from_value(self.builds.fetch_report(&build_id).await?)?;

        let payload = &mut resource.payload;
        payload.metadata.name = report.metadata.name;
        payload.metadata.description = report.metadata.description;
        payload.function_spec = Some(report.spec);
        payload.env = manifest.env;
        payload.dependencies = manifest.dependencies;
        payload.image = Some(self.image_for(&resource.id));
        Ok(())
    }

    /// Poll until the build is terminal or the timeout passes
    async fn wait_for(&self, build_id: &BuildId) -> Result<(), HandlerError> {
        let started = tokio::time::Instant::now();
        loop {
            match self.builds.build_status(build_id).await? {
                BuildStatus::Succeeded => return Ok(()),
                BuildStatus::Failed { reason } => {
                    return Err(HandlerError::fatal(format!(
                        "build {} failed: {}",
                        build_id, reason
                    )))
                }
                BuildStatus::InProgress => {}
            }
            if started.elapsed() >= self.config.timeout {
                return Err(HandlerError::fatal(format!(
                    "build {} timed out after {:?}",
                    build_id, self.config.timeout
                )));
            }
            tokio::time::sleep(self.config.poll_interval).await;
        }
    }
}

#[async_trait]
impl<O: ObjectStore, B: BuildService> Handler<ToolPayload> for BuildHandler<O, B> {
    async fn handle(&self, resource: &mut Resource<ToolPayload>) -> Result<(), HandlerError> {
        let workdir = self.config.workdir.join(&resource.id);
        let result = self.build(&workdir, resource).await;
        if let Err(e) = remove_dir(&workdir).await {
            tracing::warn!(workdir = %workdir.display(), error = %e, "failed to remove work directory");
        }
        result
    }
}

async fn remove_dir(path: &Path) -> std::io::Result<()> {
    match tokio::fs::remove_dir_all(path).await {
        Err(e) if e.kind() != ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

fn workdir_error(e: std::io::Error) -> HandlerError {
    HandlerError::fatal(format!("failed to prepare work directory: {}", e))
}

/// Extract a gzipped tarball and read its manifest
///
/// The manifest may sit at the archive root or inside a single top-level
/// directory; that directory becomes the build context.
fn unpack_bundle(bundle: &Path, dest: &Path) -> Result<(PathBuf, ToolManifest), HandlerError> {
    let file = File::open(bundle)
        .map_err(|e| HandlerError::fatal(format!("failed to open bundle: {}", e)))?;
    tar::Archive::new(GzDecoder::new(file))
        .unpack(dest)
        .map_err(|e| HandlerError::fatal(format!("failed to extract bundle: {}", e)))?;

    let context = locate_context(dest)
        .map_err(|e| HandlerError::fatal(format!("failed to read bundle: {}", e)))?;
    let manifest = ToolManifest::load(&context)?;
    Ok((context, manifest))
}

fn locate_context(root: &Path) -> std::io::Result<PathBuf> {
    if root.join(MANIFEST_FILE).is_file() {
        return Ok(root.to_path_buf());
    }
    let mut dirs = Vec::new();
    for entry in std::fs::read_dir(root)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            dirs.push(entry.path());
        }
    }
    match dirs.as_slice() {
        [only] if only.join(MANIFEST_FILE).is_file() => Ok(only.clone()),
        _ => Ok(root.to_path_buf()),
    }
}

#[cfg(test)]
#[path = "build_tests.rs"]
mod tests;
