// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_support::{tar_gz, tool_resource};
use kiln_adapters::{FakeBuildService, FakeObjectStore};
use kiln_core::ResourceState;
use std::time::Duration;

const MANIFEST: &str = "main: app.py\nclass: WeatherTool\nenv:\n  - name: UNITS\n    value: metric\n";

struct Fixture {
    _dir: tempfile::TempDir,
    workdir: PathBuf,
    objects: FakeObjectStore,
    builds: FakeBuildService,
    handler: BuildHandler<FakeObjectStore, FakeBuildService>,
}

fn fixture() -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let workdir = dir.path().join("work");
    let objects = FakeObjectStore::new();
    let builds = FakeBuildService::new();
    let config = BuildConfig {
        workdir: workdir.clone(),
        registry: "registry.local".to_string(),
        image_repo: "tools".to_string(),
        poll_interval: Duration::from_millis(2),
        timeout: Duration::from_secs(5),
        ..BuildConfig::default()
    };
    let handler = BuildHandler::new(objects.clone(), builds.clone(), config);
    Fixture {
        _dir: dir,
        workdir,
        objects,
        builds,
        handler,
    }
}

fn report() -> serde_json::Value {
    serde_json::json!({
        "metadata": { "name": "Weather", "description": "Forecasts by city" },
        "spec": { "functions": [{ "name": "forecast" }] },
    })
}

#[tokio::test]
async fn build_records_image_spec_and_manifest_env() {
    let f = fixture();
    f.objects.insert(
        "weather/source.tar.gz",
        tar_gz(&[("tool.yml", MANIFEST), ("app.py", "print('hi')")]),
    );
    f.builds.set_report(report());
    let mut resource = tool_resource("res-1", ResourceState::Building);

    f.handler.handle(&mut resource).await.unwrap();

    let payload = &resource.payload;
    assert_eq!(payload.image.as_deref(), Some("registry.local/tools:res-1"));
    assert_eq!(payload.metadata.name, "Weather");
    assert_eq!(payload.metadata.description, "Forecasts by city");
    assert_eq!(
        payload.function_spec,
        Some(serde_json::json!({ "functions": [{ "name": "forecast" }] }))
    );
    assert_eq!(payload.env.len(), 1);
    assert_eq!(payload.env[0].name, "UNITS");

    let started = f.builds.started();
    assert_eq!(started.len(), 1);
    assert_eq!(started[0].image_tag, "res-1");
    assert_eq!(started[0].image_repo, "registry.local/tools");
    assert_eq!(started[0].source_key, "weather/source.tar.gz");
    assert!(started[0].context_dir.ends_with("res-1/source"));

    assert!(!f.workdir.join("res-1").exists(), "work directory must be removed");
}

#[tokio::test]
async fn manifest_inside_single_top_level_directory_is_found() {
    let f = fixture();
    f.objects.insert(
        "weather/source.tar.gz",
        tar_gz(&[("weather/tool.yml", MANIFEST), ("weather/app.py", "")]),
    );
    f.builds.set_report(report());
    let mut resource = tool_resource("res-1", ResourceState::Building);

    f.handler.handle(&mut resource).await.unwrap();
    assert!(f.builds.started()[0]
        .context_dir
        .ends_with("res-1/source/weather"));
}

#[tokio::test]
async fn missing_bundle_is_fatal() {
    let f = fixture();
    let mut resource = tool_resource("res-1", ResourceState::Building);

    let err = f.handler.handle(&mut resource).await.unwrap_err();
    assert!(matches!(err, HandlerError::Fatal(ref m) if m.contains("object not found")), "{err}");
    assert!(f.builds.calls().is_empty());
    assert!(!f.workdir.join("res-1").exists());
}

#[tokio::test]
async fn missing_manifest_is_fatal_before_building() {
    let f = fixture();
    f.objects
        .insert("weather/source.tar.gz", tar_gz(&[("app.py", "")]));
    let mut resource = tool_resource("res-1", ResourceState::Building);

    let err = f.handler.handle(&mut resource).await.unwrap_err();
    assert!(matches!(err, HandlerError::Fatal(ref m) if m.contains("no tool.yml")), "{err}");
    assert!(f.builds.calls().is_empty());
}

#[tokio::test]
async fn corrupt_bundle_is_fatal() {
    let f = fixture();
    f.objects.insert("weather/source.tar.gz", b"not a tarball".to_vec());
    let mut resource = tool_resource("res-1", ResourceState::Building);

    let err = f.handler.handle(&mut resource).await.unwrap_err();
    assert!(matches!(err, HandlerError::Fatal(ref m) if m.contains("failed to extract bundle")), "{err}");
}

#[tokio::test]
async fn failed_build_is_fatal_and_payload_untouched() {
    let f = fixture();
    f.objects.insert(
        "weather/source.tar.gz",
        tar_gz(&[("tool.yml", MANIFEST)]),
    );
    f.builds.script(vec![
        BuildStatus::InProgress,
        BuildStatus::Failed {
            reason: "dependency resolution failed".to_string(),
        },
    ]);
    let mut resource = tool_resource("res-1", ResourceState::Building);

    let err = f.handler.handle(&mut resource).await.unwrap_err();
    assert_eq!(
        err,
        HandlerError::fatal("build build-1 failed: dependency resolution failed")
    );
    assert_eq!(resource.payload.image, None);
}

#[tokio::test]
async fn build_that_never_finishes_times_out() {
    let dir = tempfile::tempdir().unwrap();
    let objects = FakeObjectStore::new();
    objects.insert(
        "weather/source.tar.gz",
        tar_gz(&[("tool.yml", MANIFEST)]),
    );
    let builds = FakeBuildService::new();
    builds.script(vec![BuildStatus::InProgress]);
    let handler = BuildHandler::new(
        objects,
        builds,
        BuildConfig {
            workdir: dir.path().to_path_buf(),
            poll_interval: Duration::from_millis(2),
            timeout: Duration::from_millis(20),
            ..BuildConfig::default()
        },
    );
    let mut resource = tool_resource("res-1", ResourceState::Building);

    let err = handler.handle(&mut resource).await.unwrap_err();
    assert!(matches!(err, HandlerError::Fatal(ref m) if m.contains("timed out")), "{err}");
}

#[tokio::test]
async fn empty_source_key_falls_back_to_tool_prefix() {
    let f = fixture();
    f.objects.insert(
        "weather/source.tar.gz",
        tar_gz(&[("tool.yml", MANIFEST)]),
    );
    f.builds.set_report(report());
    let mut resource = tool_resource("res-1", ResourceState::Building);
    resource.payload.source_key.clear();

    f.handler.handle(&mut resource).await.unwrap();
    assert_eq!(f.builds.started()[0].source_key, "weather/source.tar.gz");
}
