// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::time::Duration;

fn params(dir: &std::path::Path) -> BuildParams {
    BuildParams {
        context_dir: dir.to_path_buf(),
        image_repo: "registry.local/tools".to_string(),
        image_tag: "tool-1".to_string(),
        source_key: "weather/source.tar.gz".to_string(),
    }
}

async fn wait_terminal(service: &ShellBuildService, id: &BuildId) -> BuildStatus {
    for _ in 0..200 {
        let status = service.build_status(id).await.unwrap();
        if status.is_terminal() {
            return status;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("build never finished");
}

#[tokio::test]
async fn successful_command_produces_report() {
    let dir = tempfile::tempdir().unwrap();
    let service = ShellBuildService::new(
        r#"printf '{"metadata":{"name":"%s"},"spec":{}}' "$KILN_IMAGE_TAG" > "$KILN_REPORT_PATH""#,
    );

    let id = service.start_build(&params(dir.path())).await.unwrap();
    assert_eq!(wait_terminal(&service, &id).await, BuildStatus::Succeeded);

    let report = service.fetch_report(&id).await.unwrap();
    assert_eq!(report["metadata"]["name"], "tool-1");
}

#[tokio::test]
async fn failing_command_reports_exit_status() {
    let dir = tempfile::tempdir().unwrap();
    let service = ShellBuildService::new("echo broken >&2; exit 3");

    let id = service.start_build(&params(dir.path())).await.unwrap();
    let status = wait_terminal(&service, &id).await;

    assert!(matches!(status, BuildStatus::Failed { ref reason } if reason.contains("exit")));
    let log = std::fs::read_to_string(dir.path().join(LOG_FILE)).unwrap();
    assert!(log.contains("broken"));
    assert!(matches!(
        service.fetch_report(&id).await,
        Err(BuildError::Report(_))
    ));
}

#[tokio::test]
async fn command_runs_in_context_dir() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("tool.yml"), "main: app.py\n").unwrap();
    let service = ShellBuildService::new(
        r#"test -f tool.yml && echo '{}' > "$KILN_REPORT_PATH""#,
    );

    let id = service.start_build(&params(dir.path())).await.unwrap();
    assert_eq!(wait_terminal(&service, &id).await, BuildStatus::Succeeded);
}

#[tokio::test]
async fn unknown_build_is_rejected() {
    let service = ShellBuildService::new("true");
    let result = service.build_status(&BuildId("nope".to_string())).await;
    assert!(matches!(result, Err(BuildError::UnknownBuild(_))));
}
