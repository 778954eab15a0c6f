//! Failure specs
//!
//! Verify fatal errors park a tool until an operator intervenes.

use crate::prelude::*;
use kiln_adapters::OrchestratorOp;
use similar_asserts::assert_eq;

#[tokio::test]
async fn failed_build_parks_tool_in_error() {
    let s = Scenario::start().await;
    s.builds.script(vec![BuildStatus::Failed {
        reason: "dependency resolution failed".to_string(),
    }]);

    let id = s.submit("weather").await;
    let status = s.settled(&id, ResourceState::Error).await;

    assert_eq!(
        status.last_error.as_deref(),
        Some("build build-1 failed: dependency resolution failed")
    );
    assert_eq!(status.state_history, vec![ResourceState::Created]);
    assert_eq!(status.image, None);
    s.stop().await;
}

#[tokio::test]
async fn reset_reruns_the_failed_edge() {
    let s = Scenario::start().await;
    s.builds.script(vec![BuildStatus::Failed {
        reason: "registry unreachable".to_string(),
    }]);
    let id = s.submit("weather").await;
    s.settled(&id, ResourceState::Error).await;

    s.builds.script(Vec::new());
    s.requests.reset(&id).await.unwrap();
    let status = s.settled(&id, ResourceState::Built).await;

    assert_eq!(status.last_error, None);
    assert_eq!(
        status.state_history,
        vec![ResourceState::Created, ResourceState::Created]
    );
    assert_eq!(s.builds.started().len(), 2);
    s.stop().await;
}

#[tokio::test]
async fn missing_bundle_is_fatal() {
    let s = Scenario::start().await;

    let id = s.submit("unknown").await;
    let status = s.settled(&id, ResourceState::Error).await;

    assert!(status.last_error.unwrap().contains("unknown/source.tar.gz"));
    assert!(s.builds.started().is_empty());
    s.stop().await;
}

#[tokio::test]
async fn failed_deploy_leaves_nothing_running_and_can_be_deleted() {
    let s = Scenario::start().await;
    s.orchestrator.fail_on(OrchestratorOp::CreateEndpoint);
    let id = s.submit("weather").await;
    s.settled(&id, ResourceState::Built).await;

    s.requests.deploy(&id).await.unwrap();
    let status = s.settled(&id, ResourceState::Error).await;

    assert!(status.last_error.is_some());
    assert_eq!(status.service_url, None);
    assert!(s.orchestrator.workload_names().is_empty());

    s.requests.delete(&id).await.unwrap();
    s.settled(&id, ResourceState::Deleted).await;
    s.stop().await;
}

#[tokio::test]
async fn workload_left_by_failed_rollback_is_removed_on_delete() {
    let s = Scenario::start().await;
    s.orchestrator.fail_on(OrchestratorOp::CreateEndpoint);
    s.orchestrator.fail_on(OrchestratorOp::DeleteWorkload);
    let id = s.submit("weather").await;
    s.settled(&id, ResourceState::Built).await;

    s.requests.deploy(&id).await.unwrap();
    let status = s.settled(&id, ResourceState::Error).await;
    assert_eq!(status.service_url, None);
    assert_eq!(s.orchestrator.workload_names(), vec![format!("tool-{}", id)]);

    s.orchestrator.clear_failures();
    s.requests.delete(&id).await.unwrap();
    s.settled(&id, ResourceState::Deleted).await;

    assert!(s.orchestrator.workload_names().is_empty());
    s.stop().await;
}
