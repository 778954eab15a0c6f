// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_support::tool_resource;
use kiln_adapters::{FakeOrchestrator, OrchestratorOp, WorkloadSpec};
use kiln_core::ResourceState;

fn running(orchestrator: &FakeOrchestrator) -> Resource<ToolPayload> {
    orchestrator.insert_workload(WorkloadSpec {
        name: "tool-res-1".to_string(),
        namespace: "tools".to_string(),
        image: "registry.local/tools:res-1".to_string(),
        port: 9140,
        env: Vec::new(),
    });
    let mut resource = tool_resource("res-1", ResourceState::Pausing);
    resource.payload.deploy_name = Some("tool-res-1".to_string());
    resource
}

#[tokio::test]
async fn pause_scales_to_zero_and_keeps_the_workload() {
    let orchestrator = FakeOrchestrator::new();
    let handler = PauseHandler::new(orchestrator.clone(), DeployConfig::default());
    let mut resource = running(&orchestrator);

    handler.handle(&mut resource).await.unwrap();

    let workload = orchestrator.workload("tool-res-1").unwrap();
    assert_eq!(workload.replicas, 0);
    assert_eq!(resource.payload.deploy_name.as_deref(), Some("tool-res-1"));
}

#[tokio::test]
async fn missing_workload_counts_as_paused() {
    let orchestrator = FakeOrchestrator::new();
    let handler = PauseHandler::new(orchestrator, DeployConfig::default());
    let mut resource = tool_resource("res-1", ResourceState::Pausing);
    resource.payload.deploy_name = Some("tool-res-1".to_string());

    handler.handle(&mut resource).await.unwrap();
}

#[tokio::test]
async fn unrecorded_workload_is_still_scaled_down() {
    let orchestrator = FakeOrchestrator::new();
    let handler = PauseHandler::new(orchestrator.clone(), DeployConfig::default());
    let mut resource = running(&orchestrator);
    resource.payload.deploy_name = None;

    handler.handle(&mut resource).await.unwrap();

    assert_eq!(orchestrator.workload("tool-res-1").unwrap().replicas, 0);
}

#[tokio::test]
async fn api_error_is_fatal() {
    let orchestrator = FakeOrchestrator::new();
    orchestrator.fail_on(OrchestratorOp::ScaleWorkload);
    let handler = PauseHandler::new(orchestrator.clone(), DeployConfig::default());
    let mut resource = running(&orchestrator);

    let err = handler.handle(&mut resource).await.unwrap_err();

    assert!(matches!(err, HandlerError::Fatal(_)));
    assert_eq!(orchestrator.workload("tool-res-1").unwrap().replicas, 1);
}
