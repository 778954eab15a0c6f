//! Tool lifecycle specs
//!
//! Verify a tool moves through build, deploy, pause and delete.

use crate::prelude::*;
use kiln_adapters::OrchestratorCall;
use similar_asserts::assert_eq;

#[tokio::test]
async fn submitted_tool_is_built() {
    let s = Scenario::start().await;

    let id = s.submit("weather").await;
    let status = s.settled(&id, ResourceState::Built).await;

    assert_eq!(status.image.as_deref(), Some("registry.local/tools:res-1"));
    assert_eq!(status.state_history, vec![ResourceState::Created]);
    assert_eq!(status.retry_times, 0);
    assert_eq!(status.last_error, None);
    assert_eq!(s.builds.started().len(), 1);
    s.stop().await;
}

#[tokio::test]
async fn built_tool_deploys_and_reports_its_endpoint() {
    let s = Scenario::start().await;
    let id = s.submit("weather").await;
    s.settled(&id, ResourceState::Built).await;

    s.requests.deploy(&id).await.unwrap();
    let status = s.settled(&id, ResourceState::Running).await;

    assert_eq!(
        status.service_url.as_deref(),
        Some("http://tool-res-1.tools.svc:9140")
    );
    let workload = s.orchestrator.workload("tool-res-1").unwrap();
    assert_eq!(workload.spec.image, "registry.local/tools:res-1");
    assert_eq!(
        workload.spec.env,
        vec![("UNITS".to_string(), "metric".to_string())]
    );
    s.stop().await;
}

#[tokio::test]
async fn full_lifecycle_records_every_edge() {
    let s = Scenario::start().await;
    let id = s.submit("weather").await;
    s.settled(&id, ResourceState::Built).await;

    s.requests.deploy(&id).await.unwrap();
    s.settled(&id, ResourceState::Running).await;

    s.requests.pause(&id).await.unwrap();
    s.settled(&id, ResourceState::Paused).await;
    assert_eq!(s.orchestrator.workload("tool-res-1").unwrap().replicas, 0);

    // resuming replaces the scaled-down workload
    s.requests.deploy(&id).await.unwrap();
    s.settled(&id, ResourceState::Running).await;
    assert_eq!(s.orchestrator.workload("tool-res-1").unwrap().replicas, 1);

    s.requests.delete(&id).await.unwrap();
    let status = s.settled(&id, ResourceState::Deleted).await;

    assert_eq!(
        status.state_history,
        vec![
            ResourceState::Created,
            ResourceState::Queued,
            ResourceState::PauseMarked,
            ResourceState::Queued,
            ResourceState::DeleteMarked,
        ]
    );
    assert_eq!(status.service_url, None);
    assert!(s.orchestrator.workload_names().is_empty());
    assert!(s.orchestrator.calls().contains(&OrchestratorCall::ScaleWorkload {
        name: "tool-res-1".to_string(),
        replicas: 0,
    }));
    s.stop().await;
}

#[tokio::test]
async fn requests_out_of_order_are_rejected() {
    let s = Scenario::start().await;
    let id = s.submit("weather").await;
    s.settled(&id, ResourceState::Built).await;

    let err = s.requests.pause(&id).await.unwrap_err();

    assert_eq!(
        err.to_string(),
        format!("cannot pause resource {} (state built, in progress: false)", id)
    );
    assert_eq!(s.requests.status(&id).await.unwrap().state, ResourceState::Built);
    s.stop().await;
}

#[tokio::test]
async fn tools_reconcile_independently() {
    let s = Scenario::start().await;
    s.objects.insert("radar/source.tar.gz", bundle());

    let weather = s.submit("weather").await;
    let radar = s.submit("radar").await;
    s.settled(&weather, ResourceState::Built).await;
    s.settled(&radar, ResourceState::Built).await;

    s.requests.deploy(&radar).await.unwrap();
    s.settled(&radar, ResourceState::Running).await;

    assert_eq!(
        s.requests.status(&weather).await.unwrap().state,
        ResourceState::Built
    );
    assert_eq!(s.orchestrator.workload_names(), vec![format!("tool-{}", radar)]);
    s.stop().await;
}
