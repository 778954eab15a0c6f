//! Crash recovery specs
//!
//! Verify state survives restarts and orphaned claims are picked up again.

use crate::prelude::*;
use kiln_storage::{Filter, ResourceStore, SortOrder, Update};
use similar_asserts::assert_eq;

#[tokio::test]
async fn state_survives_a_restart() {
    let s = Scenario::start().await;
    let id = s.submit("weather").await;
    let before = s.settled(&id, ResourceState::Built).await;
    let dir = s.stop().await;

    let s = Scenario::start_in(dir, FakeObjectStore::new()).await;
    let after = s.requests.status(&id).await.unwrap();

    assert_eq!(s.recovered(), 0);
    assert_eq!(after, before);
    assert!(s.builds.started().is_empty());
    s.stop().await;
}

#[tokio::test]
async fn claim_orphaned_by_a_crash_is_rerun() {
    let dir = tempfile::tempdir().unwrap();
    {
        // the previous process claimed the build and died before settling
        let clock = FakeClock::new();
        let store = open_store(dir.path(), &clock);
        let payload = kiln_core::ToolPayload::new(
            ToolMetadata {
                id: "weather".to_string(),
                name: "weather".to_string(),
                ..Default::default()
            },
            "weather/source.tar.gz",
        );
        store
            .insert(ResourceState::Created, serde_json::to_value(&payload).unwrap())
            .await
            .unwrap();
        let claimed = store
            .find_one_and_update(
                &Filter::new().state(ResourceState::Created).in_progress(false),
                &Update::new()
                    .state(ResourceState::Building)
                    .edge(ResourceState::Created, ResourceState::Built)
                    .in_progress(true),
                SortOrder::ScheduledAt,
            )
            .await
            .unwrap();
        assert!(claimed.is_some());
    }

    let s = Scenario::start_in(dir, FakeObjectStore::new()).await;
    let status = s.settled("res-1", ResourceState::Built).await;

    assert_eq!(s.recovered(), 1);
    assert_eq!(status.state_history, vec![ResourceState::Created]);
    assert_eq!(s.builds.started().len(), 1);
    s.stop().await;
}
