//! Shared scenario harness

use std::path::Path;
use std::time::Duration;

pub use kiln_adapters::{BuildStatus, FakeBuildService, FakeObjectStore, FakeOrchestrator};
pub use kiln_core::{Config, FakeClock, ResourceState, SequentialIdGen, ToolMetadata};
pub use kiln_engine::{ControllerHandle, ToolRequests, ToolStatus, ToolSubmission};
pub use kiln_storage::WalStore;

use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

pub type SpecStore = WalStore<FakeClock, SequentialIdGen>;

pub const MANIFEST: &str = "main: app.py\nclass: WeatherTool\nenv:\n  - name: UNITS\n    value: metric\n";

/// A running tool controller plus everything a scenario pokes at
pub struct Scenario {
    pub dir: TempDir,
    pub clock: FakeClock,
    pub objects: FakeObjectStore,
    pub builds: FakeBuildService,
    pub orchestrator: FakeOrchestrator,
    pub requests: ToolRequests<SpecStore, FakeClock>,
    handle: Option<ControllerHandle>,
}

impl Scenario {
    /// Fresh state directory with a weather tool bundle uploaded
    pub async fn start() -> Self {
        let dir = tempfile::tempdir().unwrap();
        Self::start_in(dir, FakeObjectStore::new()).await
    }

    /// Start a controller over whatever the WAL in `dir` already holds
    pub async fn start_in(dir: TempDir, objects: FakeObjectStore) -> Self {
        let clock = FakeClock::new();
        let config = config(dir.path());
        let store = open_store(dir.path(), &clock);

        objects.insert("weather/source.tar.gz", bundle());
        let builds = FakeBuildService::new();
        builds.set_report(serde_json::json!({
            "metadata": { "name": "Weather", "description": "Forecasts by city" },
            "spec": { "functions": [{ "name": "forecast" }] },
        }));
        let orchestrator = FakeOrchestrator::new();

        let controller = kiln_engine::tool::controller(
            store.clone(),
            clock.clone(),
            &config,
            objects.clone(),
            builds.clone(),
            orchestrator.clone(),
        )
        .unwrap();
        let handle = controller.start(CancellationToken::new()).await.unwrap();

        Self {
            dir,
            clock: clock.clone(),
            objects,
            builds,
            orchestrator,
            requests: ToolRequests::new(store, clock),
            handle: Some(handle),
        }
    }

    pub fn recovered(&self) -> u64 {
        self.handle.as_ref().map_or(0, |h| h.recovered())
    }

    /// Drain the controller and hand back the state directory
    pub async fn stop(mut self) -> TempDir {
        if let Some(handle) = self.handle.take() {
            handle.shutdown(Duration::from_secs(5)).await.unwrap();
        }
        self.dir
    }

    pub async fn submit(&self, tool_id: &str) -> String {
        self.requests
            .submit(ToolSubmission {
                metadata: ToolMetadata {
                    id: tool_id.to_string(),
                    name: tool_id.to_string(),
                    ..Default::default()
                },
                version: "1.0.0".to_string(),
                source_key: None,
                env: Vec::new(),
            })
            .await
            .unwrap()
    }

    /// Poll until the resource rests (not claimed) in `state`
    pub async fn settled(&self, id: &str, state: ResourceState) -> ToolStatus {
        let mut status = self.requests.status(id).await.unwrap();
        for _ in 0..1000 {
            if status.state == state && !status.in_progress {
                return status;
            }
            tokio::time::sleep(Duration::from_millis(2)).await;
            status = self.requests.status(id).await.unwrap();
        }
        panic!("{} never settled in {}: {:?}", id, state, status);
    }
}

pub fn config(dir: &Path) -> Config {
    let mut config = Config::default();
    config.state_dir = dir.join("state");
    config.build.workdir = dir.join("work");
    config.build.poll_interval = Duration::from_millis(2);
    config.reconciler.poll_interval = Duration::from_millis(5);
    config.reconciler.store_error_backoff = Duration::from_millis(5);
    config
}

pub fn open_store(dir: &Path, clock: &FakeClock) -> SpecStore {
    let wal_path = config(dir).wal_path();
    std::fs::create_dir_all(wal_path.parent().unwrap()).unwrap();
    WalStore::open(&wal_path, clock.clone(), SequentialIdGen::new("res")).unwrap()
}

/// Gzipped tarball of a minimal tool
pub fn bundle() -> Vec<u8> {
    let encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    let mut builder = tar::Builder::new(encoder);
    for (path, contents) in [("tool.yml", MANIFEST), ("app.py", "print('hi')\n")] {
        let mut header = tar::Header::new_gnu();
        header.set_size(contents.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, path, contents.as_bytes())
            .unwrap();
    }
    builder.into_inner().unwrap().finish().unwrap()
}
