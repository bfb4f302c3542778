//! End-to-end pipeline regression tests.
//!
//! Runs the scheduler, worker pool, registry, and API together the way the
//! daemon wires them, then checks the registry snapshot written on shutdown.

use std::time::{Duration, Instant};

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;
use vigil_api::{ApiState, build_router};
use vigil_health::{PoolConfig, Prober, Scheduler, SchedulerConfig, SchedulerState};
use vigil_registry::{Registry, Target};
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

fn pipeline_config() -> SchedulerConfig {
    SchedulerConfig {
        interval: Duration::from_millis(50),
        pool: PoolConfig {
            workers: 2,
            queue_capacity: 2,
            probe_timeout: Duration::from_millis(500),
        },
    }
}

fn register(registry: &Registry, endpoint: &str) -> String {
    let target = Target::new(endpoint);
    let id = target.id.clone();
    registry.create(target).unwrap();
    id
}

/// Poll until every target has been probed at least once.
async fn wait_until_probed(registry: &Registry) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while registry.list().iter().any(|t| t.duration.is_empty()) {
        assert!(Instant::now() < deadline, "targets never probed");
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

#[tokio::test]
async fn pipeline_records_reachable_and_unreachable_targets() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let registry = Registry::new();
    let up = register(&registry, &format!("{}/up", server.uri()));
    let down = register(&registry, "http://127.0.0.1:1/down");

    let prober = Prober::new(Duration::from_millis(500)).unwrap();
    let mut scheduler = Scheduler::start(registry.clone(), prober.clone(), pipeline_config());
    wait_until_probed(&registry).await;

    // Read the results back through the API, as a client would.
    let router = build_router(ApiState {
        registry: registry.clone(),
        prober,
    });
    let req = Request::builder()
        .uri("/api/health/checks?page=0")
        .body(Body::empty())
        .unwrap();
    let resp = router.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let list: Value = serde_json::from_slice(&bytes).unwrap();

    let items = list["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    let find = |id: &str| items.iter().find(|t| t["id"] == id).unwrap().clone();

    let up = find(up.as_str());
    assert_eq!(up["code"], 200);
    assert!(up.get("error").is_none());

    let down = find(down.as_str());
    assert_eq!(down["code"], 0);
    assert_eq!(down["status"], "Error");
    assert!(!down["error"].as_str().unwrap().is_empty());

    scheduler.stop().await;
    assert_eq!(scheduler.state(), SchedulerState::Stopped);
}

#[tokio::test]
async fn pipeline_keeps_probing_on_later_ticks() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let registry = Registry::new();
    register(&registry, &format!("{}/a", server.uri()));

    let prober = Prober::new(Duration::from_millis(500)).unwrap();
    let mut scheduler = Scheduler::start(registry.clone(), prober, pipeline_config());
    tokio::time::sleep(Duration::from_millis(400)).await;
    scheduler.stop().await;

    let requests = server.received_requests().await.unwrap();
    assert!(requests.len() >= 3, "only {} probes sent", requests.len());
}

#[tokio::test]
async fn pipeline_snapshot_survives_restart() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let data_file = dir.path().join("data").join("targets.json");

    let registry = Registry::open(&data_file);
    assert!(registry.is_empty());
    let a = register(&registry, &format!("{}/a", server.uri()));
    let b = register(&registry, "http://127.0.0.1:1/b");

    let prober = Prober::new(Duration::from_millis(500)).unwrap();
    let mut scheduler = Scheduler::start(registry.clone(), prober, pipeline_config());
    wait_until_probed(&registry).await;

    // Shutdown order: stop probing, then dump.
    scheduler.stop().await;
    registry.dump(&data_file).unwrap();

    let restored = Registry::open(&data_file);
    assert_eq!(restored.len(), 2);

    let restored_a = restored.get(&a).unwrap();
    assert_eq!(restored_a.endpoint, format!("{}/a", server.uri()));
    assert_eq!(restored_a.code, 200);

    let restored_b = restored.get(&b).unwrap();
    assert_eq!(restored_b.endpoint, "http://127.0.0.1:1/b");
    assert_eq!(restored_b.code, 0);

    // The endpoint index is rebuilt too.
    assert!(restored.create(Target::new("http://127.0.0.1:1/b")).is_err());
}
