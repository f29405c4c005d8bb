//! End-to-end smoke tests for the full dobbyd stack.
//!
//! Each test spins up the complete application (in-memory `SQLite`, real
//! store, real engine, in-process device bus, real axum router) and exercises
//! the HTTP layer via `tower::ServiceExt::oneshot`, without binding a TCP port.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use dobby_adapter_http_axum::router;
use dobby_adapter_http_axum::state::AppState;
use dobby_adapter_storage_sqlite_sqlx::{Config, SqliteAutomationStore};
use dobby_app::clock::SystemClock;
use dobby_app::device_bus::InProcessDeviceBus;
use dobby_app::notifier::LogNotifier;
use dobby_app::ports::{DeviceBus, DeviceStateSource};
use dobby_app::{AutomationEngine, EngineConfig};
use dobby_domain::device::{DeviceState, StateValue};
use dobby_domain::id::DeviceId;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

type Engine =
    AutomationEngine<SqliteAutomationStore, Arc<InProcessDeviceBus>, LogNotifier, SystemClock>;

async fn store() -> SqliteAutomationStore {
    let db = Config {
        database_url: "sqlite::memory:".to_string(),
    }
    .build()
    .await
    .expect("in-memory database should initialise");
    db.automation_store()
}

fn engine(store: SqliteAutomationStore, bus: Arc<InProcessDeviceBus>) -> Engine {
    AutomationEngine::with_config(
        store,
        bus,
        LogNotifier,
        SystemClock,
        EngineConfig {
            debounce_window: Duration::from_millis(20),
            suppression_window: Duration::from_millis(200),
        },
    )
}

async fn call(
    app: &axum::Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let resp = app.clone().oneshot(request).await.unwrap();
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn motion_lights_definition() -> Value {
    json!({
        "name": "Hallway motion lights",
        "triggers": [{
            "type": "device",
            "deviceId": "motion1",
            "property": "occupancy",
            "value": true
        }],
        "actions": [{
            "type": "device",
            "deviceId": "lamp1",
            "command": "state",
            "value": "ON"
        }]
    })
}

// ---------------------------------------------------------------------------
// Health check
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_return_ok_when_health_check_called() {
    let engine = engine(store().await, Arc::new(InProcessDeviceBus::default()));
    let app = router::build(AppState::new(engine));

    let (status, body) = call(&app, "GET", "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["deviceBus"], "connected");
}

// ---------------------------------------------------------------------------
// API: full CRUD cycle backed by SQLite
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_complete_automation_crud_cycle() {
    let engine = engine(store().await, Arc::new(InProcessDeviceBus::default()));
    engine.initialize().await;
    let app = router::build(AppState::new(engine));

    let (status, created) =
        call(&app, "POST", "/api/automations", Some(motion_lights_definition())).await;
    assert_eq!(status, StatusCode::CREATED);
    let id = created["id"].as_str().unwrap().to_string();

    let (status, listed) = call(&app, "GET", "/api/automations", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed, json!([created.clone()]));

    let mut renamed = motion_lights_definition();
    renamed["name"] = json!("Renamed");
    let (status, updated) =
        call(&app, "PUT", &format!("/api/automations/{id}"), Some(renamed)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["name"], "Renamed");

    let (status, _) = call(&app, "DELETE", &format!("/api/automations/{id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = call(&app, "GET", &format!("/api/automations/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn should_reload_persisted_automations_after_restart() {
    let store = store().await;
    let bus = Arc::new(InProcessDeviceBus::default());

    let first = engine(store.clone(), Arc::clone(&bus));
    first.initialize().await;
    let app = router::build(AppState::new(first.clone()));
    let (_, created) =
        call(&app, "POST", "/api/automations", Some(motion_lights_definition())).await;
    first.shutdown().await;

    let second = engine(store, bus);
    second.initialize().await;
    let app = router::build(AppState::new(second));
    let (status, listed) = call(&app, "GET", "/api/automations", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed, json!([created]));
}

// ---------------------------------------------------------------------------
// Engine: device trigger drives a command through the bus
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_turn_on_lamp_when_motion_detected() {
    let bus = Arc::new(InProcessDeviceBus::default());
    bus.register_device(
        "lamp1",
        DeviceState::from([("state".to_string(), StateValue::from("OFF"))]),
    );

    let engine = engine(store().await, Arc::clone(&bus));
    engine.initialize().await;
    let app = router::build(AppState::new(engine.clone()));
    let (status, _) =
        call(&app, "POST", "/api/automations", Some(motion_lights_definition())).await;
    assert_eq!(status, StatusCode::CREATED);

    let mut rx = bus.subscribe();
    bus.publish_state(
        "motion1",
        DeviceState::from([("occupancy".to_string(), StateValue::from(true))]),
    );

    let lamp = DeviceId::new("lamp1");
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let event = rx.recv().await.unwrap();
            if event.device_id == lamp {
                return event;
            }
        }
    })
    .await
    .expect("lamp1 should receive a command");

    assert_eq!(
        bus.device_state(&lamp).unwrap().get("state"),
        Some(&StateValue::from("ON"))
    );
    engine.shutdown().await;
}
