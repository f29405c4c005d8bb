//! Axum router assembly.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{Value, json};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use dobby_app::ports::{AutomationStore, Clock, DeviceBus, Notifier};

use crate::state::AppState;

/// Build the top-level axum [`Router`].
///
/// Nests API routes under `/api` and exposes `/health`.
/// Includes a [`TraceLayer`] that logs each HTTP request/response at the
/// `DEBUG` level using the `tracing` ecosystem, and a permissive CORS layer
/// so browser clients on other origins can reach the API.
pub fn build<S, B, N, C>(state: AppState<S, B, N, C>) -> Router
where
    S: AutomationStore + Send + Sync + 'static,
    B: DeviceBus + 'static,
    N: Notifier + 'static,
    C: Clock + 'static,
{
    Router::new()
        .route("/health", get(health_check::<S, B, N, C>))
        .nest("/api", crate::api::routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health_check<S, B, N, C>(State(state): State<AppState<S, B, N, C>>) -> Json<Value>
where
    S: AutomationStore + Send + Sync + 'static,
    B: DeviceBus + 'static,
    N: Notifier + 'static,
    C: Clock + 'static,
{
    let device_bus = if state.engine.device_bus().is_connected() {
        "connected"
    } else {
        "disconnected"
    };
    Json(json!({ "status": "ok", "deviceBus": device_bus }))
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use dobby_app::AutomationEngine;
    use dobby_app::clock::SystemClock;
    use dobby_app::device_bus::InProcessDeviceBus;
    use dobby_app::notifier::LogNotifier;
    use dobby_app::ports::DeviceStateSource;
    use dobby_domain::automation::Automation;
    use dobby_domain::device::{DeviceCommand, DeviceState};
    use dobby_domain::error::DobbyError;
    use dobby_domain::event::DeviceStateChanged;
    use dobby_domain::id::{AutomationId, DeviceId};
    use http_body_util::BodyExt;
    use tokio::sync::broadcast;
    use tower::ServiceExt;

    use super::*;

    #[derive(Default)]
    struct InMemoryStore {
        saved: Mutex<Vec<Automation>>,
    }

    impl AutomationStore for InMemoryStore {
        async fn load(&self) -> Result<Vec<Automation>, DobbyError> {
            Ok(self.saved.lock().unwrap().clone())
        }

        async fn save(&self, automations: &[Automation]) -> Result<(), DobbyError> {
            *self.saved.lock().unwrap() = automations.to_vec();
            Ok(())
        }
    }

    #[derive(Default)]
    struct DisconnectedBus {
        inner: InProcessDeviceBus,
    }

    impl DeviceStateSource for DisconnectedBus {
        fn device_state(&self, device_id: &DeviceId) -> Option<DeviceState> {
            self.inner.device_state(device_id)
        }
    }

    impl DeviceBus for DisconnectedBus {
        fn subscribe(&self) -> broadcast::Receiver<DeviceStateChanged> {
            self.inner.subscribe()
        }

        async fn send_command(
            &self,
            _device_id: &DeviceId,
            _command: DeviceCommand,
        ) -> Result<(), DobbyError> {
            Err(dobby_domain::error::UnavailableError("device bus").into())
        }

        fn is_connected(&self) -> bool {
            false
        }
    }

    fn app() -> Router {
        let engine = AutomationEngine::new(
            InMemoryStore::default(),
            InProcessDeviceBus::default(),
            LogNotifier,
            SystemClock,
        );
        build(AppState::new(engine))
    }

    async fn send(
        app: &Router,
        method: &str,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                request = request.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        let response = app
            .clone()
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    fn lamp_definition(name: &str) -> Value {
        json!({
            "name": name,
            "triggers": [{"type": "time", "time": {"hour": 20, "minute": 0}}],
            "actions": [{
                "type": "device",
                "deviceId": "lamp1",
                "command": "state",
                "value": "ON"
            }]
        })
    }

    // ── Health ─────────────────────────────────────────────────────

    #[tokio::test]
    async fn should_return_200_when_health_check_called() {
        let (status, body) = send(&app(), "GET", "/health", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"status": "ok", "deviceBus": "connected"}));
    }

    #[tokio::test]
    async fn should_report_disconnected_device_bus() {
        let engine = AutomationEngine::new(
            InMemoryStore::default(),
            DisconnectedBus::default(),
            LogNotifier,
            SystemClock,
        );
        let app = build(AppState::new(engine));

        let (status, body) = send(&app, "GET", "/health", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["deviceBus"], "disconnected");
    }

    // ── Create ─────────────────────────────────────────────────────

    #[tokio::test]
    async fn should_return_201_with_assigned_id_when_automation_created() {
        let (status, body) = send(
            &app(),
            "POST",
            "/api/automations",
            Some(lamp_definition("Evening lamp")),
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["name"], "Evening lamp");
        assert_eq!(body["enabled"], true);
        assert!(body["id"].as_str().unwrap().parse::<AutomationId>().is_ok());
    }

    #[tokio::test]
    async fn should_ignore_client_supplied_id_on_create() {
        let mut definition = lamp_definition("Evening lamp");
        let forged = AutomationId::new().to_string();
        definition["id"] = json!(forged);

        let (status, body) = send(&app(), "POST", "/api/automations", Some(definition)).await;

        assert_eq!(status, StatusCode::CREATED);
        assert_ne!(body["id"], json!(forged));
    }

    #[tokio::test]
    async fn should_return_400_when_name_is_blank() {
        let (status, body) = send(
            &app(),
            "POST",
            "/api/automations",
            Some(lamp_definition("   ")),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "validation error: name must not be empty");
    }

    #[tokio::test]
    async fn should_return_400_when_body_is_malformed() {
        let (status, body) = send(
            &app(),
            "POST",
            "/api/automations",
            Some(json!({"name": "x", "triggers": [{"type": "sunrise"}]})),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    // ── Read ───────────────────────────────────────────────────────

    #[tokio::test]
    async fn should_list_automations_in_creation_order() {
        let app = app();
        send(&app, "POST", "/api/automations", Some(lamp_definition("first"))).await;
        send(&app, "POST", "/api/automations", Some(lamp_definition("second"))).await;

        let (status, body) = send(&app, "GET", "/api/automations", None).await;

        assert_eq!(status, StatusCode::OK);
        let names: Vec<&str> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|a| a["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["first", "second"]);
    }

    #[tokio::test]
    async fn should_return_200_when_automation_exists() {
        let app = app();
        let (_, created) =
            send(&app, "POST", "/api/automations", Some(lamp_definition("lamp"))).await;
        let uri = format!("/api/automations/{}", created["id"].as_str().unwrap());

        let (status, body) = send(&app, "GET", &uri, None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, created);
    }

    #[tokio::test]
    async fn should_return_404_when_automation_missing() {
        let uri = format!("/api/automations/{}", AutomationId::new());

        let (status, _) = send(&app(), "GET", &uri, None).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn should_return_400_when_id_is_not_a_uuid() {
        let (status, body) = send(&app(), "GET", "/api/automations/not-a-uuid", None).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("not-a-uuid"));
    }

    // ── Update ─────────────────────────────────────────────────────

    #[tokio::test]
    async fn should_replace_automation_and_keep_path_id() {
        let app = app();
        let (_, created) =
            send(&app, "POST", "/api/automations", Some(lamp_definition("lamp"))).await;
        let id = created["id"].as_str().unwrap().to_string();

        let mut replacement = lamp_definition("renamed");
        replacement["id"] = json!(AutomationId::new().to_string());
        replacement["enabled"] = json!(false);
        let (status, body) = send(
            &app,
            "PUT",
            &format!("/api/automations/{id}"),
            Some(replacement),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], json!(id));
        assert_eq!(body["name"], "renamed");
        assert_eq!(body["enabled"], false);

        let (_, listed) = send(&app, "GET", "/api/automations", None).await;
        assert_eq!(listed.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn should_return_404_when_updating_missing_automation() {
        let uri = format!("/api/automations/{}", AutomationId::new());

        let (status, _) = send(&app(), "PUT", &uri, Some(lamp_definition("ghost"))).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    // ── Delete ─────────────────────────────────────────────────────

    #[tokio::test]
    async fn should_return_204_then_404_when_deleting_twice() {
        let app = app();
        let (_, created) =
            send(&app, "POST", "/api/automations", Some(lamp_definition("lamp"))).await;
        let uri = format!("/api/automations/{}", created["id"].as_str().unwrap());

        let (first, body) = send(&app, "DELETE", &uri, None).await;
        assert_eq!(first, StatusCode::NO_CONTENT);
        assert_eq!(body, Value::Null);

        let (second, _) = send(&app, "DELETE", &uri, None).await;
        assert_eq!(second, StatusCode::NOT_FOUND);
    }
}
