//! JSON REST handlers for automations.

use std::str::FromStr;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use dobby_app::ports::{AutomationStore, Clock, DeviceBus, Notifier};
use dobby_domain::automation::{Automation, AutomationDefinition};
use dobby_domain::error::{DobbyError, ValidationError};
use dobby_domain::id::AutomationId;

use crate::error::ApiError;
use crate::state::AppState;

/// Possible responses from the list endpoint.
pub enum ListResponse {
    Ok(Json<Vec<Automation>>),
}

impl IntoResponse for ListResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the get and update endpoints.
pub enum GetResponse {
    Ok(Json<Automation>),
}

impl IntoResponse for GetResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the create endpoint.
pub enum CreateResponse {
    Created(Json<Automation>),
}

impl IntoResponse for CreateResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Created(json) => (StatusCode::CREATED, json).into_response(),
        }
    }
}

/// Possible responses from the delete endpoint.
pub enum DeleteResponse {
    NoContent,
}

impl IntoResponse for DeleteResponse {
    fn into_response(self) -> Response {
        match self {
            Self::NoContent => StatusCode::NO_CONTENT.into_response(),
        }
    }
}

fn parse_id(raw: &str) -> Result<AutomationId, ApiError> {
    AutomationId::from_str(raw)
        .map_err(|_| ApiError::from(DobbyError::from(ValidationError::InvalidId(raw.to_owned()))))
}

/// `GET /api/automations`: list all automations in insertion order.
pub async fn list<S, B, N, C>(
    State(state): State<AppState<S, B, N, C>>,
) -> Result<ListResponse, ApiError>
where
    S: AutomationStore + Send + Sync + 'static,
    B: DeviceBus + 'static,
    N: Notifier + 'static,
    C: Clock + 'static,
{
    let automations = state.engine.list_automations().await;
    Ok(ListResponse::Ok(Json(automations)))
}

/// `GET /api/automations/{id}`: get automation by ID.
pub async fn get<S, B, N, C>(
    State(state): State<AppState<S, B, N, C>>,
    Path(id): Path<String>,
) -> Result<GetResponse, ApiError>
where
    S: AutomationStore + Send + Sync + 'static,
    B: DeviceBus + 'static,
    N: Notifier + 'static,
    C: Clock + 'static,
{
    let automation_id = parse_id(&id)?;
    let automation = state.engine.get_automation(automation_id).await?;
    Ok(GetResponse::Ok(Json(automation)))
}

/// `POST /api/automations`: create a new automation.
///
/// The engine assigns the identifier; any `id` in the body is ignored.
pub async fn create<S, B, N, C>(
    State(state): State<AppState<S, B, N, C>>,
    body: Result<Json<AutomationDefinition>, JsonRejection>,
) -> Result<CreateResponse, ApiError>
where
    S: AutomationStore + Send + Sync + 'static,
    B: DeviceBus + 'static,
    N: Notifier + 'static,
    C: Clock + 'static,
{
    let Json(definition) = body?;
    let automation = state.engine.add_automation(definition).await?;
    Ok(CreateResponse::Created(Json(automation)))
}

/// `PUT /api/automations/{id}`: replace an existing automation.
///
/// The identifier in the path wins over any `id` in the body.
pub async fn update<S, B, N, C>(
    State(state): State<AppState<S, B, N, C>>,
    Path(id): Path<String>,
    body: Result<Json<AutomationDefinition>, JsonRejection>,
) -> Result<GetResponse, ApiError>
where
    S: AutomationStore + Send + Sync + 'static,
    B: DeviceBus + 'static,
    N: Notifier + 'static,
    C: Clock + 'static,
{
    let automation_id = parse_id(&id)?;
    let Json(definition) = body?;
    let automation = state
        .engine
        .update_automation(definition.with_id(automation_id))
        .await?;
    Ok(GetResponse::Ok(Json(automation)))
}

/// `DELETE /api/automations/{id}`: remove an automation and its timers.
pub async fn delete<S, B, N, C>(
    State(state): State<AppState<S, B, N, C>>,
    Path(id): Path<String>,
) -> Result<DeleteResponse, ApiError>
where
    S: AutomationStore + Send + Sync + 'static,
    B: DeviceBus + 'static,
    N: Notifier + 'static,
    C: Clock + 'static,
{
    let automation_id = parse_id(&id)?;
    state.engine.remove_automation(automation_id).await?;
    Ok(DeleteResponse::NoContent)
}
