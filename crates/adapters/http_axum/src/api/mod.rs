//! JSON REST API handler modules.

#[allow(clippy::missing_errors_doc)]
pub mod automations;

use axum::Router;
use axum::routing::get;

use dobby_app::ports::{AutomationStore, Clock, DeviceBus, Notifier};

use crate::state::AppState;

/// Build the `/api` sub-router.
pub fn routes<S, B, N, C>() -> Router<AppState<S, B, N, C>>
where
    S: AutomationStore + Send + Sync + 'static,
    B: DeviceBus + 'static,
    N: Notifier + 'static,
    C: Clock + 'static,
{
    Router::new()
        .route(
            "/automations",
            get(automations::list::<S, B, N, C>).post(automations::create::<S, B, N, C>),
        )
        .route(
            "/automations/{id}",
            get(automations::get::<S, B, N, C>)
                .put(automations::update::<S, B, N, C>)
                .delete(automations::delete::<S, B, N, C>),
        )
}
