//! Shared application state for axum handlers.

use dobby_app::AutomationEngine;
use dobby_app::ports::{AutomationStore, Clock, DeviceBus, Notifier};

/// Application state shared across all axum handlers.
///
/// Generic over the engine's collaborators to avoid dynamic dispatch.
/// `Clone` is implemented manually so the collaborators themselves do not
/// need to be `Clone`; the engine is a cheap handle around an `Arc`.
pub struct AppState<S, B, N, C> {
    /// The automation engine every handler talks to.
    pub engine: AutomationEngine<S, B, N, C>,
}

impl<S, B, N, C> Clone for AppState<S, B, N, C> {
    fn clone(&self) -> Self {
        Self {
            engine: self.engine.clone(),
        }
    }
}

impl<S, B, N, C> AppState<S, B, N, C>
where
    S: AutomationStore + Send + Sync + 'static,
    B: DeviceBus + 'static,
    N: Notifier + 'static,
    C: Clock + 'static,
{
    /// Create a new application state around an engine handle.
    pub fn new(engine: AutomationEngine<S, B, N, C>) -> Self {
        Self { engine }
    }
}
