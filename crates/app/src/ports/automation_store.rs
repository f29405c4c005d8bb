//! Automation store port: durable list of automations.

use std::future::Future;

use dobby_domain::automation::Automation;
use dobby_domain::error::DobbyError;

/// Persists the whole automation collection.
///
/// The engine owns the authoritative in-memory list; the store only mirrors
/// it. `save` always receives the full, ordered collection and overwrites
/// whatever was stored before.
pub trait AutomationStore {
    /// Load every stored automation, in insertion order.
    fn load(&self) -> impl Future<Output = Result<Vec<Automation>, DobbyError>> + Send;

    /// Replace the stored collection with `automations`.
    fn save(
        &self,
        automations: &[Automation],
    ) -> impl Future<Output = Result<(), DobbyError>> + Send;
}

impl<T: AutomationStore + Send + Sync> AutomationStore for std::sync::Arc<T> {
    fn load(&self) -> impl Future<Output = Result<Vec<Automation>, DobbyError>> + Send {
        (**self).load()
    }

    fn save(
        &self,
        automations: &[Automation],
    ) -> impl Future<Output = Result<(), DobbyError>> + Send {
        (**self).save(automations)
    }
}
