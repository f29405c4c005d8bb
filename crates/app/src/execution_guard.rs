//! Execution guard: per-automation cool-down after firing.

use std::collections::HashMap;
use std::time::Duration;

use tokio::time::Instant;

use dobby_domain::id::AutomationId;

/// Default cool-down applied after an automation fires.
pub const DEFAULT_SUPPRESSION_WINDOW: Duration = Duration::from_millis(2000);

/// Suppresses re-firing of an automation for a fixed window after it fires.
///
/// One physical event often arrives as several overlapping device deltas,
/// each of which would match the same trigger on its own.
#[derive(Debug)]
pub struct ExecutionGuard {
    window: Duration,
    suppressed_until: HashMap<AutomationId, Instant>,
}

impl Default for ExecutionGuard {
    fn default() -> Self {
        Self::new(DEFAULT_SUPPRESSION_WINDOW)
    }
}

impl ExecutionGuard {
    #[must_use]
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            suppressed_until: HashMap::new(),
        }
    }

    /// `true` while `id` is inside its cool-down window.
    #[must_use]
    pub fn should_suppress(&self, id: AutomationId) -> bool {
        self.suppressed_until
            .get(&id)
            .is_some_and(|until| Instant::now() < *until)
    }

    /// Start, or restart, the cool-down window for `id`.
    pub fn mark_fired(&mut self, id: AutomationId) {
        let now = Instant::now();
        self.suppressed_until.retain(|_, until| *until > now);
        self.suppressed_until.insert(id, now + self.window);
    }

    /// Drop any cool-down held for `id`.
    pub fn forget(&mut self, id: AutomationId) {
        self.suppressed_until.remove(&id);
    }
}
