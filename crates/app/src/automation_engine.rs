//! Automation engine: owns the automation set and everything that fires it.
//!
//! The engine holds the authoritative, ordered list of automations together
//! with the armed timers and the execution guard, all behind one async mutex.
//! CRUD operations, timer firings and device-event match passes are therefore
//! serialized; action execution itself is spawned so that a slow device never
//! stalls the engine.

use std::collections::HashSet;
use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::Instrument;

use dobby_domain::automation::{Automation, AutomationDefinition};
use dobby_domain::error::{DobbyError, NotFoundError};
use dobby_domain::event::DeviceStateChanged;
use dobby_domain::id::AutomationId;

use crate::action_executor;
use crate::condition_evaluator;
use crate::event_dispatcher::{self, DEFAULT_DEBOUNCE_WINDOW};
use crate::execution_guard::{DEFAULT_SUPPRESSION_WINDOW, ExecutionGuard};
use crate::ports::{AutomationStore, Clock, DeviceBus, Notifier};
use crate::trigger_scheduler::{self, TimerKey, TimerRegistry};

/// Tunable windows of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Quiet period used to coalesce bursts of device deltas.
    pub debounce_window: Duration,
    /// Cool-down after an automation fires.
    pub suppression_window: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            debounce_window: DEFAULT_DEBOUNCE_WINDOW,
            suppression_window: DEFAULT_SUPPRESSION_WINDOW,
        }
    }
}

/// The automation rule engine.
///
/// Cheap to clone: clones share the same automation set.
pub struct AutomationEngine<S, B, N, C> {
    inner: Arc<Inner<S, B, N, C>>,
}

impl<S, B, N, C> Clone for AutomationEngine<S, B, N, C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct Inner<S, B, N, C> {
    store: S,
    bus: B,
    notifier: N,
    clock: Arc<C>,
    config: EngineConfig,
    state: Mutex<EngineState>,
}

struct EngineState {
    automations: Vec<Automation>,
    timers: TimerRegistry,
    guard: ExecutionGuard,
    dispatcher: Option<JoinHandle<()>>,
}

impl Drop for EngineState {
    fn drop(&mut self) {
        if let Some(dispatcher) = self.dispatcher.take() {
            dispatcher.abort();
        }
    }
}

fn not_found(id: AutomationId) -> DobbyError {
    NotFoundError {
        entity: "Automation",
        id: id.to_string(),
    }
    .into()
}

impl<S, B, N, C> AutomationEngine<S, B, N, C>
where
    S: AutomationStore + Send + Sync + 'static,
    B: DeviceBus + 'static,
    N: Notifier + 'static,
    C: Clock + 'static,
{
    /// Create an engine with the default windows.
    pub fn new(store: S, bus: B, notifier: N, clock: C) -> Self {
        Self::with_config(store, bus, notifier, clock, EngineConfig::default())
    }

    /// Create an engine with explicit windows.
    pub fn with_config(store: S, bus: B, notifier: N, clock: C, config: EngineConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                bus,
                notifier,
                clock: Arc::new(clock),
                config,
                state: Mutex::new(EngineState {
                    automations: Vec::new(),
                    timers: TimerRegistry::default(),
                    guard: ExecutionGuard::new(config.suppression_window),
                    dispatcher: None,
                }),
            }),
        }
    }

    /// The device bus this engine listens to and commands.
    pub fn device_bus(&self) -> &B {
        &self.inner.bus
    }

    /// Load automations from the store, arm their timers and start
    /// listening to the device bus.
    ///
    /// A store that cannot be read leaves the engine with an empty set.
    /// Calling this again reloads and re-arms without subscribing twice.
    #[tracing::instrument(skip(self))]
    pub async fn initialize(&self) {
        let loaded = match self.inner.store.load().await {
            Ok(automations) => automations,
            Err(err) => {
                tracing::warn!(error = %err, "failed to load automations, starting with none");
                Vec::new()
            }
        };

        let mut guard = self.inner.state.lock().await;
        let state = &mut *guard;
        state.timers.cancel_all();

        let mut seen = HashSet::new();
        state.automations = loaded
            .into_iter()
            .filter(|automation| {
                let unique = seen.insert(automation.id);
                if !unique {
                    tracing::warn!(automation_id = %automation.id, "dropping automation with duplicate id");
                }
                unique
            })
            .collect();

        for automation in state.automations.iter().filter(|a| a.enabled) {
            self.inner.arm_timers(&mut state.timers, automation);
        }

        if state.dispatcher.is_none() {
            state.dispatcher = Some(self.inner.spawn_dispatcher());
        }

        tracing::info!(
            automations = state.automations.len(),
            timers = state.timers.len(),
            "automation engine initialized"
        );
    }

    /// Create an automation from `definition` with a fresh id.
    ///
    /// # Errors
    ///
    /// Returns [`DobbyError::Validation`] when the definition is malformed.
    #[tracing::instrument(skip(self, definition), fields(name = %definition.name))]
    pub async fn add_automation(
        &self,
        definition: AutomationDefinition,
    ) -> Result<Automation, DobbyError> {
        definition.validate()?;

        let mut guard = self.inner.state.lock().await;
        let state = &mut *guard;

        let mut id = AutomationId::new();
        while state.automations.iter().any(|a| a.id == id) {
            id = AutomationId::new();
        }
        let automation = definition.with_id(id);

        if automation.enabled {
            self.inner.arm_timers(&mut state.timers, &automation);
        }
        state.automations.push(automation.clone());
        self.inner.persist(&state.automations).await;

        tracing::info!(automation_id = %id, "automation created");
        Ok(automation)
    }

    /// Replace the automation with the same id, keeping its position.
    ///
    /// # Errors
    ///
    /// Returns [`DobbyError::NotFound`] when no automation has that id, or
    /// [`DobbyError::Validation`] when the record is malformed.
    #[tracing::instrument(skip(self, automation), fields(automation_id = %automation.id))]
    pub async fn update_automation(&self, automation: Automation) -> Result<Automation, DobbyError> {
        automation.validate()?;

        let mut guard = self.inner.state.lock().await;
        let state = &mut *guard;

        let position = state
            .automations
            .iter()
            .position(|a| a.id == automation.id)
            .ok_or_else(|| not_found(automation.id))?;

        let cancelled = state.timers.cancel_automation(automation.id);
        if automation.enabled {
            self.inner.arm_timers(&mut state.timers, &automation);
        }
        state.automations[position] = automation.clone();
        self.inner.persist(&state.automations).await;

        tracing::info!(
            cancelled,
            armed = state.timers.count_for(automation.id),
            enabled = automation.enabled,
            "automation updated"
        );
        Ok(automation)
    }

    /// Remove an automation and cancel its timers.
    ///
    /// # Errors
    ///
    /// Returns [`DobbyError::NotFound`] when no automation has that id.
    #[tracing::instrument(skip(self))]
    pub async fn remove_automation(&self, id: AutomationId) -> Result<(), DobbyError> {
        let mut guard = self.inner.state.lock().await;
        let state = &mut *guard;

        let position = state
            .automations
            .iter()
            .position(|a| a.id == id)
            .ok_or_else(|| not_found(id))?;

        state.timers.cancel_automation(id);
        state.guard.forget(id);
        state.automations.remove(position);
        self.inner.persist(&state.automations).await;

        tracing::info!("automation removed");
        Ok(())
    }

    /// Snapshot of all automations in insertion order.
    pub async fn list_automations(&self) -> Vec<Automation> {
        self.inner.state.lock().await.automations.clone()
    }

    /// Fetch a single automation.
    ///
    /// # Errors
    ///
    /// Returns [`DobbyError::NotFound`] when no automation has that id.
    pub async fn get_automation(&self, id: AutomationId) -> Result<Automation, DobbyError> {
        self.inner
            .state
            .lock()
            .await
            .automations
            .iter()
            .find(|a| a.id == id)
            .cloned()
            .ok_or_else(|| not_found(id))
    }

    /// Number of timers currently armed for `id`.
    pub async fn armed_timer_count(&self, id: AutomationId) -> usize {
        self.inner.state.lock().await.timers.count_for(id)
    }

    /// Run the device-trigger match pass for one (coalesced) delta.
    ///
    /// Returns the ids of the automations that fired; their actions run in
    /// the background.
    pub async fn process_device_event(&self, event: &DeviceStateChanged) -> Vec<AutomationId> {
        self.inner.process_device_event(event).await
    }

    /// Cancel every timer and stop listening to the device bus.
    pub async fn shutdown(&self) {
        let mut state = self.inner.state.lock().await;
        state.timers.cancel_all();
        if let Some(dispatcher) = state.dispatcher.take() {
            dispatcher.abort();
        }
        tracing::info!("automation engine stopped");
    }
}

impl<S, B, N, C> Inner<S, B, N, C>
where
    S: AutomationStore + Send + Sync + 'static,
    B: DeviceBus + 'static,
    N: Notifier + 'static,
    C: Clock + 'static,
{
    async fn persist(&self, automations: &[Automation]) {
        if let Err(err) = self.store.save(automations).await {
            tracing::error!(error = %err, "failed to persist automations, will retry on next change");
        }
    }

    fn arm_timers(self: &Arc<Self>, timers: &mut TimerRegistry, automation: &Automation) {
        for (key, schedule) in trigger_scheduler::schedules_for(automation) {
            let weak = Arc::downgrade(self);
            let clock = Arc::clone(&self.clock);
            timers.arm(key, move |generation| {
                tokio::spawn(trigger_scheduler::run_daily(schedule, clock, move |_| {
                    let weak = Weak::clone(&weak);
                    async move {
                        match weak.upgrade() {
                            Some(inner) => inner.fire_time_trigger(key, generation).await,
                            None => false,
                        }
                    }
                }))
            });
        }
    }

    /// Returns `false` when the timer should stop re-arming.
    async fn fire_time_trigger(self: &Arc<Self>, key: TimerKey, generation: u64) -> bool {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;

        if !state.timers.is_current(&key, generation) {
            return false;
        }
        let Some(automation) = state
            .automations
            .iter()
            .find(|a| a.id == key.automation_id && a.enabled)
        else {
            return false;
        };

        if state.guard.should_suppress(automation.id) {
            tracing::debug!(automation_id = %automation.id, "time trigger suppressed");
            return true;
        }
        if !condition_evaluator::evaluate(&automation.conditions, &self.bus, self.clock.now()) {
            tracing::debug!(automation_id = %automation.id, "time trigger conditions not met");
            return true;
        }

        state.guard.mark_fired(automation.id);
        self.spawn_execution(automation);
        true
    }

    async fn process_device_event(self: &Arc<Self>, event: &DeviceStateChanged) -> Vec<AutomationId> {
        let now = self.clock.now();
        let mut guard = self.state.lock().await;
        let state = &mut *guard;

        let mut fired = Vec::new();
        for automation in state.automations.iter().filter(|a| a.enabled) {
            if !automation
                .triggers
                .iter()
                .any(|trigger| trigger.matches_device_event(event))
            {
                continue;
            }
            if state.guard.should_suppress(automation.id) {
                tracing::debug!(automation_id = %automation.id, "device trigger suppressed");
                continue;
            }
            if !condition_evaluator::evaluate(&automation.conditions, &self.bus, now) {
                tracing::debug!(automation_id = %automation.id, "device trigger conditions not met");
                continue;
            }
            state.guard.mark_fired(automation.id);
            self.spawn_execution(automation);
            fired.push(automation.id);
        }
        fired
    }

    fn spawn_execution(self: &Arc<Self>, automation: &Automation) {
        let inner = Arc::clone(self);
        let actions = automation.actions.clone();
        let span = tracing::info_span!(
            "automation",
            automation_id = %automation.id,
            name = %automation.name
        );
        tokio::spawn(
            async move {
                let report = action_executor::execute(&actions, &inner.bus, &inner.notifier).await;
                tracing::info!(
                    dispatched = report.dispatched,
                    failed = report.failed,
                    "automation executed"
                );
            }
            .instrument(span),
        );
    }

    fn spawn_dispatcher(self: &Arc<Self>) -> JoinHandle<()> {
        let rx = self.bus.subscribe();
        let weak = Arc::downgrade(self);
        tokio::spawn(event_dispatcher::run(
            rx,
            self.config.debounce_window,
            move |event| {
                let weak = Weak::clone(&weak);
                async move {
                    let Some(inner) = weak.upgrade() else {
                        return false;
                    };
                    let fired = inner.process_device_event(&event).await;
                    if !fired.is_empty() {
                        tracing::debug!(device_id = %event.device_id, fired = fired.len(), "device event matched");
                    }
                    true
                }
            },
        ))
    }
}
