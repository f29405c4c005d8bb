//! # dobby-app
//!
//! Application layer: the automation rule engine and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `AutomationStore`: durable automation list
//!   - `DeviceBus` / `DeviceStateSource`: device state stream and commands
//!   - `Notifier`: sink for notification actions
//!   - `Clock`: local wall-clock time
//! - Provide the engine components:
//!   - `condition_evaluator`: pure condition predicates
//!   - `action_executor`: per-action dispatch with failure isolation
//!   - `execution_guard`: cool-down after an automation fires
//!   - `trigger_scheduler`: daily timers for time triggers
//!   - `event_dispatcher`: debounced device-event consumption
//!   - `AutomationEngine`: CRUD surface and lifecycle owner of the above
//! - Provide **in-process infrastructure** (device bus, log notifier, clocks) that doesn't need IO
//!
//! ## Dependency rule
//! Depends on `dobby-domain` only (plus `tokio` for tasks, timers and channels).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod action_executor;
pub mod automation_engine;
pub mod clock;
pub mod condition_evaluator;
pub mod device_bus;
pub mod event_dispatcher;
pub mod execution_guard;
pub mod notifier;
pub mod ports;
pub mod trigger_scheduler;

pub use automation_engine::{AutomationEngine, EngineConfig};
