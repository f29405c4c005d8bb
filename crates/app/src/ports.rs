//! Port definitions: traits that adapters implement.
//!
//! Ports are the boundaries between the application core and the outside world.
//! They are defined here (in `app`) so that both the engine and the adapter
//! layer can depend on them without creating circular dependencies.

pub mod automation_store;
pub mod clock;
pub mod device_bus;
pub mod notifier;

pub use automation_store::AutomationStore;
pub use clock::Clock;
pub use device_bus::{DeviceBus, DeviceStateSource};
pub use notifier::Notifier;
