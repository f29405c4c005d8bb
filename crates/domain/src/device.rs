//! Device: property values reported by, and commands sent to, devices.
//!
//! Devices themselves live on the device bus; the domain only needs the
//! shape of their state so that triggers and conditions can compare it.

mod value;

pub use value::StateValue;

use std::collections::BTreeMap;

/// Property name → value, as reported by a device (full or partial).
pub type DeviceState = BTreeMap<String, StateValue>;

/// Property name → requested value, as sent to a device.
pub type DeviceCommand = BTreeMap<String, StateValue>;

/// Build a single-entry command `{command: value}`.
#[must_use]
pub fn command(name: impl Into<String>, value: impl Into<StateValue>) -> DeviceCommand {
    DeviceCommand::from([(name.into(), value.into())])
}
