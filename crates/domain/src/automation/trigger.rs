//! Trigger: the event or schedule that activates an automation.

use serde::{Deserialize, Serialize};

use crate::device::StateValue;
use crate::error::ValidationError;
use crate::event::DeviceStateChanged;
use crate::id::DeviceId;
use crate::time::{DaySet, TimeOfDay};

/// Describes what should activate an automation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Trigger {
    /// Fires when an update for `device_id` sets `property` to exactly `value`.
    Device {
        device_id: DeviceId,
        property: String,
        value: StateValue,
    },
    /// Fires daily at the given local time, optionally only on some weekdays.
    Time {
        time: TimeOfDay,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        days: Option<DaySet>,
    },
    /// Reserved for engine-internal state comparisons. Never fires.
    State {
        state_key: String,
        #[serde(default)]
        state_value: StateValue,
    },
}

impl Trigger {
    /// Check whether this trigger matches a device-state delta.
    ///
    /// `Time` triggers are driven by the scheduler and `State` triggers are
    /// not implemented, so neither matches device events.
    #[must_use]
    pub fn matches_device_event(&self, event: &DeviceStateChanged) -> bool {
        match self {
            Self::Device {
                device_id,
                property,
                value,
            } => *device_id == event.device_id && event.get(property) == Some(value),
            Self::Time { .. } | Self::State { .. } => false,
        }
    }

    /// Check the fields a trigger of this kind requires.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] found.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            Self::Device {
                device_id,
                property,
                ..
            } => {
                if device_id.is_empty() {
                    return Err(ValidationError::EmptyField { field: "deviceId" });
                }
                if property.trim().is_empty() {
                    return Err(ValidationError::EmptyField { field: "property" });
                }
                Ok(())
            }
            Self::Time { time, .. } => time.validate(),
            Self::State { state_key, .. } => {
                if state_key.trim().is_empty() {
                    return Err(ValidationError::EmptyField { field: "stateKey" });
                }
                Ok(())
            }
        }
    }
}

impl std::fmt::Display for Trigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Device {
                device_id,
                property,
                value,
            } => write!(f, "device({device_id}.{property} == {value})"),
            Self::Time { time, .. } => write!(f, "time({time})"),
            Self::State { state_key, .. } => write!(f, "state({state_key})"),
        }
    }
}
