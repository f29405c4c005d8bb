//! Condition: a guard that must be true for the automation to proceed.

use serde::{Deserialize, Serialize};

use crate::device::StateValue;
use crate::error::ValidationError;
use crate::id::DeviceId;
use crate::time::{DaySet, TimeOfDay};

/// Comparison applied by a [`Condition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Operator {
    Equals,
    NotEquals,
    GreaterThan,
    LessThan,
    Between,
    Contains,
}

impl Operator {
    /// Apply an ordering-based operator to two values of the same type.
    ///
    /// `Between` and `Contains` need more than two ordered operands and
    /// never hold here.
    #[must_use]
    pub fn holds<T: PartialOrd>(self, left: &T, right: &T) -> bool {
        match self {
            Self::Equals => left == right,
            Self::NotEquals => left != right,
            Self::GreaterThan => left > right,
            Self::LessThan => left < right,
            Self::Between | Self::Contains => false,
        }
    }

    /// Apply the operator to a live device value (`left`) and the expected value.
    #[must_use]
    pub fn apply(self, left: &StateValue, right: &StateValue) -> bool {
        match self {
            Self::Contains => left.contains(right),
            other => other.holds(left, right),
        }
    }
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Equals => "==",
            Self::NotEquals => "!=",
            Self::GreaterThan => ">",
            Self::LessThan => "<",
            Self::Between => "between",
            Self::Contains => "contains",
        })
    }
}

/// A predicate that must hold for the automation actions to execute.
///
/// Conditions are evaluated *after* a trigger fires. All conditions
/// in an automation must be satisfied (logical AND).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Condition {
    /// Compares a live device property against `value`.
    Device {
        device_id: DeviceId,
        property: String,
        operator: Operator,
        value: StateValue,
    },
    /// Compares the current local time against `time`, or against the
    /// `[time, end_time]` window for [`Operator::Between`].
    Time {
        operator: Operator,
        time: TimeOfDay,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        end_time: Option<TimeOfDay>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        days: Option<DaySet>,
    },
    /// Reserved. Always holds.
    State {
        operator: Operator,
        state_key: String,
        #[serde(default)]
        state_value: StateValue,
    },
}

impl Condition {
    /// Check the fields a condition of this kind requires.
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
            Self::Time {
                operator,
                time,
                end_time,
                ..
            } => {
                time.validate()?;
                match (operator, end_time) {
                    (_, Some(end)) => end.validate(),
                    (Operator::Between, None) => Err(ValidationError::MissingEndTime),
                    _ => Ok(()),
                }
            }
            Self::State { state_key, .. } => {
                if state_key.trim().is_empty() {
                    return Err(ValidationError::EmptyField { field: "stateKey" });
                }
                Ok(())
            }
        }
    }
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Device {
                device_id,
                property,
                operator,
                value,
            } => write!(f, "device({device_id}.{property} {operator} {value})"),
            Self::Time {
                operator: Operator::Between,
                time,
                end_time: Some(end),
                ..
            } => write!(f, "time({time}..{end})"),
            Self::Time { operator, time, .. } => write!(f, "time(now {operator} {time})"),
            Self::State { state_key, .. } => write!(f, "state({state_key})"),
        }
    }
}
