//! Event: a device-state delta delivered by the device bus.

use serde::{Deserialize, Serialize};

use crate::device::{DeviceState, StateValue};
use crate::id::DeviceId;

/// A (possibly partial) state update for one device.
///
/// Devices often report one physical change as several deltas (e.g. link
/// quality and on/off state in separate messages), so `state` only carries
/// the properties present in this particular message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceStateChanged {
    pub device_id: DeviceId,
    pub state: DeviceState,
}

impl DeviceStateChanged {
    #[must_use]
    pub fn new(device_id: impl Into<DeviceId>, state: DeviceState) -> Self {
        Self {
            device_id: device_id.into(),
            state,
        }
    }

    /// Value of `property` in this delta, if the delta carries it.
    #[must_use]
    pub fn get(&self, property: &str) -> Option<&StateValue> {
        self.state.get(property)
    }

    /// Fold a later delta for the same device into this one; later values win.
    pub fn merge(&mut self, later: DeviceStateChanged) {
        self.state.extend(later.state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn delta(pairs: &[(&str, StateValue)]) -> DeviceStateChanged {
        DeviceStateChanged::new(
            "lamp1",
            pairs
                .iter()
                .map(|(k, v)| ((*k).to_string(), v.clone()))
                .collect(),
        )
    }

    #[test]
    fn should_merge_later_values_over_earlier_ones() {
        let mut first = delta(&[("state", "OFF".into()), ("linkquality", 40.into())]);
        first.merge(delta(&[("state", "ON".into())]));
        assert_eq!(first.get("state"), Some(&StateValue::from("ON")));
        assert_eq!(first.get("linkquality"), Some(&StateValue::from(40)));
    }

    #[test]
    fn should_serialize_with_camel_case_fields() {
        let event = delta(&[("state", "ON".into())]);
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["deviceId"], "lamp1");
        assert_eq!(json["state"]["state"], "ON");
    }
}
