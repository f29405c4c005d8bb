//! Topic layout of a zigbee2mqtt bridge.
//!
//! ```text
//! <base>/bridge/devices          device list (retained)
//! <base>/bridge/request/devices  ask the bridge to republish the list
//! <base>/<friendly_name>         device state (JSON object)
//! <base>/<friendly_name>/set     device command (JSON object)
//! ```

use serde::Deserialize;

use dobby_domain::device::DeviceState;
use dobby_domain::id::DeviceId;

use crate::error::MqttError;

/// Topics to subscribe to once connected.
#[must_use]
pub fn subscriptions(base: &str) -> [String; 2] {
    [format!("{base}/+"), format!("{base}/bridge/+")]
}

/// Topic on which the bridge is asked to republish its device list.
#[must_use]
pub fn device_list_request(base: &str) -> String {
    format!("{base}/bridge/request/devices")
}

/// Topic on which a command for `device_id` is published.
#[must_use]
pub fn command_topic(base: &str, device_id: &DeviceId) -> String {
    format!("{base}/{device_id}/set")
}

/// A decoded bridge message.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// The bridge announced its devices.
    Devices(Vec<DeviceId>),
    /// A device reported (part of) its state.
    State { device_id: DeviceId, state: DeviceState },
    /// Anything else published under the base topic.
    Ignored,
}

#[derive(Deserialize)]
struct BridgeDevice {
    friendly_name: Option<String>,
}

/// Decode a message received on `topic`.
///
/// # Errors
///
/// Returns [`MqttError::Payload`] when a device list or device state
/// payload is not the expected JSON.
pub fn parse_message(base: &str, topic: &str, payload: &[u8]) -> Result<Message, MqttError> {
    let Some(rest) = topic
        .strip_prefix(base)
        .and_then(|rest| rest.strip_prefix('/'))
    else {
        return Ok(Message::Ignored);
    };

    let invalid = |source| MqttError::Payload {
        topic: topic.to_string(),
        source,
    };

    if rest == "bridge/devices" {
        let devices: Vec<BridgeDevice> = serde_json::from_slice(payload).map_err(invalid)?;
        let names = devices
            .into_iter()
            .filter_map(|device| device.friendly_name)
            .filter(|name| !name.trim().is_empty())
            .map(DeviceId::from)
            .collect();
        return Ok(Message::Devices(names));
    }

    if rest.is_empty() || rest.contains('/') || rest == "bridge" {
        return Ok(Message::Ignored);
    }

    let state: DeviceState = serde_json::from_slice(payload).map_err(invalid)?;
    Ok(Message::State {
        device_id: DeviceId::new(rest),
        state,
    })
}
