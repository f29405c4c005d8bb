//! MQTT adapter error types.

use dobby_domain::error::{DispatchError, DobbyError, UnavailableError};

/// Errors specific to the MQTT adapter.
#[derive(Debug, thiserror::Error)]
pub enum MqttError {
    /// The broker connection is down.
    #[error("MQTT client not connected")]
    NotConnected,

    /// The bridge never announced this device.
    #[error("unknown device {0}")]
    UnknownDevice(String),

    /// The rumqttc client refused the request.
    #[error("failed to publish to {device}")]
    Publish {
        device: String,
        #[source]
        source: rumqttc::ClientError,
    },

    /// An MQTT payload was not the JSON we expected.
    #[error("invalid MQTT payload on {topic}")]
    Payload {
        topic: String,
        #[source]
        source: serde_json::Error,
    },
}

impl MqttError {
    /// Convert into the matching [`DobbyError`] for propagation across port
    /// boundaries.
    pub fn into_domain(self) -> DobbyError {
        match self {
            Self::NotConnected => UnavailableError("MQTT broker").into(),
            Self::UnknownDevice(device) => DispatchError::UnknownDevice(device).into(),
            Self::Publish { device, source } => DispatchError::Send {
                device,
                source: Box::new(source),
            }
            .into(),
            other @ Self::Payload { .. } => DobbyError::Storage(Box::new(other)),
        }
    }
}

impl From<MqttError> for DobbyError {
    fn from(err: MqttError) -> Self {
        err.into_domain()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_display_not_connected_error() {
        let err = MqttError::NotConnected;
        assert_eq!(err.to_string(), "MQTT client not connected");
    }

    #[test]
    fn should_convert_not_connected_to_unavailable() {
        let err: DobbyError = MqttError::NotConnected.into();
        assert!(matches!(err, DobbyError::Unavailable(_)));
        assert_eq!(err.to_string(), "MQTT broker is not connected");
    }

    #[test]
    fn should_convert_unknown_device_to_dispatch_error() {
        let err: DobbyError = MqttError::UnknownDevice("lamp9".to_string()).into();
        assert!(matches!(
            err,
            DobbyError::Dispatch(DispatchError::UnknownDevice(ref id)) if id == "lamp9"
        ));
    }

    #[test]
    fn should_display_payload_error_with_topic() {
        let json_err = serde_json::from_str::<serde_json::Value>("{{bad").unwrap_err();
        let err = MqttError::Payload {
            topic: "zigbee2mqtt/lamp1".to_string(),
            source: json_err,
        };
        assert_eq!(err.to_string(), "invalid MQTT payload on zigbee2mqtt/lamp1");
    }
}
