//! MQTT device bus configuration.

use serde::Deserialize;

/// Default MQTT broker port.
pub const DEFAULT_PORT: u16 = 1883;

/// Configuration for the MQTT device bus.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MqttConfig {
    /// Use the MQTT bus instead of the in-process one.
    pub enabled: bool,
    /// MQTT broker hostname or IP address.
    pub broker_host: String,
    /// MQTT broker port.
    pub broker_port: u16,
    /// MQTT client identifier.
    pub client_id: String,
    /// Topic prefix the zigbee bridge publishes under.
    pub base_topic: String,
    /// Keep-alive interval in seconds.
    pub keep_alive_secs: u16,
    /// Pause between reconnection attempts, in seconds.
    pub reconnect_delay_secs: u16,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            broker_host: "localhost".to_string(),
            broker_port: DEFAULT_PORT,
            client_id: "dobby".to_string(),
            base_topic: "zigbee2mqtt".to_string(),
            keep_alive_secs: 30,
            reconnect_delay_secs: 5,
        }
    }
}

/// Split a broker URL such as `mqtt://broker:1883` into host and port.
///
/// The `mqtt://` and `tcp://` schemes are accepted, as is a bare
/// `host[:port]`. A missing port means [`DEFAULT_PORT`].
#[must_use]
pub fn parse_broker_url(url: &str) -> Option<(String, u16)> {
    let rest = url
        .strip_prefix("mqtt://")
        .or_else(|| url.strip_prefix("tcp://"))
        .unwrap_or(url);
    if rest.contains("://") {
        return None;
    }
    let authority = rest.split('/').next().unwrap_or_default();
    let (host, port) = match authority.rsplit_once(':') {
        Some((host, port)) => (host, port.parse().ok()?),
        None => (authority, DEFAULT_PORT),
    };
    if host.is_empty() {
        return None;
    }
    Some((host.to_string(), port))
}
