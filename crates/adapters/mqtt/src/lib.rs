//! # dobby-adapter-mqtt
//!
//! MQTT adapter: a device bus backed by a zigbee2mqtt bridge.
//!
//! ## Responsibilities
//! - Connect to an MQTT broker and keep reconnecting
//! - Subscribe to the bridge's device list and device state topics
//! - Translate MQTT messages into device state deltas
//! - Publish device commands to `<base>/<device>/set`
//!
//! ## Dependency rule
//! Same as other adapters: depends on `dobby-app` and `dobby-domain`.

mod bus;
mod config;
mod error;
pub mod topic;

pub use bus::Zigbee2MqttBus;
pub use config::{DEFAULT_PORT, MqttConfig, parse_broker_url};
pub use error::MqttError;
