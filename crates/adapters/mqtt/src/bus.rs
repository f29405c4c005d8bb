//! Device bus backed by a zigbee2mqtt bridge.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Outgoing, Packet, QoS};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use dobby_app::ports::{DeviceBus, DeviceStateSource};
use dobby_domain::device::{DeviceCommand, DeviceState};
use dobby_domain::error::DobbyError;
use dobby_domain::event::DeviceStateChanged;
use dobby_domain::id::DeviceId;

use crate::config::MqttConfig;
use crate::error::MqttError;
use crate::topic::{self, Message};

const REQUEST_CAPACITY: usize = 64;
const EVENT_CAPACITY: usize = 256;

/// State shared between the bus handle and its event-loop task.
struct Shared {
    base_topic: String,
    sender: broadcast::Sender<DeviceStateChanged>,
    devices: RwLock<HashMap<DeviceId, DeviceState>>,
    connected: AtomicBool,
}

impl Shared {
    fn handle_publish(&self, topic: &str, payload: &[u8]) {
        match topic::parse_message(&self.base_topic, topic, payload) {
            Ok(Message::Devices(names)) => {
                let mut devices = self.devices.write().unwrap_or_else(PoisonError::into_inner);
                for name in names {
                    devices.entry(name).or_default();
                }
                tracing::info!(count = devices.len(), "device list updated");
            }
            Ok(Message::State { device_id, state }) => self.update_state(device_id, state),
            Ok(Message::Ignored) => {}
            Err(err) => tracing::warn!(error = %err, "dropping MQTT message"),
        }
    }

    fn update_state(&self, device_id: DeviceId, state: DeviceState) {
        {
            let mut devices = self.devices.write().unwrap_or_else(PoisonError::into_inner);
            let Some(known) = devices.get_mut(&device_id) else {
                tracing::debug!(device_id = %device_id, "state for unannounced device ignored");
                return;
            };
            known.extend(state.clone());
        }
        // broadcast::send fails only when there are zero receivers.
        let _ = self.sender.send(DeviceStateChanged::new(device_id, state));
    }

    fn is_known(&self, device_id: &DeviceId) -> bool {
        self.devices
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(device_id)
    }
}

/// Device bus talking to a zigbee2mqtt bridge over MQTT.
///
/// Devices become known when the bridge publishes its device list; their
/// state is then tracked from `<base>/<friendly_name>` messages. The
/// connection is driven by a background task that reconnects on failure.
pub struct Zigbee2MqttBus {
    client: AsyncClient,
    shared: Arc<Shared>,
    event_loop: JoinHandle<()>,
}

impl Zigbee2MqttBus {
    /// Start connecting to the broker described by `config`.
    ///
    /// Returns immediately; the connection is established by a spawned
    /// task, so this must be called from within a tokio runtime.
    #[must_use]
    pub fn connect(config: &MqttConfig) -> Self {
        let mut options = MqttOptions::new(
            config.client_id.clone(),
            config.broker_host.clone(),
            config.broker_port,
        );
        options.set_keep_alive(Duration::from_secs(u64::from(config.keep_alive_secs)));

        let (client, event_loop) = AsyncClient::new(options, REQUEST_CAPACITY);
        let (sender, _) = broadcast::channel(EVENT_CAPACITY);
        let shared = Arc::new(Shared {
            base_topic: config.base_topic.clone(),
            sender,
            devices: RwLock::new(HashMap::new()),
            connected: AtomicBool::new(false),
        });

        tracing::info!(
            host = %config.broker_host,
            port = config.broker_port,
            base_topic = %config.base_topic,
            "connecting to MQTT broker"
        );
        let event_loop = tokio::spawn(run_event_loop(
            event_loop,
            client.clone(),
            Arc::clone(&shared),
            Duration::from_secs(u64::from(config.reconnect_delay_secs)),
        ));

        Self {
            client,
            shared,
            event_loop,
        }
    }

    /// Identifiers of all devices announced by the bridge, sorted.
    #[must_use]
    pub fn device_ids(&self) -> Vec<DeviceId> {
        let mut ids: Vec<DeviceId> = self
            .shared
            .devices
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        ids.sort();
        ids
    }

    fn command_message(
        &self,
        device_id: &DeviceId,
        command: &DeviceCommand,
    ) -> Result<(String, Vec<u8>), MqttError> {
        if !self.shared.connected.load(Ordering::Relaxed) {
            return Err(MqttError::NotConnected);
        }
        if !self.shared.is_known(device_id) {
            return Err(MqttError::UnknownDevice(device_id.to_string()));
        }
        let topic = topic::command_topic(&self.shared.base_topic, device_id);
        let payload = serde_json::to_vec(command).map_err(|source| MqttError::Payload {
            topic: topic.clone(),
            source,
        })?;
        Ok((topic, payload))
    }
}

impl Drop for Zigbee2MqttBus {
    fn drop(&mut self) {
        self.event_loop.abort();
    }
}

impl DeviceStateSource for Zigbee2MqttBus {
    fn device_state(&self, device_id: &DeviceId) -> Option<DeviceState> {
        self.shared
            .devices
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(device_id)
            .cloned()
    }
}

impl DeviceBus for Zigbee2MqttBus {
    fn subscribe(&self) -> broadcast::Receiver<DeviceStateChanged> {
        self.shared.sender.subscribe()
    }

    fn send_command(
        &self,
        device_id: &DeviceId,
        command: DeviceCommand,
    ) -> impl Future<Output = Result<(), DobbyError>> + Send {
        let client = self.client.clone();
        let device = device_id.to_string();
        let prepared = self.command_message(device_id, &command);
        async move {
            let (topic, payload) = prepared?;
            client
                .publish(topic, QoS::AtLeastOnce, false, payload)
                .await
                .map_err(|source| MqttError::Publish { device, source })?;
            Ok(())
        }
    }

    fn is_connected(&self) -> bool {
        self.shared.connected.load(Ordering::Relaxed)
    }
}

async fn run_event_loop(
    mut event_loop: EventLoop,
    client: AsyncClient,
    shared: Arc<Shared>,
    reconnect_delay: Duration,
) {
    loop {
        match event_loop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(_))) => {
                shared.connected.store(true, Ordering::Relaxed);
                tracing::info!("MQTT connected");
                on_connected(&client, &shared.base_topic);
            }
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                shared.handle_publish(&publish.topic, &publish.payload);
            }
            Ok(Event::Incoming(Packet::Disconnect) | Event::Outgoing(Outgoing::Disconnect)) => {
                shared.connected.store(false, Ordering::Relaxed);
                tracing::warn!("MQTT disconnected");
            }
            Ok(_) => {}
            Err(err) => {
                if shared.connected.swap(false, Ordering::Relaxed) {
                    tracing::warn!(error = %err, "MQTT connection lost");
                } else {
                    tracing::debug!(error = %err, "MQTT connection attempt failed");
                }
                tokio::time::sleep(reconnect_delay).await;
            }
        }
    }
}

/// Subscribe and ask for the device list.
///
/// Uses the non-blocking client calls: the event loop is the one draining
/// the request queue, so it must never wait on it.
fn on_connected(client: &AsyncClient, base_topic: &str) {
    for filter in topic::subscriptions(base_topic) {
        if let Err(err) = client.try_subscribe(filter.as_str(), QoS::AtLeastOnce) {
            tracing::error!(topic = %filter, error = %err, "failed to subscribe");
        }
    }
    let request = topic::device_list_request(base_topic);
    if let Err(err) = client.try_publish(request.as_str(), QoS::AtLeastOnce, false, Vec::new()) {
        tracing::error!(topic = %request, error = %err, "failed to request device list");
    }
}
