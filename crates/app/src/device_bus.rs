//! In-process device bus backed by a tokio broadcast channel.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{PoisonError, RwLock};

use tokio::sync::broadcast;

use dobby_domain::device::{DeviceCommand, DeviceState};
use dobby_domain::error::{DispatchError, DobbyError};
use dobby_domain::event::DeviceStateChanged;
use dobby_domain::id::DeviceId;

use crate::ports::{DeviceBus, DeviceStateSource};

/// Device bus living entirely in memory.
///
/// Devices behave like virtual devices: a command sent to a registered
/// device is merged into its state and echoed back as a state change.
/// Publishing succeeds even when there are no active subscribers
/// (the delta is simply dropped).
pub struct InProcessDeviceBus {
    sender: broadcast::Sender<DeviceStateChanged>,
    devices: RwLock<HashMap<DeviceId, DeviceState>>,
}

impl InProcessDeviceBus {
    /// Create a new bus with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            devices: RwLock::new(HashMap::new()),
        }
    }

    /// Make a device known to the bus without announcing it.
    pub fn register_device(&self, device_id: impl Into<DeviceId>, state: DeviceState) {
        self.devices
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(device_id.into(), state);
    }

    /// Merge `delta` into the device's state and broadcast it.
    ///
    /// Unknown devices are registered on first publish.
    pub fn publish_state(&self, device_id: impl Into<DeviceId>, delta: DeviceState) {
        let event = DeviceStateChanged::new(device_id, delta);
        self.devices
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(event.device_id.clone())
            .or_default()
            .extend(event.state.clone());
        // broadcast::send fails only when there are zero receivers.
        let _ = self.sender.send(event);
    }

    /// Identifiers of all known devices, sorted.
    #[must_use]
    pub fn device_ids(&self) -> Vec<DeviceId> {
        let mut ids: Vec<DeviceId> = self
            .devices
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        ids.sort();
        ids
    }

    fn is_known(&self, device_id: &DeviceId) -> bool {
        self.devices
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(device_id)
    }
}

impl Default for InProcessDeviceBus {
    fn default() -> Self {
        Self::new(256)
    }
}

impl DeviceStateSource for InProcessDeviceBus {
    fn device_state(&self, device_id: &DeviceId) -> Option<DeviceState> {
        self.devices
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(device_id)
            .cloned()
    }
}

impl DeviceBus for InProcessDeviceBus {
    fn subscribe(&self) -> broadcast::Receiver<DeviceStateChanged> {
        self.sender.subscribe()
    }

    fn send_command(
        &self,
        device_id: &DeviceId,
        command: DeviceCommand,
    ) -> impl Future<Output = Result<(), DobbyError>> + Send {
        let result = if self.is_known(device_id) {
            self.publish_state(device_id.clone(), command);
            Ok(())
        } else {
            Err(DispatchError::UnknownDevice(device_id.to_string()).into())
        };
        async { result }
    }
}
