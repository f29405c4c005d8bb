//! Device bus port: live device state and command delivery.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::broadcast;

use dobby_domain::device::{DeviceCommand, DeviceState};
use dobby_domain::error::DobbyError;
use dobby_domain::event::DeviceStateChanged;
use dobby_domain::id::DeviceId;

/// Read access to the last known state of each device.
pub trait DeviceStateSource {
    /// Current state of `device_id`, or `None` when the device is unknown.
    fn device_state(&self, device_id: &DeviceId) -> Option<DeviceState>;
}

/// Publish/subscribe collaborator delivering device state and accepting commands.
pub trait DeviceBus: DeviceStateSource + Send + Sync {
    /// Subscribe to state deltas published *after* this call.
    fn subscribe(&self) -> broadcast::Receiver<DeviceStateChanged>;

    /// Send `command` to `device_id`.
    fn send_command(
        &self,
        device_id: &DeviceId,
        command: DeviceCommand,
    ) -> impl Future<Output = Result<(), DobbyError>> + Send;

    /// Whether the underlying transport is currently connected.
    fn is_connected(&self) -> bool {
        true
    }
}

impl<T: DeviceStateSource> DeviceStateSource for Arc<T> {
    fn device_state(&self, device_id: &DeviceId) -> Option<DeviceState> {
        (**self).device_state(device_id)
    }
}

impl<T: DeviceBus> DeviceBus for Arc<T> {
    fn subscribe(&self) -> broadcast::Receiver<DeviceStateChanged> {
        (**self).subscribe()
    }

    fn send_command(
        &self,
        device_id: &DeviceId,
        command: DeviceCommand,
    ) -> impl Future<Output = Result<(), DobbyError>> + Send {
        (**self).send_command(device_id, command)
    }

    fn is_connected(&self) -> bool {
        (**self).is_connected()
    }
}
