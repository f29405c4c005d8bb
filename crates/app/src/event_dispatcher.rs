//! Event dispatch: debounced consumption of the device bus stream.

use std::future::Future;
use std::time::Duration;

use tokio::sync::broadcast::{self, error::RecvError};
use tokio::time::Instant;

use dobby_domain::event::DeviceStateChanged;

/// Default quiet period before a burst of deltas is handed over.
pub const DEFAULT_DEBOUNCE_WINDOW: Duration = Duration::from_millis(500);

/// A burst is never held back longer than this many debounce windows.
const MAX_WINDOWS_PER_BATCH: u32 = 4;

/// Wait for the next burst of deltas.
///
/// Collects deltas until `window` passes without a new one (or the burst
/// has lasted [`MAX_WINDOWS_PER_BATCH`] windows). Returns `None` once the
/// channel is closed and nothing is pending.
pub async fn next_batch(
    rx: &mut broadcast::Receiver<DeviceStateChanged>,
    window: Duration,
) -> Option<Vec<DeviceStateChanged>> {
    let first = loop {
        match rx.recv().await {
            Ok(event) => break event,
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "device event stream lagged");
            }
            Err(RecvError::Closed) => return None,
        }
    };

    let mut batch = vec![first];
    let hard_deadline = Instant::now() + window * MAX_WINDOWS_PER_BATCH;
    loop {
        let quiet_deadline = (Instant::now() + window).min(hard_deadline);
        match tokio::time::timeout_at(quiet_deadline, rx.recv()).await {
            Ok(Ok(event)) => batch.push(event),
            Ok(Err(RecvError::Lagged(skipped))) => {
                tracing::warn!(skipped, "device event stream lagged");
            }
            Ok(Err(RecvError::Closed)) | Err(_) => break,
        }
        if Instant::now() >= hard_deadline {
            break;
        }
    }
    Some(batch)
}

/// Merge deltas per device, keeping devices in first-arrival order.
#[must_use]
pub fn coalesce(batch: Vec<DeviceStateChanged>) -> Vec<DeviceStateChanged> {
    let mut merged: Vec<DeviceStateChanged> = Vec::with_capacity(batch.len());
    for event in batch {
        match merged.iter_mut().find(|m| m.device_id == event.device_id) {
            Some(existing) => existing.merge(event),
            None => merged.push(event),
        }
    }
    merged
}

/// Consume `rx` until it closes, handing each coalesced delta to `handle`.
///
/// Stops early when `handle` returns `false`.
pub async fn run<F, Fut>(
    mut rx: broadcast::Receiver<DeviceStateChanged>,
    window: Duration,
    mut handle: F,
) where
    F: FnMut(DeviceStateChanged) -> Fut,
    Fut: Future<Output = bool>,
{
    while let Some(batch) = next_batch(&mut rx, window).await {
        tracing::trace!(size = batch.len(), "device event batch");
        for event in coalesce(batch) {
            if !handle(event).await {
                return;
            }
        }
    }
    tracing::debug!("device event stream closed");
}
