//! Action execution: dispatches an automation's actions one by one.

use dobby_domain::automation::Action;

use crate::ports::{DeviceBus, Notifier};

/// Outcome of executing an action list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecutionReport {
    pub dispatched: usize,
    pub failed: usize,
}

/// Execute `actions` in order.
///
/// Each action is dispatched independently: a failing action is logged and
/// counted, and the remaining actions still run.
pub async fn execute<B, N>(actions: &[Action], bus: &B, notifier: &N) -> ExecutionReport
where
    B: DeviceBus,
    N: Notifier,
{
    let mut report = ExecutionReport::default();
    for action in actions {
        let result = match action {
            Action::Device { .. } => match action.device_command() {
                Some((device_id, command)) => bus.send_command(device_id, command).await,
                None => Ok(()),
            },
            Action::Notification { message, level } => notifier.notify(*level, message).await,
            Action::Scene { scene_name } => {
                tracing::debug!(scene = %scene_name, "scene activation is not supported yet");
                Ok(())
            }
        };
        match result {
            Ok(()) => report.dispatched += 1,
            Err(err) => {
                tracing::warn!(action = %action, error = %err, "action failed");
                report.failed += 1;
            }
        }
    }
    report
}
