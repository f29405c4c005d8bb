//! Notifier that forwards notification actions to `tracing`.

use dobby_domain::automation::NotificationLevel;
use dobby_domain::error::DobbyError;

use crate::ports::Notifier;

/// Emits each notification as a `tracing` event at the matching level.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    async fn notify(&self, level: NotificationLevel, message: &str) -> Result<(), DobbyError> {
        match level {
            NotificationLevel::Info => tracing::info!(target: "dobby::notification", "{message}"),
            NotificationLevel::Warning => {
                tracing::warn!(target: "dobby::notification", "{message}");
            }
            NotificationLevel::Error => {
                tracing::error!(target: "dobby::notification", "{message}");
            }
        }
        Ok(())
    }
}
