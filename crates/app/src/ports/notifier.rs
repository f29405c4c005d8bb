//! Notifier port: sink for notification actions.

use std::future::Future;

use dobby_domain::automation::NotificationLevel;
use dobby_domain::error::DobbyError;

/// Delivers leveled messages produced by notification actions.
pub trait Notifier: Send + Sync {
    fn notify(
        &self,
        level: NotificationLevel,
        message: &str,
    ) -> impl Future<Output = Result<(), DobbyError>> + Send;
}

impl<T: Notifier> Notifier for std::sync::Arc<T> {
    fn notify(
        &self,
        level: NotificationLevel,
        message: &str,
    ) -> impl Future<Output = Result<(), DobbyError>> + Send {
        (**self).notify(level, message)
    }
}
