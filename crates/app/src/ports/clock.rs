//! Clock port: local wall-clock time.

use chrono::NaiveDateTime;

/// Source of the current local wall-clock time.
///
/// Time triggers and time conditions are expressed in local time without a
/// zone, so the clock hands out [`NaiveDateTime`]s.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}
