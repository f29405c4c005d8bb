//! Clock implementations.

use chrono::{Local, NaiveDateTime, TimeDelta};
use tokio::time::Instant;

use crate::ports::Clock;

/// The host's local wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// A wall clock that advances with tokio's clock.
///
/// Anchored at a fixed local time when created, it reports that time plus
/// whatever tokio has advanced since. Under a paused tokio runtime this lets
/// daily schedules be driven deterministically with `tokio::time::advance`
/// or plain sleeps.
#[derive(Debug, Clone, Copy)]
pub struct VirtualClock {
    start: NaiveDateTime,
    anchor: Instant,
}

impl VirtualClock {
    #[must_use]
    pub fn starting_at(start: NaiveDateTime) -> Self {
        Self {
            start,
            anchor: Instant::now(),
        }
    }
}

impl Clock for VirtualClock {
    fn now(&self) -> NaiveDateTime {
        TimeDelta::from_std(self.anchor.elapsed())
            .ok()
            .and_then(|elapsed| self.start.checked_add_signed(elapsed))
            .unwrap_or(NaiveDateTime::MAX)
    }
}
