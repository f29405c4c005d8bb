//! Trigger scheduling: daily recurring timers for time triggers.
//!
//! A time trigger is modelled as a [`DailySchedule`] (a pure "next fire
//! after `now`" function) driven by a single sleeping task per
//! [`TimerKey`]. The [`TimerRegistry`] owns those tasks so they can be
//! cancelled before an automation is re-armed, disabled, or removed.

use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDateTime;
use tokio::task::JoinHandle;

use dobby_domain::automation::{Automation, Trigger};
use dobby_domain::id::AutomationId;
use dobby_domain::time::{DayOfWeek, DaySet, TimeOfDay, day_allowed};

use crate::ports::Clock;

/// Identifies one armed timer: an automation and the `hh:mm` it fires at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerKey {
    pub automation_id: AutomationId,
    pub hour: u8,
    pub minute: u8,
}

/// A daily local time, optionally restricted to some weekdays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailySchedule {
    pub time: TimeOfDay,
    pub days: Option<DaySet>,
}

impl DailySchedule {
    /// First occurrence strictly after `now`.
    ///
    /// Weekdays outside `days` are skipped entirely. Returns `None` only for
    /// an out-of-range time.
    #[must_use]
    pub fn next_after(&self, now: NaiveDateTime) -> Option<NaiveDateTime> {
        let mut date = now.date();
        // today plus one full week covers every allowed weekday
        for _ in 0..8 {
            let candidate = self.time.on(date)?;
            if candidate > now && day_allowed(self.days.as_ref(), DayOfWeek::of(candidate)) {
                return Some(candidate);
            }
            date = date.succ_opt()?;
        }
        None
    }
}

/// Daily schedules for the time triggers of `automation`, keyed by timer.
///
/// Triggers sharing the same `hh:mm` share one timer; their weekday sets
/// are merged, and an unrestricted trigger makes the timer unrestricted.
#[must_use]
pub fn schedules_for(automation: &Automation) -> BTreeMap<TimerKey, DailySchedule> {
    let mut schedules: BTreeMap<TimerKey, DailySchedule> = BTreeMap::new();
    for trigger in automation.time_triggers() {
        let Trigger::Time { time, days } = trigger else {
            continue;
        };
        let days = days.clone().filter(|set| !set.is_empty());
        let key = TimerKey {
            automation_id: automation.id,
            hour: time.hour,
            minute: time.minute,
        };
        schedules
            .entry(key)
            .and_modify(|existing| {
                existing.days = match (existing.days.take(), &days) {
                    (Some(mut merged), Some(more)) => {
                        merged.extend(more.iter().copied());
                        Some(merged)
                    }
                    _ => None,
                };
            })
            .or_insert_with(|| DailySchedule {
                time: *time,
                days: days.clone(),
            });
    }
    schedules
}

/// Longest single sleep before the wall clock is read again.
///
/// Local time can jump (daylight saving changes), so the remaining wait is
/// never trusted for longer than this.
pub const MAX_SLEEP_CHUNK: Duration = Duration::from_secs(60);

/// Sleep until `clock` reads at least `deadline`.
pub async fn sleep_until<C>(clock: &C, deadline: NaiveDateTime)
where
    C: Clock + ?Sized,
{
    loop {
        match (deadline - clock.now()).to_std() {
            Ok(remaining) if !remaining.is_zero() => {
                tokio::time::sleep(remaining.min(MAX_SLEEP_CHUNK)).await;
            }
            _ => return,
        }
    }
}

/// Drive `schedule` forever, calling `on_fire` at each occurrence.
///
/// The next occurrence is recomputed from the clock after every firing.
/// The loop ends when `on_fire` returns `false` or the schedule has no
/// next occurrence.
pub async fn run_daily<C, F, Fut>(schedule: DailySchedule, clock: Arc<C>, mut on_fire: F)
where
    C: Clock + ?Sized,
    F: FnMut(NaiveDateTime) -> Fut,
    Fut: Future<Output = bool>,
{
    loop {
        let Some(next) = schedule.next_after(clock.now()) else {
            tracing::warn!(time = %schedule.time, "time trigger has no next occurrence");
            return;
        };
        tracing::debug!(time = %schedule.time, next = %next, "time trigger armed");
        sleep_until(clock.as_ref(), next).await;
        if !on_fire(next).await {
            return;
        }
    }
}

struct ArmedTimer {
    generation: u64,
    handle: JoinHandle<()>,
}

/// Owns the running timer task of every armed [`TimerKey`].
#[derive(Default)]
pub struct TimerRegistry {
    timers: HashMap<TimerKey, ArmedTimer>,
    next_generation: u64,
}

impl TimerRegistry {
    /// Arm `key`, cancelling any timer already registered under it.
    ///
    /// `spawn` receives the generation number the new timer must present
    /// to [`TimerRegistry::is_current`] when it fires.
    pub fn arm(&mut self, key: TimerKey, spawn: impl FnOnce(u64) -> JoinHandle<()>) {
        if let Some(previous) = self.timers.remove(&key) {
            previous.handle.abort();
        }
        self.next_generation += 1;
        let generation = self.next_generation;
        let handle = spawn(generation);
        self.timers.insert(key, ArmedTimer { generation, handle });
    }

    /// Cancel every timer of `id`. Returns how many were cancelled.
    pub fn cancel_automation(&mut self, id: AutomationId) -> usize {
        let before = self.timers.len();
        self.timers.retain(|key, timer| {
            if key.automation_id == id {
                timer.handle.abort();
                false
            } else {
                true
            }
        });
        before - self.timers.len()
    }

    /// Cancel every timer.
    pub fn cancel_all(&mut self) {
        for (_, timer) in self.timers.drain() {
            timer.handle.abort();
        }
    }

    /// `true` when `generation` is the live timer for `key`.
    #[must_use]
    pub fn is_current(&self, key: &TimerKey, generation: u64) -> bool {
        self.timers
            .get(key)
            .is_some_and(|timer| timer.generation == generation)
    }

    /// Number of armed timers belonging to `id`.
    #[must_use]
    pub fn count_for(&self, id: AutomationId) -> usize {
        self.timers
            .keys()
            .filter(|key| key.automation_id == id)
            .count()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.timers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }
}

impl Drop for TimerRegistry {
    fn drop(&mut self) {
        self.cancel_all();
    }
}
