//! Condition evaluation: pure predicates over device state and local time.

use chrono::{NaiveDateTime, NaiveTime};

use dobby_domain::automation::{Condition, Operator};
use dobby_domain::time::{DayOfWeek, TimeOfDay, day_allowed};

use crate::ports::DeviceStateSource;

/// Evaluate all conditions (logical AND). Returns `true` if empty.
pub fn evaluate<D>(conditions: &[Condition], devices: &D, now: NaiveDateTime) -> bool
where
    D: DeviceStateSource + ?Sized,
{
    conditions
        .iter()
        .all(|condition| holds(condition, devices, now))
}

/// Evaluate a single condition.
pub fn holds<D>(condition: &Condition, devices: &D, now: NaiveDateTime) -> bool
where
    D: DeviceStateSource + ?Sized,
{
    match condition {
        Condition::Device {
            device_id,
            property,
            operator,
            value,
        } => devices
            .device_state(device_id)
            .and_then(|state| state.get(property).cloned())
            .is_some_and(|live| operator.apply(&live, value)),
        Condition::Time {
            operator,
            time,
            end_time,
            days,
        } => {
            if !day_allowed(days.as_ref(), DayOfWeek::of(now)) {
                return false;
            }
            let current = now.time();
            let Some(at) = time.to_naive_time() else {
                return false;
            };
            match (operator, end_time.and_then(TimeOfDay::to_naive_time)) {
                (Operator::Between, Some(end)) => within(current, at, end),
                (Operator::Between, None) => false,
                (other, _) => other.holds(&current, &at),
            }
        }
        Condition::State { .. } => true,
    }
}

/// Inclusive `start <= current <= end`; an inverted window never holds.
fn within(current: NaiveTime, start: NaiveTime, end: NaiveTime) -> bool {
    start <= current && current <= end
}
