//! Time and wall-clock helpers.
//!
//! Triggers and conditions are expressed in *local wall-clock* time, so the
//! engine works on [`NaiveDateTime`] values supplied by a clock port rather
//! than on UTC instants.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// An `hour:minute` pair on the 24-hour clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimeOfDay {
    pub hour: u8,
    pub minute: u8,
}

impl TimeOfDay {
    #[must_use]
    pub const fn new(hour: u8, minute: u8) -> Self {
        Self { hour, minute }
    }

    /// Check that the pair denotes a real time of day.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidTimeOfDay`] when `hour > 23` or `minute > 59`.
    pub fn validate(self) -> Result<(), ValidationError> {
        if self.hour > 23 || self.minute > 59 {
            return Err(ValidationError::InvalidTimeOfDay {
                hour: self.hour,
                minute: self.minute,
            });
        }
        Ok(())
    }

    /// The time at second zero, or `None` when out of range.
    #[must_use]
    pub fn to_naive_time(self) -> Option<NaiveTime> {
        NaiveTime::from_hms_opt(u32::from(self.hour), u32::from(self.minute), 0)
    }

    /// This time of day on `date`.
    #[must_use]
    pub fn on(self, date: NaiveDate) -> Option<NaiveDateTime> {
        self.to_naive_time().map(|time| date.and_time(time))
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// Day of the week, lowercase on the wire (`"monday"`, …).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl DayOfWeek {
    /// Weekday of a local date-time.
    #[must_use]
    pub fn of(at: NaiveDateTime) -> Self {
        at.weekday().into()
    }
}

impl From<Weekday> for DayOfWeek {
    fn from(value: Weekday) -> Self {
        match value {
            Weekday::Mon => Self::Monday,
            Weekday::Tue => Self::Tuesday,
            Weekday::Wed => Self::Wednesday,
            Weekday::Thu => Self::Thursday,
            Weekday::Fri => Self::Friday,
            Weekday::Sat => Self::Saturday,
            Weekday::Sun => Self::Sunday,
        }
    }
}

/// Optional weekday restriction attached to time triggers and conditions.
pub type DaySet = BTreeSet<DayOfWeek>;

/// Whether `day` passes an optional weekday restriction.
///
/// An absent or empty set places no restriction.
#[must_use]
pub fn day_allowed(days: Option<&DaySet>, day: DayOfWeek) -> bool {
    match days {
        Some(set) if !set.is_empty() => set.contains(&day),
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn should_reject_out_of_range_time_of_day() {
        assert!(TimeOfDay::new(24, 0).validate().is_err());
        assert!(TimeOfDay::new(12, 60).validate().is_err());
        assert!(TimeOfDay::new(23, 59).validate().is_ok());
    }

    #[test]
    fn should_place_time_of_day_on_date() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        assert_eq!(
            TimeOfDay::new(7, 30).on(date),
            Some(at(2024, 3, 4, 7, 30))
        );
    }

    #[test]
    fn should_display_time_of_day_zero_padded() {
        assert_eq!(TimeOfDay::new(8, 5).to_string(), "08:05");
    }

    #[test]
    fn should_map_weekday_of_date() {
        // 2024-03-04 is a Monday.
        assert_eq!(DayOfWeek::of(at(2024, 3, 4, 0, 0)), DayOfWeek::Monday);
        assert_eq!(DayOfWeek::of(at(2024, 3, 10, 0, 0)), DayOfWeek::Sunday);
    }

    #[test]
    fn should_deserialize_lowercase_weekdays() {
        let days: DaySet = serde_json::from_str(r#"["friday","monday"]"#).unwrap();
        assert!(days.contains(&DayOfWeek::Monday));
        assert!(days.contains(&DayOfWeek::Friday));
    }

    #[test]
    fn should_allow_any_day_when_set_is_absent_or_empty() {
        assert!(day_allowed(None, DayOfWeek::Sunday));
        assert!(day_allowed(Some(&DaySet::new()), DayOfWeek::Sunday));
    }

    #[test]
    fn should_only_allow_listed_days() {
        let days: DaySet = [DayOfWeek::Saturday, DayOfWeek::Sunday].into();
        assert!(day_allowed(Some(&days), DayOfWeek::Sunday));
        assert!(!day_allowed(Some(&days), DayOfWeek::Monday));
    }
}
