//! Working-day arithmetic.

use chrono::{Datelike, Days, NaiveDate, Weekday};
use std::collections::HashSet;

/// Returns true for Monday through Friday.
#[must_use]
pub fn is_weekday(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Returns true for a weekday that is not a holiday.
#[must_use]
pub fn is_working_day(date: NaiveDate, holidays: &HashSet<NaiveDate>) -> bool {
    is_weekday(date) && !holidays.contains(&date)
}

/// The result of walking forward over working days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Horizon {
    /// The walk cursor once the required count was reached: the day after
    /// the last counted working day. Equals the start when nothing was
    /// counted.
    pub end: NaiveDate,
    /// Number of working days counted.
    pub working_days: u64,
}

/// Walks forward from `start` until `working_days` working days have been
/// counted.
#[must_use]
pub fn working_day_horizon(
    start: NaiveDate,
    working_days: u64,
    holidays: &HashSet<NaiveDate>,
) -> Horizon {
    let mut cursor = start;
    let mut counted = 0;
    while counted < working_days {
        if is_working_day(cursor, holidays) {
            counted += 1;
        }
        cursor = cursor + Days::new(1);
    }
    Horizon {
        end: cursor,
        working_days: counted,
    }
}

/// Usable days among the `length_days` calendar days starting at `start`.
#[must_use]
pub fn working_days_in_window(
    start: NaiveDate,
    length_days: u32,
    holidays: &HashSet<NaiveDate>,
) -> Vec<NaiveDate> {
    (0..u64::from(length_days))
        .map(|offset| start + Days::new(offset))
        .filter(|day| is_working_day(*day, holidays))
        .collect()
}
