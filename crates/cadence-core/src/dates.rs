//! Calendar-day arithmetic.
//!
//! Durations are inclusive day counts: an item that starts and ends on the
//! same day lasts one day. There is no working-day calendar; weekends and
//! holidays count like any other day.

use chrono::{Days, NaiveDate};

/// Inclusive number of days between `start` and `due`.
///
/// May be zero or negative when `due` precedes `start`; callers that need a
/// usable duration go through [`clamp_duration`].
#[must_use]
pub fn duration_of(start: NaiveDate, due: NaiveDate) -> i64 {
    (due - start).num_days() + 1
}

/// Due date of an item starting on `start` that lasts `duration` days.
///
/// A non-positive duration is treated as one day so the result is never
/// before `start`.
#[must_use]
pub fn due_from_start(start: NaiveDate, duration: i64) -> NaiveDate {
    let offset = clamp_duration(duration) - 1;
    u64::try_from(offset)
        .ok()
        .and_then(|days| start.checked_add_days(Days::new(days)))
        .unwrap_or(NaiveDate::MAX)
}

/// The day after `date`, saturating at the end of the representable range.
#[must_use]
pub fn next_day(date: NaiveDate) -> NaiveDate {
    date.succ_opt().unwrap_or(date)
}

/// Clamp a duration to at least one day.
#[must_use]
pub fn clamp_duration(days: i64) -> i64 {
    days.max(1)
}

/// Earliest and latest date among the present values.
///
/// Returns `None` when every value is absent.
pub fn span_of<I>(dates: I) -> Option<(NaiveDate, NaiveDate)>
where
    I: IntoIterator<Item = Option<NaiveDate>>,
{
    dates.into_iter().flatten().fold(None, |acc, date| match acc {
        None => Some((date, date)),
        Some((min, max)) => Some((min.min(date), max.max(date))),
    })
}

/// The later of two optional dates; absent values are ignored.
#[must_use]
pub fn latest(a: Option<NaiveDate>, b: Option<NaiveDate>) -> Option<NaiveDate> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, b) => a.or(b),
    }
}
