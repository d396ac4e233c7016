//! Calendar helpers shared by the scheduler.
//!
//! All schedule comparisons in the backend are made on calendar dates in
//! the configured timezone, never on instants. These helpers are pure and
//! never panic: overflow saturates at the chrono date range.

use chrono::{Datelike, Days, Months, NaiveDate, NaiveTime};

/// Format used for every stored and displayed calendar date.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Format used for every stored and displayed time of day.
pub const TIME_FORMAT: &str = "%H:%M:%S";

/// Formats a date as `YYYY-MM-DD`.
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Formats a time as `HH:mm:ss`.
pub fn format_time(time: NaiveTime) -> String {
    time.format(TIME_FORMAT).to_string()
}

/// Parses a `YYYY-MM-DD` string.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).ok()
}

/// Adds `days` (which may be negative) to `date`.
pub fn add_days(date: NaiveDate, days: i64) -> NaiveDate {
    let magnitude = Days::new(days.unsigned_abs());
    let shifted = if days >= 0 {
        date.checked_add_days(magnitude)
    } else {
        date.checked_sub_days(magnitude)
    };
    shifted.unwrap_or(if days >= 0 { NaiveDate::MAX } else { NaiveDate::MIN })
}

/// First day of the month containing `date`.
pub fn start_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Last day of the month containing `date`.
pub fn end_of_month(date: NaiveDate) -> NaiveDate {
    last_day_of_month(date.year(), date.month())
        .and_then(|day| date.with_day(day))
        .unwrap_or(date)
}

/// Number of days in the given month, `None` for an invalid month.
pub fn last_day_of_month(year: i32, month: u32) -> Option<u32> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = first.checked_add_months(Months::new(1))?;
    Some(next.pred_opt()?.day())
}

/// Builds `year-month-day`, clamping `day` to the last day of the month.
pub fn clamped_date(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    let last = last_day_of_month(year, month)?;
    NaiveDate::from_ymd_opt(year, month, day.clamp(1, last))
}

/// The day advance notice should be given for an event due on `due_date`.
///
/// A negative lead time is treated as zero.
pub fn notify_date(due_date: NaiveDate, days_before_notify: i32) -> NaiveDate {
    add_days(due_date, -i64::from(days_before_notify.max(0)))
}
