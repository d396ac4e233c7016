//! Wall-clock access pinned to a fixed UTC offset.

use std::fmt::Debug;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, Offset, TimeZone, Utc};

/// Offset used when nothing else is configured: America/Guayaquil (UTC-5, no DST).
pub const DEFAULT_UTC_OFFSET_HOURS: i32 = -5;

/// Source of "now" for the scheduler.
pub trait Clock: Send + Sync + Debug {
    /// Current instant in the clock's timezone.
    fn now(&self) -> DateTime<FixedOffset>;

    /// Current calendar date in the clock's timezone.
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }

    /// Current time of day in the clock's timezone.
    fn time_of_day(&self) -> NaiveTime {
        self.now().time()
    }
}

/// Builds a fixed offset from whole hours, falling back to UTC when out of range.
pub fn offset_from_hours(hours: i32) -> FixedOffset {
    hours
        .checked_mul(3600)
        .and_then(FixedOffset::east_opt)
        .unwrap_or_else(|| {
            tracing::warn!("UTC offset of {} hours is out of range, using UTC", hours);
            Utc.fix()
        })
}

/// The real clock.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    offset: FixedOffset,
}

impl SystemClock {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    pub fn with_offset_hours(hours: i32) -> Self {
        Self::new(offset_from_hours(hours))
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::with_offset_hours(DEFAULT_UTC_OFFSET_HOURS)
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&self.offset)
    }
}

/// A clock frozen at a single instant. Used to simulate "today".
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    now: DateTime<FixedOffset>,
}

impl FixedClock {
    pub fn new(now: DateTime<FixedOffset>) -> Self {
        Self { now }
    }

    /// Noon of `date` at the default offset.
    pub fn at_date(date: NaiveDate) -> Self {
        let offset = offset_from_hours(DEFAULT_UTC_OFFSET_HOURS);
        let noon = date.and_time(NaiveTime::from_hms_opt(12, 0, 0).unwrap_or(NaiveTime::MIN));
        let now = offset
            .from_local_datetime(&noon)
            .single()
            .unwrap_or_else(|| offset.from_utc_datetime(&noon));
        Self { now }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.now
    }
}
