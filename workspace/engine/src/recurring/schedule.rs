use chrono::{Datelike, Days, Months, NaiveDate};
use common::dates::clamped_date;
use model::entities::recurring_transaction::RecurrenceFrequency;

/// Date of the occurrence that follows `from`.
///
/// Monthly schedules re-apply `day_of_month` (or the day of `from` when no
/// anchor is set) to the following month, clamped to its last day. Yearly
/// schedules move Feb 29 to Feb 28. Returns `None` past the calendar range.
pub fn next_occurrence(
    frequency: RecurrenceFrequency,
    from: NaiveDate,
    day_of_month: Option<i32>,
) -> Option<NaiveDate> {
    match frequency {
        RecurrenceFrequency::Daily => from.checked_add_days(Days::new(1)),
        RecurrenceFrequency::Weekly => from.checked_add_days(Days::new(7)),
        RecurrenceFrequency::Biweekly => from.checked_add_days(Days::new(15)),
        RecurrenceFrequency::Monthly => {
            let target = from.checked_add_months(Months::new(1))?;
            let day = day_of_month
                .map(|d| d.clamp(1, 31) as u32)
                .unwrap_or_else(|| from.day());
            clamped_date(target.year(), target.month(), day)
        }
        RecurrenceFrequency::Yearly => from.checked_add_months(Months::new(12)),
    }
}
