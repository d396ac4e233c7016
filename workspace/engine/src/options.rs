use chrono::NaiveDate;
use common::DEFAULT_PUSH_ICON;
use common::dates::notify_date;
use serde::{Deserialize, Serialize};

/// What a tick does about occurrences whose day passed while nothing ran.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissedOccurrencePolicy {
    /// Only act on exact date matches. Occurrences missed during downtime are dropped.
    #[default]
    Skip,
    /// Materialize every occurrence up to today and send notices still ahead of their due date.
    CatchUp,
}

impl MissedOccurrencePolicy {
    /// Whether advance notice for something due on `due_date` goes out `today`.
    pub fn notice_due(self, due_date: NaiveDate, lead_days: i32, today: NaiveDate) -> bool {
        let notify_on = notify_date(due_date, lead_days);
        match self {
            MissedOccurrencePolicy::Skip => notify_on == today,
            MissedOccurrencePolicy::CatchUp => notify_on <= today && today <= due_date,
        }
    }

    /// Whether an occurrence scheduled for `scheduled` fires `today`.
    pub fn occurrence_due(self, scheduled: NaiveDate, today: NaiveDate) -> bool {
        match self {
            MissedOccurrencePolicy::Skip => scheduled == today,
            MissedOccurrencePolicy::CatchUp => scheduled <= today,
        }
    }
}

/// Settings shared by both scheduler entry points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineOptions {
    pub missed_occurrences: MissedOccurrencePolicy,
    /// Icon sent along with every push message.
    pub icon: String,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            missed_occurrences: MissedOccurrencePolicy::Skip,
            icon: DEFAULT_PUSH_ICON.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_skip_requires_exact_notify_day() {
        let policy = MissedOccurrencePolicy::Skip;
        let due = date(2024, 5, 10);
        assert!(policy.notice_due(due, 3, date(2024, 5, 7)));
        assert!(!policy.notice_due(due, 3, date(2024, 5, 8)));
        assert!(!policy.notice_due(due, 3, date(2024, 5, 6)));
    }

    #[test]
    fn test_catch_up_notices_until_due_date() {
        let policy = MissedOccurrencePolicy::CatchUp;
        let due = date(2024, 5, 10);
        assert!(!policy.notice_due(due, 3, date(2024, 5, 6)));
        assert!(policy.notice_due(due, 3, date(2024, 5, 7)));
        assert!(policy.notice_due(due, 3, date(2024, 5, 10)));
        assert!(!policy.notice_due(due, 3, date(2024, 5, 11)));
    }

    #[test]
    fn test_occurrence_due() {
        let scheduled = date(2024, 3, 1);
        assert!(MissedOccurrencePolicy::Skip.occurrence_due(scheduled, scheduled));
        assert!(!MissedOccurrencePolicy::Skip.occurrence_due(scheduled, date(2024, 3, 2)));
        assert!(MissedOccurrencePolicy::CatchUp.occurrence_due(scheduled, date(2024, 3, 2)));
        assert!(!MissedOccurrencePolicy::CatchUp.occurrence_due(scheduled, date(2024, 2, 29)));
    }

    #[test]
    fn test_policy_deserializes_snake_case() {
        let policy: MissedOccurrencePolicy = serde_json::from_str("\"catch_up\"").unwrap();
        assert_eq!(policy, MissedOccurrencePolicy::CatchUp);
        let options: EngineOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(options, EngineOptions::default());
    }
}
