//! Scheduling engine: debt due-date notices, recurring transactions and
//! the service operations around them.

pub mod audience;
pub mod debt_notifier;
pub mod debts;
pub mod devices;
pub mod error;
pub mod notifications;
pub mod options;
pub mod push;
pub mod recorder;
pub mod recurring;

#[cfg(test)]
pub(crate) mod testing;

pub use debt_notifier::DebtDueDateNotifier;
pub use error::{EngineError, Result};
pub use options::{EngineOptions, MissedOccurrencePolicy};
pub use push::{LogPushGateway, PushError, PushGateway, RelayPushGateway, Subscription};
pub use recorder::{NotificationLinks, NotificationRecorder};
pub use recurring::RecurringTransactionEngine;
