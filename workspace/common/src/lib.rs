//! Types and helpers shared by the scheduler, the HTTP layer and the CLI.

pub mod clock;
pub mod dates;

pub use clock::{Clock, FixedClock, SystemClock};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Icon attached to push messages when nothing else is configured.
pub const DEFAULT_PUSH_ICON: &str = "/icons/icon-192x192.png";

/// A message delivered to a device and recorded as a notification.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct PushMessage {
    pub title: String,
    pub body: String,
    pub icon: String,
}

impl PushMessage {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            icon: DEFAULT_PUSH_ICON.to_string(),
        }
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = icon.into();
        self
    }
}

/// Outcome of one scheduler tick.
///
/// Counters only ever grow while a tick runs; `failures` counts items that
/// were logged and skipped.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct TickReport {
    /// Users the tick looked at.
    pub users_scanned: u32,
    pub notifications_recorded: u32,
    /// Notices skipped because one was already recorded for the occurrence.
    pub notifications_skipped: u32,
    pub pushes_delivered: u32,
    pub pushes_failed: u32,
    pub transactions_materialized: u32,
    /// Recurring configurations switched off because they ran past their end date.
    pub configs_deactivated: u32,
    pub failures: u32,
}

impl TickReport {
    /// Adds every counter of `other` into `self`.
    pub fn absorb(&mut self, other: &TickReport) {
        self.users_scanned += other.users_scanned;
        self.notifications_recorded += other.notifications_recorded;
        self.notifications_skipped += other.notifications_skipped;
        self.pushes_delivered += other.pushes_delivered;
        self.pushes_failed += other.pushes_failed;
        self.transactions_materialized += other.transactions_materialized;
        self.configs_deactivated += other.configs_deactivated;
        self.failures += other.failures;
    }
}
