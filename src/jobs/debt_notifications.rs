use async_trait::async_trait;
use engine::DebtDueDateNotifier;
use sea_orm::DatabaseConnection;
use tracing::info;

use crate::jobs::{Job, JobError};

pub struct DebtNotificationsJob {
    db: DatabaseConnection,
    notifier: DebtDueDateNotifier,
}

impl DebtNotificationsJob {
    pub fn new(db: DatabaseConnection, notifier: DebtDueDateNotifier) -> Self {
        Self { db, notifier }
    }
}

#[async_trait]
impl Job for DebtNotificationsJob {
    fn name(&self) -> &'static str {
        "Debt Notifications"
    }

    async fn execute(&mut self) -> Result<(), JobError> {
        let report = self.notifier.run(&self.db).await?;
        info!(
            "Debt notifications: {} recorded, {} already sent, {} failures",
            report.notifications_recorded, report.notifications_skipped, report.failures
        );
        Ok(())
    }
}
