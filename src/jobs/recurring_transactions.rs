use async_trait::async_trait;
use engine::RecurringTransactionEngine;
use sea_orm::DatabaseConnection;
use tracing::info;

use crate::jobs::{Job, JobError};

pub struct RecurringTransactionsJob {
    db: DatabaseConnection,
    engine: RecurringTransactionEngine,
}

impl RecurringTransactionsJob {
    pub fn new(db: DatabaseConnection, engine: RecurringTransactionEngine) -> Self {
        Self { db, engine }
    }
}

#[async_trait]
impl Job for RecurringTransactionsJob {
    fn name(&self) -> &'static str {
        "Recurring Transactions"
    }

    async fn execute(&mut self) -> Result<(), JobError> {
        let report = self.engine.run(&self.db).await?;
        info!(
            "Recurring transactions: {} materialized, {} notices, {} deactivated, {} failures",
            report.transactions_materialized,
            report.notifications_recorded,
            report.configs_deactivated,
            report.failures
        );
        Ok(())
    }
}
