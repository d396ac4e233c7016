mod debt_notifications;
mod recurring_transactions;

pub use debt_notifications::DebtNotificationsJob;
pub use recurring_transactions::RecurringTransactionsJob;

use async_trait::async_trait;
use engine::EngineError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum JobError {
    #[error("JobError: {0}")]
    Engine(#[from] EngineError),
}

/// A unit of scheduled work.
#[async_trait]
pub trait Job: Send {
    fn name(&self) -> &'static str;
    async fn execute(&mut self) -> Result<(), JobError>;
}
