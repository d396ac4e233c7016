use std::time::Duration;

use anyhow::Result;
use common::TickReport;
use engine::{DebtDueDateNotifier, RecurringTransactionEngine};
use migration::{Migrator, MigratorTrait};
use tracing::{debug, error, info, trace};

use crate::cli::Trigger;
use crate::config::{Settings, initialize_app_state};
use crate::jobs::{DebtNotificationsJob, RecurringTransactionsJob};
use crate::runner::JobRunner;
use crate::schemas::AppState;

/// Registers both triggers with their configured frequencies.
pub fn build_runner(settings: &Settings, state: &AppState) -> JobRunner {
    let scheduler = &settings.scheduler;
    let mut runner = JobRunner::new(Duration::from_secs(scheduler.update_frequency_secs));

    runner.register(
        Box::new(RecurringTransactionsJob::new(
            state.db.clone(),
            RecurringTransactionEngine::new(
                state.push.clone(),
                state.clock.clone(),
                state.options.clone(),
            ),
        )),
        Duration::from_secs(scheduler.recurring_transactions_frequency_secs),
    );
    runner.register(
        Box::new(DebtNotificationsJob::new(
            state.db.clone(),
            DebtDueDateNotifier::new(state.push.clone(), state.clock.clone(), state.options.clone()),
        )),
        Duration::from_secs(scheduler.debt_notifications_frequency_secs),
    );

    runner
}

pub async fn run_scheduler(settings: &Settings) -> Result<()> {
    trace!("Entering run_scheduler function");
    info!("Starting scheduler without web server");

    let state = initialize_app_state(settings).await?;
    Migrator::up(&state.db, None).await?;
    debug!("Database migrations applied");

    let mut runner = build_runner(settings, &state);
    runner.start().await
}

pub async fn tick(settings: &Settings, trigger: Trigger) -> Result<()> {
    trace!("Entering tick function");
    info!("Running {:?} once", trigger);

    let state = initialize_app_state(settings).await?;
    let result = match trigger {
        Trigger::DebtNotifications => {
            DebtDueDateNotifier::new(state.push.clone(), state.clock.clone(), state.options.clone())
                .run(&state.db)
                .await
        }
        Trigger::RecurringTransactions => {
            RecurringTransactionEngine::new(
                state.push.clone(),
                state.clock.clone(),
                state.options.clone(),
            )
            .run(&state.db)
            .await
        }
    };

    let report: TickReport = match result {
        Ok(report) => report,
        Err(e) => {
            error!("{:?} failed: {}", trigger, e);
            return Err(e.into());
        }
    };

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
