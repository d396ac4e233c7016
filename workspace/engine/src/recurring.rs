//! Recurring transactions: schedule arithmetic, the per-tick engine and
//! the operations that create, pause and remove configurations.

pub mod lifecycle;
pub mod schedule;

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use chrono::NaiveDate;
use common::dates::format_date;
use common::{Clock, PushMessage, TickReport};
use model::entities::{category, recurring_transaction, transaction};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use tracing::{debug, error, info, instrument, warn};

use crate::audience::{UserAudience, load_audiences};
use crate::error::{EngineError, Result};
use crate::options::EngineOptions;
use crate::push::PushGateway;
use crate::recorder::{NotificationLinks, NotificationRecorder, already_notified};

pub use schedule::next_occurrence;

/// Sends advance notices for upcoming occurrences and materializes the ones due today.
#[derive(Debug, Clone)]
pub struct RecurringTransactionEngine {
    push: Arc<dyn PushGateway>,
    clock: Arc<dyn Clock>,
    recorder: NotificationRecorder,
    options: EngineOptions,
}

impl RecurringTransactionEngine {
    pub fn new(push: Arc<dyn PushGateway>, clock: Arc<dyn Clock>, options: EngineOptions) -> Self {
        Self {
            push,
            recorder: NotificationRecorder::new(clock.clone()),
            clock,
            options,
        }
    }

    #[instrument(skip(self, db))]
    pub async fn run(&self, db: &DatabaseConnection) -> Result<TickReport> {
        let today = self.clock.today();
        let audiences = load_audiences(db).await?;
        let configs = load_active_configs(db).await?;
        let mut report = TickReport::default();

        info!(
            "Processing {} active recurring transactions on {}",
            configs.len(),
            today
        );

        let owners: BTreeSet<i32> = configs.iter().map(|c| c.user_id).collect();
        report.users_scanned = owners.len() as u32;

        for owned in configs {
            let config_id = owned.config.id;
            let audience = audiences.get(&owned.user_id);
            match self.process(db, owned, audience).await {
                Ok(config_report) => report.absorb(&config_report),
                Err(e) => {
                    error!("Recurring transaction {} failed: {}", config_id, e);
                    report.failures += 1;
                }
            }
        }

        info!(
            "Recurring engine materialized {} transactions, recorded {} notifications, deactivated {} configs",
            report.transactions_materialized,
            report.notifications_recorded,
            report.configs_deactivated
        );
        Ok(report)
    }

    async fn process(
        &self,
        db: &DatabaseConnection,
        owned: OwnedConfig,
        audience: Option<&UserAudience>,
    ) -> Result<TickReport> {
        let today = self.clock.today();
        let policy = self.options.missed_occurrences;
        let OwnedConfig {
            user_id,
            mut config,
            template,
        } = owned;
        let mut report = TickReport::default();

        if is_past_end(&config, config.next_execution_date) {
            info!(
                "Recurring transaction {} ended on {:?}, deactivating",
                config.id, config.end_date
            );
            deactivate(db, config).await?;
            report.configs_deactivated += 1;
            return Ok(report);
        }

        if let Some(audience) = audience {
            if policy.notice_due(config.next_execution_date, audience.lead_days, today) {
                self.notify(db, audience, &config, &template, &mut report).await?;
            }
        }

        while config.is_active && policy.occurrence_due(config.next_execution_date, today) {
            config = materialize(db, config, &template).await?;
            report.transactions_materialized += 1;
            if !config.is_active {
                info!("Recurring transaction {} reached its end date", config.id);
                report.configs_deactivated += 1;
            }
        }

        debug!(
            "Recurring transaction {} of user {} next runs on {}",
            config.id, user_id, config.next_execution_date
        );
        Ok(report)
    }

    async fn notify(
        &self,
        db: &DatabaseConnection,
        audience: &UserAudience,
        config: &recurring_transaction::Model,
        template: &transaction::Model,
        report: &mut TickReport,
    ) -> Result<()> {
        let links = NotificationLinks::occurrence(config.id, config.next_execution_date);
        if already_notified(db, audience.user_id, &links).await? {
            debug!(
                "Occurrence {} of recurring transaction {} already notified",
                config.next_execution_date, config.id
            );
            report.notifications_skipped += 1;
            return Ok(());
        }

        let message = occurrence_message(template, config.next_execution_date)
            .with_icon(&self.options.icon);
        self.recorder
            .record(db, audience.user_id, &message, links)
            .await?;
        report.notifications_recorded += 1;

        let outcome = audience.deliver(self.push.as_ref(), &message).await;
        report.pushes_delivered += outcome.delivered;
        report.pushes_failed += outcome.failed;
        Ok(())
    }
}

pub fn occurrence_message(template: &transaction::Model, scheduled: NaiveDate) -> PushMessage {
    PushMessage::new(
        format!("Upcoming recurring transaction: {}", template.name),
        format!(
            "{:.2} will be registered on {}",
            template.amount,
            format_date(scheduled)
        ),
    )
}

/// Description carried by a transaction generated from a template.
pub fn generated_description(template: &transaction::Model, config_id: i32) -> String {
    let marker = format!("[auto-generated from recurring transaction #{config_id}]");
    match template.description.as_deref().map(str::trim) {
        Some(description) if !description.is_empty() => format!("{description} {marker}"),
        _ => marker,
    }
}

struct OwnedConfig {
    user_id: i32,
    config: recurring_transaction::Model,
    template: transaction::Model,
}

async fn load_active_configs(db: &DatabaseConnection) -> Result<Vec<OwnedConfig>> {
    let rows = recurring_transaction::Entity::find()
        .filter(recurring_transaction::Column::IsActive.eq(true))
        .find_also_related(transaction::Entity)
        .order_by_asc(recurring_transaction::Column::Id)
        .all(db)
        .await?;

    let category_ids: BTreeSet<i32> = rows
        .iter()
        .filter_map(|(_, template)| template.as_ref().map(|t| t.category_id))
        .collect();
    let owners: HashMap<i32, i32> = category::Entity::find()
        .filter(category::Column::Id.is_in(category_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|c| (c.id, c.user_id))
        .collect();

    let mut configs = Vec::with_capacity(rows.len());
    for (config, template) in rows {
        let Some(template) = template else {
            warn!("Recurring transaction {} has no template, skipping", config.id);
            continue;
        };
        let Some(&user_id) = owners.get(&template.category_id) else {
            warn!(
                "Template {} of recurring transaction {} has no category owner, skipping",
                template.id, config.id
            );
            continue;
        };
        configs.push(OwnedConfig {
            user_id,
            config,
            template,
        });
    }

    Ok(configs)
}

fn is_past_end(config: &recurring_transaction::Model, date: NaiveDate) -> bool {
    config.end_date.is_some_and(|end| date > end)
}

async fn deactivate(
    db: &DatabaseConnection,
    config: recurring_transaction::Model,
) -> Result<recurring_transaction::Model> {
    let mut active: recurring_transaction::ActiveModel = config.into();
    active.is_active = Set(false);
    Ok(active.update(db).await?)
}

/// Inserts the occurrence due on `next_execution_date` and advances the
/// configuration, both in one database transaction.
async fn materialize(
    db: &DatabaseConnection,
    config: recurring_transaction::Model,
    template: &transaction::Model,
) -> Result<recurring_transaction::Model> {
    let scheduled = config.next_execution_date;
    let next = next_occurrence(config.frequency, scheduled, config.day_of_month).ok_or_else(|| {
        EngineError::Validation(format!(
            "no occurrence after {} for recurring transaction {}",
            scheduled, config.id
        ))
    })?;

    let txn = db.begin().await?;

    let generated = transaction::ActiveModel {
        category_id: Set(template.category_id),
        name: Set(template.name.clone()),
        description: Set(Some(generated_description(template, config.id))),
        amount: Set(template.amount),
        date: Set(scheduled),
        time: Set(template.time),
        is_recurring: Set(false),
        receipt_key: Set(None),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let still_active = !is_past_end(&config, next);
    let generated_count = config.generated_transactions + 1;
    let mut active: recurring_transaction::ActiveModel = config.into();
    active.last_executed = Set(Some(scheduled));
    active.next_execution_date = Set(next);
    active.generated_transactions = Set(generated_count);
    active.is_active = Set(still_active);
    let updated = active.update(&txn).await?;

    txn.commit().await?;

    debug!(
        "Materialized transaction {} for {} from recurring transaction {}",
        generated.id, scheduled, updated.id
    );
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::MissedOccurrencePolicy;
    use crate::testing::*;
    use model::entities::notification;
    use rust_decimal::Decimal;
    use sea_orm::{ConnectionTrait, PaginatorTrait};
    use std::str::FromStr;

    fn engine(push: &Arc<RecordingPushGateway>, year: i32, month: u32, day: u32) -> RecurringTransactionEngine {
        RecurringTransactionEngine::new(push.clone(), clock_at(year, month, day), EngineOptions::default())
    }

    async fn generated(db: &DatabaseConnection, template: &transaction::Model) -> Vec<transaction::Model> {
        transaction::Entity::find()
            .filter(transaction::Column::Id.ne(template.id))
            .order_by_asc(transaction::Column::Date)
            .all(db)
            .await
            .unwrap()
    }

    async fn reload(db: &DatabaseConnection, config: &recurring_transaction::Model) -> recurring_transaction::Model {
        recurring_transaction::Entity::find_by_id(config.id)
            .one(db)
            .await
            .unwrap()
            .unwrap()
    }

    #[tokio::test]
    async fn test_materializes_once_per_occurrence() {
        let db = setup_db().await;
        let ana = new_user(&db, "ana").await;
        let category = new_category(&db, &ana).await;
        let rent = new_transaction(&db, &category, "Rent", "-450", date(2024, 1, 31)).await;
        let config = new_recurring(&db, &rent, RecurrenceFrequency::Monthly, date(2024, 2, 29), None).await;
        set_day_of_month(&db, &config, 31).await;

        let push = Arc::new(RecordingPushGateway::default());
        let first = engine(&push, 2024, 2, 29).run(&db).await.unwrap();
        let second = engine(&push, 2024, 2, 29).run(&db).await.unwrap();

        assert_eq!(first.transactions_materialized, 1);
        assert_eq!(second.transactions_materialized, 0);

        let rows = generated(&db, &rent).await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].date, date(2024, 2, 29));
        assert_eq!(rows[0].name, "Rent");
        assert_eq!(rows[0].amount, Decimal::from_str("-450").unwrap());
        assert_eq!(rows[0].category_id, category.id);
        assert_eq!(rows[0].time, rent.time);
        assert!(!rows[0].is_recurring);
        assert!(
            rows[0]
                .description
                .as_deref()
                .unwrap()
                .contains(&format!("recurring transaction #{}", config.id))
        );

        let advanced = reload(&db, &config).await;
        assert_eq!(advanced.next_execution_date, date(2024, 3, 31));
        assert_eq!(advanced.last_executed, Some(date(2024, 2, 29)));
        assert_eq!(advanced.generated_transactions, 1);
        assert!(advanced.is_active);
    }

    #[tokio::test]
    async fn test_materializes_without_devices() {
        let db = setup_db().await;
        let ana = new_user(&db, "ana").await;
        let category = new_category(&db, &ana).await;
        let gym = new_transaction(&db, &category, "Gym", "-30", date(2024, 5, 1)).await;
        new_recurring(&db, &gym, RecurrenceFrequency::Weekly, date(2024, 5, 8), None).await;

        let push = Arc::new(RecordingPushGateway::default());
        let report = engine(&push, 2024, 5, 8).run(&db).await.unwrap();

        assert_eq!(report.users_scanned, 1);
        assert_eq!(report.transactions_materialized, 1);
        assert_eq!(report.notifications_recorded, 0);
        assert!(push.sent().is_empty());
    }

    #[tokio::test]
    async fn test_notice_uses_lead_time_and_deduplicates() {
        let db = setup_db().await;
        let ana = new_user(&db, "ana").await;
        new_device_with_preference(&db, &ana, "phone", Some(2)).await;
        let category = new_category(&db, &ana).await;
        let rent = new_transaction(&db, &category, "Rent", "-450", date(2024, 5, 1)).await;
        let config = new_recurring(&db, &rent, RecurrenceFrequency::Monthly, date(2024, 6, 1), None).await;

        let push = Arc::new(RecordingPushGateway::default());
        let first = engine(&push, 2024, 5, 30).run(&db).await.unwrap();
        let second = engine(&push, 2024, 5, 30).run(&db).await.unwrap();

        assert_eq!(first.notifications_recorded, 1);
        assert_eq!(first.transactions_materialized, 0);
        assert_eq!(second.notifications_recorded, 0);
        assert_eq!(second.notifications_skipped, 1);

        let saved = notification::Entity::find().all(&db).await.unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].recurring_transaction_id, Some(config.id));
        assert_eq!(saved[0].occurrence_date, Some(date(2024, 6, 1)));
        assert_eq!(saved[0].title, "Upcoming recurring transaction: Rent");
        assert_eq!(saved[0].message, "-450.00 will be registered on 2024-06-01");
        assert_eq!(push.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_skip_policy_drops_missed_occurrence() {
        let db = setup_db().await;
        let ana = new_user(&db, "ana").await;
        let category = new_category(&db, &ana).await;
        let daily = new_transaction(&db, &category, "Coffee", "-2", date(2024, 5, 1)).await;
        let config = new_recurring(&db, &daily, RecurrenceFrequency::Daily, date(2024, 5, 2), None).await;

        let push = Arc::new(RecordingPushGateway::default());
        let report = engine(&push, 2024, 5, 5).run(&db).await.unwrap();

        assert_eq!(report.transactions_materialized, 0);
        assert_eq!(reload(&db, &config).await.next_execution_date, date(2024, 5, 2));
    }

    #[tokio::test]
    async fn test_catch_up_policy_fills_missed_occurrences() {
        let db = setup_db().await;
        let ana = new_user(&db, "ana").await;
        let category = new_category(&db, &ana).await;
        let daily = new_transaction(&db, &category, "Coffee", "-2", date(2024, 5, 1)).await;
        let config = new_recurring(&db, &daily, RecurrenceFrequency::Daily, date(2024, 5, 2), None).await;

        let push = Arc::new(RecordingPushGateway::default());
        let options = EngineOptions {
            missed_occurrences: MissedOccurrencePolicy::CatchUp,
            ..Default::default()
        };
        let engine = RecurringTransactionEngine::new(push.clone(), clock_at(2024, 5, 5), options);
        let report = engine.run(&db).await.unwrap();

        assert_eq!(report.transactions_materialized, 4);
        let dates: Vec<_> = generated(&db, &daily).await.iter().map(|t| t.date).collect();
        assert_eq!(
            dates,
            vec![date(2024, 5, 2), date(2024, 5, 3), date(2024, 5, 4), date(2024, 5, 5)]
        );

        let advanced = reload(&db, &config).await;
        assert_eq!(advanced.next_execution_date, date(2024, 5, 6));
        assert_eq!(advanced.generated_transactions, 4);
    }

    #[tokio::test]
    async fn test_end_date_deactivates() {
        let db = setup_db().await;
        let ana = new_user(&db, "ana").await;
        let category = new_category(&db, &ana).await;
        let plan = new_transaction(&db, &category, "Plan", "-20", date(2024, 1, 1)).await;
        let last = new_recurring(&db, &plan, RecurrenceFrequency::Weekly, date(2024, 3, 1), Some(date(2024, 3, 5))).await;

        let push = Arc::new(RecordingPushGateway::default());
        let report = engine(&push, 2024, 3, 1).run(&db).await.unwrap();
        assert_eq!(report.transactions_materialized, 1);
        assert_eq!(report.configs_deactivated, 1);

        let finished = reload(&db, &last).await;
        assert!(!finished.is_active);
        assert_eq!(finished.next_execution_date, date(2024, 3, 8));

        let report = engine(&push, 2024, 3, 8).run(&db).await.unwrap();
        assert_eq!(report.transactions_materialized, 0);
    }

    #[tokio::test]
    async fn test_expired_config_is_deactivated_without_firing() {
        let db = setup_db().await;
        let ana = new_user(&db, "ana").await;
        let category = new_category(&db, &ana).await;
        let plan = new_transaction(&db, &category, "Plan", "-20", date(2024, 1, 1)).await;
        let expired = new_recurring(&db, &plan, RecurrenceFrequency::Daily, date(2024, 3, 10), Some(date(2024, 3, 1))).await;

        let push = Arc::new(RecordingPushGateway::default());
        let report = engine(&push, 2024, 3, 10).run(&db).await.unwrap();

        assert_eq!(report.transactions_materialized, 0);
        assert_eq!(report.configs_deactivated, 1);
        assert!(!reload(&db, &expired).await.is_active);
        assert!(generated(&db, &plan).await.is_empty());
    }

    #[tokio::test]
    async fn test_paused_config_is_ignored() {
        let db = setup_db().await;
        let ana = new_user(&db, "ana").await;
        new_device_with_preference(&db, &ana, "phone", Some(0)).await;
        let category = new_category(&db, &ana).await;
        let plan = new_transaction(&db, &category, "Plan", "-20", date(2024, 1, 1)).await;
        let config = new_recurring(&db, &plan, RecurrenceFrequency::Daily, date(2024, 3, 10), None).await;
        lifecycle::set_active(&db, ana.id, config.id, false).await.unwrap();

        let push = Arc::new(RecordingPushGateway::default());
        let report = engine(&push, 2024, 3, 10).run(&db).await.unwrap();

        assert_eq!(report.transactions_materialized, 0);
        assert_eq!(notification::Entity::find().count(&db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_failed_config_is_rolled_back_and_others_still_fire() {
        let db = setup_db().await;
        let ana = new_user(&db, "ana").await;
        let category = new_category(&db, &ana).await;
        let broken_template = new_transaction(&db, &category, "Broken", "-10", date(2024, 5, 1)).await;
        let broken = new_recurring(&db, &broken_template, RecurrenceFrequency::Daily, date(2024, 5, 8), None).await;
        let gym = new_transaction(&db, &category, "Gym", "-30", date(2024, 5, 1)).await;
        let healthy = new_recurring(&db, &gym, RecurrenceFrequency::Weekly, date(2024, 5, 8), None).await;

        db.execute_unprepared(&format!(
            "CREATE TRIGGER reject_advance BEFORE UPDATE ON recurring_transactions \
             WHEN OLD.id = {} BEGIN SELECT RAISE(ABORT, 'rejected'); END;",
            broken.id
        ))
        .await
        .unwrap();

        let push = Arc::new(RecordingPushGateway::default());
        let report = engine(&push, 2024, 5, 8).run(&db).await.unwrap();

        assert_eq!(report.failures, 1);
        assert_eq!(report.transactions_materialized, 1);

        let unchanged = reload(&db, &broken).await;
        assert_eq!(unchanged.next_execution_date, date(2024, 5, 8));
        assert_eq!(unchanged.generated_transactions, 0);
        assert_eq!(unchanged.last_executed, None);

        let orphans = transaction::Entity::find()
            .filter(transaction::Column::Name.eq("Broken"))
            .count(&db)
            .await
            .unwrap();
        assert_eq!(orphans, 1);

        let advanced = reload(&db, &healthy).await;
        assert_eq!(advanced.next_execution_date, date(2024, 5, 15));
        assert_eq!(generated(&db, &gym).await.iter().filter(|t| t.name == "Gym").count(), 1);
    }

    #[tokio::test]
    async fn test_zero_lead_time_notifies_and_fires_on_same_tick() {
        let db = setup_db().await;
        let ana = new_user(&db, "ana").await;
        new_device_with_preference(&db, &ana, "phone", Some(0)).await;
        let category = new_category(&db, &ana).await;
        let rent = new_transaction(&db, &category, "Rent", "-450", date(2024, 5, 1)).await;
        let config = new_recurring(&db, &rent, RecurrenceFrequency::Monthly, date(2024, 6, 1), None).await;

        let push = Arc::new(RecordingPushGateway::default());
        let report = engine(&push, 2024, 6, 1).run(&db).await.unwrap();

        assert_eq!(report.notifications_recorded, 1);
        assert_eq!(report.pushes_delivered, 1);
        assert_eq!(report.transactions_materialized, 1);
        assert_eq!(push.sent().len(), 1);

        let saved = notification::Entity::find().all(&db).await.unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].occurrence_date, Some(date(2024, 6, 1)));
        assert_eq!(saved[0].message, "-450.00 will be registered on 2024-06-01");

        let rows = generated(&db, &rent).await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].date, date(2024, 6, 1));
        assert_eq!(reload(&db, &config).await.next_execution_date, date(2024, 7, 1));
    }

    #[test]
    fn test_generated_description_keeps_template_text() {
        let template = transaction::Model {
            id: 1,
            category_id: 1,
            name: "Rent".to_string(),
            description: Some("Flat".to_string()),
            amount: Decimal::ONE,
            date: date(2024, 1, 1),
            time: chrono::NaiveTime::MIN,
            is_recurring: true,
            receipt_key: None,
        };
        assert_eq!(
            generated_description(&template, 7),
            "Flat [auto-generated from recurring transaction #7]"
        );

        let bare = transaction::Model {
            description: None,
            ..template
        };
        assert_eq!(
            generated_description(&bare, 7),
            "[auto-generated from recurring transaction #7]"
        );
    }
}
