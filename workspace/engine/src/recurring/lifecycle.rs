//! Creating, pausing and removing recurring configurations.

use chrono::{NaiveDate, NaiveTime};
use model::entities::{category, recurring_transaction, transaction};
use model::entities::recurring_transaction::RecurrenceFrequency;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, ModelTrait,
    QueryFilter, Set, TransactionTrait,
};
use tracing::{debug, info, instrument};

use crate::error::{EngineError, Result};

/// Schedule attached to a template transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecurrenceRequest {
    pub frequency: RecurrenceFrequency,
    /// First occurrence to materialize.
    pub next_execution_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    /// Anchor day for monthly schedules, 1 to 31.
    pub day_of_month: Option<i32>,
    /// 0 (Monday) to 6 (Sunday).
    pub day_of_week: Option<i32>,
}

impl RecurrenceRequest {
    pub fn new(frequency: RecurrenceFrequency, next_execution_date: NaiveDate) -> Self {
        Self {
            frequency,
            next_execution_date,
            end_date: None,
            day_of_month: None,
            day_of_week: None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(day) = self.day_of_month {
            if !(1..=31).contains(&day) {
                return Err(EngineError::Validation(format!(
                    "day_of_month must be between 1 and 31, got {day}"
                )));
            }
        }
        if let Some(day) = self.day_of_week {
            if !(0..=6).contains(&day) {
                return Err(EngineError::Validation(format!(
                    "day_of_week must be between 0 and 6, got {day}"
                )));
            }
        }
        if let Some(end) = self.end_date {
            if end < self.next_execution_date {
                return Err(EngineError::Validation(format!(
                    "end_date {end} is before next_execution_date {}",
                    self.next_execution_date
                )));
            }
        }
        Ok(())
    }

    fn into_active_model(self, transaction_id: i32) -> recurring_transaction::ActiveModel {
        recurring_transaction::ActiveModel {
            transaction_id: Set(transaction_id),
            frequency: Set(self.frequency),
            next_execution_date: Set(self.next_execution_date),
            end_date: Set(self.end_date),
            day_of_month: Set(self.day_of_month),
            day_of_week: Set(self.day_of_week),
            is_active: Set(true),
            last_executed: Set(None),
            generated_transactions: Set(0),
            ..Default::default()
        }
    }
}

/// A transaction created together with its schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTransaction {
    pub category_id: i32,
    pub name: String,
    pub description: Option<String>,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub time: NaiveTime,
}

/// Loads a transaction, checking that its category belongs to `user_id`.
pub async fn find_owned_transaction<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    transaction_id: i32,
) -> Result<transaction::Model> {
    let (template, owner) = transaction::Entity::find_by_id(transaction_id)
        .find_also_related(category::Entity)
        .one(db)
        .await?
        .ok_or_else(|| EngineError::not_found("Transaction", transaction_id))?;

    match owner {
        Some(owner) if owner.user_id == user_id => Ok(template),
        _ => Err(EngineError::ownership("Transaction", transaction_id, user_id)),
    }
}

/// Loads a recurring configuration owned by `user_id` together with its template.
pub async fn find_owned_recurring<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    config_id: i32,
) -> Result<(recurring_transaction::Model, transaction::Model)> {
    let (config, template) = recurring_transaction::Entity::find_by_id(config_id)
        .find_also_related(transaction::Entity)
        .one(db)
        .await?
        .ok_or_else(|| EngineError::not_found("RecurringTransaction", config_id))?;
    let template =
        template.ok_or_else(|| EngineError::not_found("Transaction", config.transaction_id))?;

    let owned = category::Entity::find_by_id(template.category_id)
        .filter(category::Column::UserId.eq(user_id))
        .one(db)
        .await?
        .is_some();
    if !owned {
        return Err(EngineError::ownership("RecurringTransaction", config_id, user_id));
    }

    Ok((config, template))
}

/// Turns an existing transaction into the template of a new schedule.
#[instrument(skip(db, request))]
pub async fn make_recurring(
    db: &DatabaseConnection,
    user_id: i32,
    transaction_id: i32,
    request: RecurrenceRequest,
) -> Result<recurring_transaction::Model> {
    request.validate()?;
    let template = find_owned_transaction(db, user_id, transaction_id).await?;

    let existing = recurring_transaction::Entity::find()
        .filter(recurring_transaction::Column::TransactionId.eq(transaction_id))
        .one(db)
        .await?;
    if let Some(existing) = existing {
        return Err(EngineError::Conflict(format!(
            "transaction {transaction_id} already has recurring configuration {}",
            existing.id
        )));
    }

    let txn = db.begin().await?;
    let config = request.into_active_model(template.id).insert(&txn).await?;
    let mut flagged: transaction::ActiveModel = template.into();
    flagged.is_recurring = Set(true);
    flagged.update(&txn).await?;
    txn.commit().await?;

    info!(
        "Transaction {} of user {} is now recurring ({:?}) as configuration {}",
        transaction_id, user_id, config.frequency, config.id
    );
    Ok(config)
}

/// Inserts a transaction that is recurring from the start.
#[instrument(skip(db, new_transaction, request), fields(name = %new_transaction.name))]
pub async fn create_with_recurrence(
    db: &DatabaseConnection,
    user_id: i32,
    new_transaction: NewTransaction,
    request: RecurrenceRequest,
) -> Result<(transaction::Model, recurring_transaction::Model)> {
    request.validate()?;

    let owned = category::Entity::find_by_id(new_transaction.category_id)
        .one(db)
        .await?
        .ok_or_else(|| EngineError::not_found("Category", new_transaction.category_id))?;
    if owned.user_id != user_id {
        return Err(EngineError::ownership("Category", owned.id, user_id));
    }

    let txn = db.begin().await?;
    let template = transaction::ActiveModel {
        category_id: Set(new_transaction.category_id),
        name: Set(new_transaction.name),
        description: Set(new_transaction.description),
        amount: Set(new_transaction.amount),
        date: Set(new_transaction.date),
        time: Set(new_transaction.time),
        is_recurring: Set(true),
        receipt_key: Set(None),
        ..Default::default()
    }
    .insert(&txn)
    .await?;
    let config = request.into_active_model(template.id).insert(&txn).await?;
    txn.commit().await?;

    info!(
        "Created recurring transaction {} with configuration {} for user {}",
        template.id, config.id, user_id
    );
    Ok((template, config))
}

/// Pauses or resumes a schedule.
#[instrument(skip(db))]
pub async fn set_active(
    db: &DatabaseConnection,
    user_id: i32,
    config_id: i32,
    active: bool,
) -> Result<recurring_transaction::Model> {
    let (config, _) = find_owned_recurring(db, user_id, config_id).await?;

    if active {
        if let Some(end) = config.end_date {
            if config.next_execution_date > end {
                return Err(EngineError::Conflict(format!(
                    "recurring transaction {config_id} ended on {end}"
                )));
            }
        }
    }
    if config.is_active == active {
        debug!("Recurring transaction {} already has is_active={}", config_id, active);
        return Ok(config);
    }

    let mut model: recurring_transaction::ActiveModel = config.into();
    model.is_active = Set(active);
    let updated = model.update(db).await?;

    info!("Recurring transaction {} is_active set to {}", config_id, active);
    Ok(updated)
}

/// Removes a schedule. Transactions it generated are kept and the template
/// becomes an ordinary transaction again.
#[instrument(skip(db))]
pub async fn delete_recurring(db: &DatabaseConnection, user_id: i32, config_id: i32) -> Result<()> {
    let (config, template) = find_owned_recurring(db, user_id, config_id).await?;

    let txn = db.begin().await?;
    config.delete(&txn).await?;
    let mut plain: transaction::ActiveModel = template.into();
    plain.is_recurring = Set(false);
    plain.update(&txn).await?;
    txn.commit().await?;

    info!("Deleted recurring transaction {} of user {}", config_id, user_id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;
    use model::entities::notification;
    use sea_orm::PaginatorTrait;
    use std::str::FromStr;

    #[tokio::test]
    async fn test_make_recurring_flags_template() {
        let db = setup_db().await;
        let ana = new_user(&db, "ana").await;
        let category = new_category(&db, &ana).await;
        let rent = new_transaction(&db, &category, "Rent", "-450", date(2024, 1, 1)).await;

        let mut request = RecurrenceRequest::new(RecurrenceFrequency::Monthly, date(2024, 2, 1));
        request.day_of_month = Some(1);
        let config = make_recurring(&db, ana.id, rent.id, request.clone()).await.unwrap();

        assert_eq!(config.transaction_id, rent.id);
        assert!(config.is_active);
        assert_eq!(config.generated_transactions, 0);
        assert!(find_owned_transaction(&db, ana.id, rent.id).await.unwrap().is_recurring);

        let duplicate = make_recurring(&db, ana.id, rent.id, request).await;
        assert!(matches!(duplicate, Err(EngineError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_make_recurring_checks_ownership_and_input() {
        let db = setup_db().await;
        let ana = new_user(&db, "ana").await;
        let ben = new_user(&db, "ben").await;
        let category = new_category(&db, &ana).await;
        let rent = new_transaction(&db, &category, "Rent", "-450", date(2024, 1, 1)).await;
        let request = RecurrenceRequest::new(RecurrenceFrequency::Weekly, date(2024, 2, 1));

        let foreign = make_recurring(&db, ben.id, rent.id, request.clone()).await;
        assert!(matches!(foreign, Err(EngineError::Ownership { .. })));

        let missing = make_recurring(&db, ana.id, 999, request.clone()).await;
        assert!(matches!(missing, Err(EngineError::NotFound { .. })));

        let invalid = RecurrenceRequest {
            end_date: Some(date(2024, 1, 1)),
            ..request
        };
        let result = make_recurring(&db, ana.id, rent.id, invalid).await;
        assert!(matches!(result, Err(EngineError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_with_recurrence() {
        let db = setup_db().await;
        let ana = new_user(&db, "ana").await;
        let ben = new_user(&db, "ben").await;
        let category = new_category(&db, &ana).await;
        let new_transaction = NewTransaction {
            category_id: category.id,
            name: "Salary".to_string(),
            description: None,
            amount: Decimal::from_str("1500").unwrap(),
            date: date(2024, 1, 15),
            time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        };
        let request = RecurrenceRequest::new(RecurrenceFrequency::Monthly, date(2024, 2, 15));

        let foreign = create_with_recurrence(&db, ben.id, new_transaction.clone(), request.clone()).await;
        assert!(matches!(foreign, Err(EngineError::Ownership { .. })));

        let (template, config) = create_with_recurrence(&db, ana.id, new_transaction, request)
            .await
            .unwrap();
        assert!(template.is_recurring);
        assert_eq!(config.transaction_id, template.id);
        assert_eq!(config.next_execution_date, date(2024, 2, 15));
    }

    #[tokio::test]
    async fn test_set_active_pauses_and_resumes() {
        let db = setup_db().await;
        let ana = new_user(&db, "ana").await;
        let ben = new_user(&db, "ben").await;
        let category = new_category(&db, &ana).await;
        let rent = new_transaction(&db, &category, "Rent", "-450", date(2024, 1, 1)).await;
        let config = new_recurring(&db, &rent, RecurrenceFrequency::Monthly, date(2024, 2, 1), None).await;

        assert!(!set_active(&db, ana.id, config.id, false).await.unwrap().is_active);
        assert!(set_active(&db, ana.id, config.id, true).await.unwrap().is_active);

        let foreign = set_active(&db, ben.id, config.id, false).await;
        assert!(matches!(foreign, Err(EngineError::Ownership { .. })));
    }

    #[tokio::test]
    async fn test_resume_after_end_date_conflicts() {
        let db = setup_db().await;
        let ana = new_user(&db, "ana").await;
        let category = new_category(&db, &ana).await;
        let plan = new_transaction(&db, &category, "Plan", "-20", date(2024, 1, 1)).await;
        let config = new_recurring(&db, &plan, RecurrenceFrequency::Daily, date(2024, 3, 10), Some(date(2024, 3, 1))).await;

        let result = set_active(&db, ana.id, config.id, true).await;
        assert!(matches!(result, Err(EngineError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_delete_recurring_keeps_history() {
        let db = setup_db().await;
        let ana = new_user(&db, "ana").await;
        new_device_with_preference(&db, &ana, "phone", Some(0)).await;
        let category = new_category(&db, &ana).await;
        let rent = new_transaction(&db, &category, "Rent", "-450", date(2024, 1, 1)).await;
        let config = make_recurring(
            &db,
            ana.id,
            rent.id,
            RecurrenceRequest::new(RecurrenceFrequency::Monthly, date(2024, 2, 1)),
        )
        .await
        .unwrap();

        let push = std::sync::Arc::new(RecordingPushGateway::default());
        crate::recurring::RecurringTransactionEngine::new(
            push,
            clock_at(2024, 2, 1),
            crate::options::EngineOptions::default(),
        )
        .run(&db)
        .await
        .unwrap();

        delete_recurring(&db, ana.id, config.id).await.unwrap();

        assert_eq!(recurring_transaction::Entity::find().count(&db).await.unwrap(), 0);
        assert_eq!(transaction::Entity::find().count(&db).await.unwrap(), 2);
        assert!(!find_owned_transaction(&db, ana.id, rent.id).await.unwrap().is_recurring);

        let notices = notification::Entity::find().all(&db).await.unwrap();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].recurring_transaction_id, None);

        let again = delete_recurring(&db, ana.id, config.id).await;
        assert!(matches!(again, Err(EngineError::NotFound { .. })));
    }
}
