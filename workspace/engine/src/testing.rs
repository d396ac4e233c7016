//! Fixtures shared by the engine's tests.

use std::collections::HashSet;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use common::{Clock, FixedClock, PushMessage};
use migration::{Migrator, MigratorTrait};
use model::entities::{
    amortization, category, debt, device, notification, notification_preference,
    recurring_transaction, transaction, user,
};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, Set};

use crate::push::{PushError, PushGateway, Subscription};

pub use model::entities::debt::PaymentStatus;
pub use model::entities::recurring_transaction::RecurrenceFrequency;

pub async fn setup_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to connect to in-memory database");
    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");
    db
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn clock_at(y: i32, m: u32, d: u32) -> Arc<dyn Clock> {
    Arc::new(FixedClock::at_date(date(y, m, d)))
}

pub async fn new_user(db: &DatabaseConnection, username: &str) -> user::Model {
    user::ActiveModel {
        username: Set(username.to_string()),
        email: Set(Some(format!("{username}@example.com"))),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to create user")
}

pub async fn new_category(db: &DatabaseConnection, owner: &user::Model) -> category::Model {
    category::ActiveModel {
        user_id: Set(owner.id),
        name: Set("Household".to_string()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to create category")
}

pub async fn new_transaction(
    db: &DatabaseConnection,
    category: &category::Model,
    name: &str,
    amount: &str,
    on: NaiveDate,
) -> transaction::Model {
    transaction::ActiveModel {
        category_id: Set(category.id),
        name: Set(name.to_string()),
        description: Set(None),
        amount: Set(Decimal::from_str(amount).unwrap()),
        date: Set(on),
        time: Set(NaiveTime::from_hms_opt(8, 30, 0).unwrap()),
        is_recurring: Set(false),
        receipt_key: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to create transaction")
}

pub async fn new_recurring(
    db: &DatabaseConnection,
    template: &transaction::Model,
    frequency: RecurrenceFrequency,
    next_execution_date: NaiveDate,
    end_date: Option<NaiveDate>,
) -> recurring_transaction::Model {
    let mut flagged: transaction::ActiveModel = template.clone().into();
    flagged.is_recurring = Set(true);
    flagged.update(db).await.expect("Failed to flag template");

    recurring_transaction::ActiveModel {
        transaction_id: Set(template.id),
        frequency: Set(frequency),
        next_execution_date: Set(next_execution_date),
        end_date: Set(end_date),
        day_of_month: Set(None),
        day_of_week: Set(None),
        is_active: Set(true),
        last_executed: Set(None),
        generated_transactions: Set(0),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to create recurring transaction")
}

pub async fn set_day_of_month(
    db: &DatabaseConnection,
    config: &recurring_transaction::Model,
    day: i32,
) -> recurring_transaction::Model {
    let mut model: recurring_transaction::ActiveModel = config.clone().into();
    model.day_of_month = Set(Some(day));
    model.update(db).await.expect("Failed to set day_of_month")
}

pub async fn new_debt(db: &DatabaseConnection, owner: &user::Model, name: &str) -> debt::Model {
    debt::ActiveModel {
        user_id: Set(owner.id),
        name: Set(name.to_string()),
        amount: Set(Decimal::from(1200)),
        interest_rate: Set(Decimal::from_str("0.12").unwrap()),
        duration_months: Set(12),
        status: Set(PaymentStatus::Pending),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to create debt")
}

pub async fn new_installment(
    db: &DatabaseConnection,
    debt: &debt::Model,
    number: i32,
    due: NaiveDate,
    quota: &str,
) -> amortization::Model {
    let quota = Decimal::from_str(quota).unwrap();
    amortization::ActiveModel {
        debt_id: Set(debt.id),
        number_months: Set(number),
        date: Set(due),
        quota: Set(quota),
        interest: Set(Decimal::ZERO),
        amortized: Set(quota),
        outstanding: Set(debt.amount - quota),
        status: Set(PaymentStatus::Pending),
        payment_date: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to create installment")
}

pub async fn mark_installment(
    db: &DatabaseConnection,
    installment: amortization::Model,
    status: PaymentStatus,
) -> amortization::Model {
    let mut model: amortization::ActiveModel = installment.into();
    model.status = Set(status);
    model.update(db).await.expect("Failed to update installment")
}

pub async fn set_debt_status(
    db: &DatabaseConnection,
    debt: debt::Model,
    status: PaymentStatus,
) -> debt::Model {
    let mut model: debt::ActiveModel = debt.into();
    model.status = Set(status);
    model.update(db).await.expect("Failed to update debt")
}

pub async fn new_device(db: &DatabaseConnection, owner: &user::Model, name: &str) -> device::Model {
    device::ActiveModel {
        user_id: Set(owner.id),
        name: Set(name.to_string()),
        created_at: Set(date(2024, 1, 1).and_hms_opt(0, 0, 0).unwrap()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to create device")
}

/// A device with one push-enabled preference.
pub async fn new_device_with_preference(
    db: &DatabaseConnection,
    owner: &user::Model,
    name: &str,
    days_before_notify: Option<i32>,
) -> (device::Model, notification_preference::Model) {
    let device = new_device(db, owner, name).await;
    let preference = notification_preference::ActiveModel {
        device_id: Set(device.id),
        push_enabled: Set(true),
        subscription: Set(format!(
            r#"{{"endpoint":"https://push.example/{}/{}"}}"#,
            owner.username, device.id
        )),
        days_before_notify: Set(days_before_notify),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to create preference");
    (device, preference)
}

pub async fn set_push_enabled(
    db: &DatabaseConnection,
    preference: notification_preference::Model,
    enabled: bool,
) -> notification_preference::Model {
    let mut model: notification_preference::ActiveModel = preference.into();
    model.push_enabled = Set(enabled);
    model.update(db).await.expect("Failed to update preference")
}

pub async fn new_notification(
    db: &DatabaseConnection,
    owner: &user::Model,
    title: &str,
) -> notification::Model {
    notification::ActiveModel {
        user_id: Set(owner.id),
        title: Set(title.to_string()),
        message: Set(format!("{title} body")),
        is_read: Set(false),
        date: Set(date(2024, 5, 1)),
        time: Set(NaiveTime::from_hms_opt(12, 0, 0).unwrap()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to create notification")
}

/// Records every send; subscriptions listed in `failing` are rejected.
#[derive(Debug, Default)]
pub struct RecordingPushGateway {
    sent: Mutex<Vec<(Subscription, PushMessage)>>,
    failing: HashSet<String>,
}

impl RecordingPushGateway {
    pub fn failing_for<I, S>(subscriptions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            sent: Mutex::new(Vec::new()),
            failing: subscriptions.into_iter().map(Into::into).collect(),
        }
    }

    pub fn sent(&self) -> Vec<(Subscription, PushMessage)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl PushGateway for RecordingPushGateway {
    async fn send(&self, subscription: &Subscription, message: &PushMessage) -> Result<(), PushError> {
        if self.failing.contains(subscription.as_str()) {
            return Err(PushError::Gone);
        }
        self.sent
            .lock()
            .unwrap()
            .push((subscription.clone(), message.clone()));
        Ok(())
    }
}
