#[cfg(test)]
pub mod test_utils {
    use std::sync::Arc;

    use crate::router::create_router;
    use crate::schemas::AppState;
    use axum::Router;
    use chrono::NaiveDate;
    use common::{Clock, FixedClock};
    use engine::{EngineOptions, LogPushGateway};
    use migration::{Migrator, MigratorTrait};
    use sea_orm::{Database, DatabaseConnection};
    use tracing::Level;
    use tracing_subscriber::FmtSubscriber;

    /// Date every test clock is pinned to.
    pub fn test_today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 30).unwrap()
    }

    pub fn fixed_clock() -> Arc<dyn Clock> {
        Arc::new(FixedClock::at_date(test_today()))
    }

    /// Create an in-memory SQLite database for testing
    pub async fn setup_test_db() -> DatabaseConnection {
        let db = Database::connect("sqlite::memory:")
            .await
            .expect("Failed to connect to in-memory database");

        Migrator::up(&db, None)
            .await
            .expect("Failed to run migrations");

        db
    }

    /// Create AppState for testing
    pub async fn setup_test_app_state() -> AppState {
        AppState {
            db: setup_test_db().await,
            push: Arc::new(LogPushGateway),
            clock: fixed_clock(),
            options: EngineOptions::default(),
        }
    }

    /// Initialize tracing for tests with output to STDERR.
    ///
    /// The log level comes from RUST_LOG, defaulting to WARN.
    fn init_test_tracing() -> tracing::subscriber::DefaultGuard {
        let log_level = std::env::var("RUST_LOG")
            .ok()
            .and_then(|level| match level.to_uppercase().as_str() {
                "ERROR" => Some(Level::ERROR),
                "WARN" => Some(Level::WARN),
                "INFO" => Some(Level::INFO),
                "DEBUG" => Some(Level::DEBUG),
                "TRACE" => Some(Level::TRACE),
                _ => None,
            })
            .unwrap_or(Level::WARN);

        let subscriber = FmtSubscriber::builder()
            .with_max_level(log_level)
            .with_writer(std::io::stderr)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    /// Create the router together with the state behind it, so tests can seed rows.
    pub async fn setup_test_app() -> (Router, AppState) {
        let _ = init_test_tracing();

        let state = setup_test_app_state().await;
        let router = create_router(state.clone());
        (router, state)
    }

    /// Row builders for integration tests.
    pub mod seed {
        use chrono::{NaiveDate, NaiveTime};
        use model::entities::{
            amortization, category, debt, debt::PaymentStatus, device, notification_preference,
            recurring_transaction, recurring_transaction::RecurrenceFrequency, transaction, user,
        };
        use rust_decimal::Decimal;
        use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};

        pub async fn user(db: &DatabaseConnection, username: &str) -> user::Model {
            user::ActiveModel {
                username: Set(username.to_string()),
                ..Default::default()
            }
            .insert(db)
            .await
            .expect("Failed to create user")
        }

        pub async fn category(db: &DatabaseConnection, owner: &user::Model) -> category::Model {
            category::ActiveModel {
                user_id: Set(owner.id),
                name: Set("Bills".to_string()),
                ..Default::default()
            }
            .insert(db)
            .await
            .expect("Failed to create category")
        }

        pub async fn transaction(
            db: &DatabaseConnection,
            category: &category::Model,
            name: &str,
        ) -> transaction::Model {
            transaction::ActiveModel {
                category_id: Set(category.id),
                name: Set(name.to_string()),
                description: Set(Some("Home".to_string())),
                amount: Set(Decimal::new(-3999, 2)),
                date: Set(NaiveDate::from_ymd_opt(2024, 4, 30).unwrap()),
                time: Set(NaiveTime::from_hms_opt(10, 0, 0).unwrap()),
                is_recurring: Set(false),
                receipt_key: Set(None),
                ..Default::default()
            }
            .insert(db)
            .await
            .expect("Failed to create transaction")
        }

        /// Monthly schedule for `template` starting at `next_execution_date`.
        pub async fn recurring(
            db: &DatabaseConnection,
            template: &transaction::Model,
            next_execution_date: NaiveDate,
        ) -> recurring_transaction::Model {
            recurring_transaction::ActiveModel {
                transaction_id: Set(template.id),
                frequency: Set(RecurrenceFrequency::Monthly),
                next_execution_date: Set(next_execution_date),
                end_date: Set(None),
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

        pub async fn debt(db: &DatabaseConnection, owner: &user::Model, name: &str) -> debt::Model {
            debt::ActiveModel {
                user_id: Set(owner.id),
                name: Set(name.to_string()),
                amount: Set(Decimal::new(500000, 2)),
                interest_rate: Set(Decimal::new(1050, 4)),
                duration_months: Set(24),
                status: Set(PaymentStatus::Pending),
                ..Default::default()
            }
            .insert(db)
            .await
            .expect("Failed to create debt")
        }

        pub async fn installment(
            db: &DatabaseConnection,
            debt: &debt::Model,
            number: i32,
            due: NaiveDate,
        ) -> amortization::Model {
            amortization::ActiveModel {
                debt_id: Set(debt.id),
                number_months: Set(number),
                date: Set(due),
                quota: Set(Decimal::new(23150, 2)),
                interest: Set(Decimal::new(4375, 2)),
                amortized: Set(Decimal::new(18775, 2)),
                outstanding: Set(Decimal::new(481225, 2)),
                status: Set(PaymentStatus::Pending),
                payment_date: Set(None),
                ..Default::default()
            }
            .insert(db)
            .await
            .expect("Failed to create installment")
        }

        pub async fn device(db: &DatabaseConnection, owner: &user::Model, name: &str) -> device::Model {
            device::ActiveModel {
                user_id: Set(owner.id),
                name: Set(name.to_string()),
                created_at: Set(NaiveDate::from_ymd_opt(2024, 1, 1)
                    .unwrap()
                    .and_hms_opt(0, 0, 0)
                    .unwrap()),
                ..Default::default()
            }
            .insert(db)
            .await
            .expect("Failed to create device")
        }

        pub async fn device_with_preference(
            db: &DatabaseConnection,
            owner: &user::Model,
            name: &str,
            days_before_notify: Option<i32>,
        ) -> (device::Model, notification_preference::Model) {
            let device = device(db, owner, name).await;
            let preference = notification_preference::ActiveModel {
                device_id: Set(device.id),
                push_enabled: Set(true),
                subscription: Set(format!(r#"{{"endpoint":"https://push.example/{}"}}"#, device.id)),
                days_before_notify: Set(days_before_notify),
                ..Default::default()
            }
            .insert(db)
            .await
            .expect("Failed to create preference");
            (device, preference)
        }
    }
}
