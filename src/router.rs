use crate::handlers::{
    amortizations::pay_installment,
    devices::{create_preference, register_device, unsubscribe_device},
    health::health_check,
    notifications::{list_notifications, mark_notification_read},
    recurring::{
        create_recurring_transaction, delete_recurring_transaction, make_transaction_recurring,
        set_recurring_active,
    },
    scheduler::{run_debt_notifications, run_recurring_transactions},
};
use crate::schemas::{ApiDoc, AppState};
use axum::{
    Router,
    routing::{delete, get, post, put},
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Create application router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Manual scheduler triggers
        .route("/api/v1/scheduler/debt-notifications", post(run_debt_notifications))
        .route(
            "/api/v1/scheduler/recurring-transactions",
            post(run_recurring_transactions),
        )
        // Debts
        .route(
            "/api/v1/users/:user_id/amortizations/:amortization_id/pay",
            post(pay_installment),
        )
        // Devices and preferences
        .route("/api/v1/users/:user_id/devices", post(register_device))
        .route(
            "/api/v1/users/:user_id/devices/:device_id/preferences",
            post(create_preference),
        )
        .route(
            "/api/v1/users/:user_id/devices/:device_id/subscription",
            delete(unsubscribe_device),
        )
        // Notifications
        .route("/api/v1/users/:user_id/notifications", get(list_notifications))
        .route(
            "/api/v1/users/:user_id/notifications/:notification_id/read",
            put(mark_notification_read),
        )
        // Recurring transactions
        .route(
            "/api/v1/users/:user_id/recurring-transactions",
            post(create_recurring_transaction),
        )
        .route(
            "/api/v1/users/:user_id/transactions/:transaction_id/recurring",
            post(make_transaction_recurring),
        )
        .route(
            "/api/v1/users/:user_id/recurring-transactions/:recurring_id/active",
            put(set_recurring_active),
        )
        .route(
            "/api/v1/users/:user_id/recurring-transactions/:recurring_id",
            delete(delete_recurring_transaction),
        )
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Add middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(TimeoutLayer::new(Duration::from_secs(30)))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
