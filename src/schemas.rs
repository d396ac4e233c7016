use std::sync::Arc;

use common::{Clock, TickReport};
use engine::{EngineOptions, PushGateway};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::{OpenApi, ToSchema};

use crate::handlers::{
    amortizations::{InstallmentPaymentResponse, PayInstallmentRequest},
    devices::{
        CreatePreferenceRequest, DeviceResponse, PreferenceResponse, RegisterDeviceRequest,
        UnsubscribeResponse,
    },
    notifications::NotificationResponse,
    recurring::{
        CreateRecurringTransactionRequest, RecurrenceBody, RecurringTransactionResponse,
        SetActiveRequest,
    },
};

/// Application state shared across handlers
#[derive(Clone, Debug)]
pub struct AppState {
    /// Database connection
    pub db: DatabaseConnection,
    /// Outbound push delivery
    pub push: Arc<dyn PushGateway>,
    /// Source of "today" in the configured timezone
    pub clock: Arc<dyn Clock>,
    pub options: EngineOptions,
}

/// API response wrapper
#[derive(Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    /// Response data
    pub data: T,
    /// Response message
    pub message: String,
    /// Success status
    pub success: bool,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self {
            data,
            message: message.into(),
            success: true,
        }
    }
}

/// Error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// Error code
    pub code: String,
    /// Success status (always false for errors)
    pub success: bool,
}

/// Health check response
#[derive(Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
    /// Database connection status
    pub database: String,
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::health::health_check,
        crate::handlers::scheduler::run_debt_notifications,
        crate::handlers::scheduler::run_recurring_transactions,
        crate::handlers::amortizations::pay_installment,
        crate::handlers::devices::register_device,
        crate::handlers::devices::create_preference,
        crate::handlers::devices::unsubscribe_device,
        crate::handlers::notifications::list_notifications,
        crate::handlers::notifications::mark_notification_read,
        crate::handlers::recurring::create_recurring_transaction,
        crate::handlers::recurring::make_transaction_recurring,
        crate::handlers::recurring::set_recurring_active,
        crate::handlers::recurring::delete_recurring_transaction,
    ),
    components(
        schemas(
            ApiResponse<TickReport>,
            ApiResponse<InstallmentPaymentResponse>,
            ApiResponse<DeviceResponse>,
            ApiResponse<PreferenceResponse>,
            ApiResponse<UnsubscribeResponse>,
            ApiResponse<Vec<NotificationResponse>>,
            ApiResponse<NotificationResponse>,
            ApiResponse<RecurringTransactionResponse>,
            ErrorResponse,
            HealthResponse,
            TickReport,
            PayInstallmentRequest,
            InstallmentPaymentResponse,
            RegisterDeviceRequest,
            DeviceResponse,
            CreatePreferenceRequest,
            PreferenceResponse,
            UnsubscribeResponse,
            NotificationResponse,
            RecurrenceBody,
            CreateRecurringTransactionRequest,
            SetActiveRequest,
            RecurringTransactionResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "scheduler", description = "Manual scheduler triggers"),
        (name = "debts", description = "Debt installment payments"),
        (name = "devices", description = "Devices and push preferences"),
        (name = "notifications", description = "In-app notifications"),
        (name = "recurring-transactions", description = "Recurring transaction schedules"),
    ),
    info(
        title = "finanza scheduling API",
        description = "Recurring transactions and debt due-date notifications",
        version = "0.1.0",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_schema_generation() {
        let openapi = ApiDoc::openapi();

        let components = openapi.components.as_ref().unwrap();
        assert!(components.schemas.contains_key("ErrorResponse"));
        assert!(components.schemas.contains_key("HealthResponse"));
        assert!(components.schemas.contains_key("TickReport"));

        assert!(serde_json::to_string(&openapi).is_ok());
    }

    #[test]
    fn test_openapi_lists_scheduler_routes() {
        let openapi = ApiDoc::openapi();
        let paths = &openapi.paths.paths;

        assert!(paths.contains_key("/api/v1/scheduler/debt-notifications"));
        assert!(paths.contains_key("/api/v1/scheduler/recurring-transactions"));
        assert!(paths.contains_key("/api/v1/users/{user_id}/notifications"));
        assert!(paths.contains_key("/api/v1/users/{user_id}/recurring-transactions/{recurring_id}"));
    }

    #[test]
    fn test_error_response_schema_structure() {
        let openapi = ApiDoc::openapi();
        let components = openapi.components.as_ref().unwrap();
        let error_response_schema = components.schemas.get("ErrorResponse").unwrap();

        if let utoipa::openapi::RefOr::T(utoipa::openapi::schema::Schema::Object(obj)) =
            error_response_schema
        {
            assert!(obj.properties.contains_key("error"));
            assert!(obj.properties.contains_key("code"));
            assert!(obj.properties.contains_key("success"));
        } else {
            panic!("ErrorResponse should be an object schema");
        }
    }
}
