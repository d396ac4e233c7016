use std::str::FromStr;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use chrono::{NaiveDate, NaiveTime};
use engine::recurring::lifecycle::{self, NewTransaction, RecurrenceRequest};
use model::entities::recurring_transaction::{self, RecurrenceFrequency};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use utoipa::ToSchema;
use validator::Validate;

use crate::handlers::{HandlerError, engine_error, error_response, validation_error};
use crate::schemas::{ApiResponse, AppState, ErrorResponse};

/// Schedule of a recurring transaction
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, Validate)]
pub struct RecurrenceBody {
    /// daily, weekly, biweekly, monthly or yearly
    #[schema(example = "monthly")]
    pub frequency: String,
    /// First date a transaction is generated
    pub next_execution_date: NaiveDate,
    /// Last date a transaction may be generated
    pub end_date: Option<NaiveDate>,
    /// Anchor day for monthly schedules
    #[validate(range(min = 1, max = 31))]
    pub day_of_month: Option<i32>,
    /// 0 (Monday) to 6 (Sunday)
    #[validate(range(min = 0, max = 6))]
    pub day_of_week: Option<i32>,
}

impl RecurrenceBody {
    fn into_request(self) -> Result<RecurrenceRequest, HandlerError> {
        let frequency = RecurrenceFrequency::from_str(&self.frequency)
            .map_err(|e| error_response(StatusCode::BAD_REQUEST, "INVALID_FREQUENCY", e))?;
        Ok(RecurrenceRequest {
            frequency,
            next_execution_date: self.next_execution_date,
            end_date: self.end_date,
            day_of_month: self.day_of_month,
            day_of_week: self.day_of_week,
        })
    }
}

/// Request body for creating a transaction that repeats
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct CreateRecurringTransactionRequest {
    pub category_id: i32,
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub description: Option<String>,
    /// Signed amount; negative for expenses
    #[schema(value_type = String, example = "-450.00")]
    pub amount: Decimal,
    pub date: NaiveDate,
    /// Defaults to the current time in the configured timezone
    pub time: Option<NaiveTime>,
    #[validate(nested)]
    pub recurrence: RecurrenceBody,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct SetActiveRequest {
    pub is_active: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RecurringTransactionResponse {
    pub id: i32,
    pub transaction_id: i32,
    pub frequency: String,
    pub next_execution_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub day_of_month: Option<i32>,
    pub day_of_week: Option<i32>,
    pub is_active: bool,
    pub last_executed: Option<NaiveDate>,
    pub generated_transactions: i32,
}

impl From<recurring_transaction::Model> for RecurringTransactionResponse {
    fn from(model: recurring_transaction::Model) -> Self {
        Self {
            id: model.id,
            transaction_id: model.transaction_id,
            frequency: format!("{:?}", model.frequency).to_lowercase(),
            next_execution_date: model.next_execution_date,
            end_date: model.end_date,
            day_of_month: model.day_of_month,
            day_of_week: model.day_of_week,
            is_active: model.is_active,
            last_executed: model.last_executed,
            generated_transactions: model.generated_transactions,
        }
    }
}

/// Create a transaction together with its recurrence
#[utoipa::path(
    post,
    path = "/api/v1/users/{user_id}/recurring-transactions",
    tag = "recurring-transactions",
    params(("user_id" = i32, Path, description = "Owner of the category")),
    request_body = CreateRecurringTransactionRequest,
    responses(
        (status = 201, description = "Recurring transaction created", body = ApiResponse<RecurringTransactionResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 403, description = "Category belongs to another user", body = ErrorResponse),
        (status = 404, description = "Category not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request))]
pub async fn create_recurring_transaction(
    Path(user_id): Path<i32>,
    State(state): State<AppState>,
    Json(request): Json<CreateRecurringTransactionRequest>,
) -> Result<(StatusCode, Json<ApiResponse<RecurringTransactionResponse>>), HandlerError> {
    request.validate().map_err(validation_error)?;

    let recurrence = request.recurrence.into_request()?;
    let new_transaction = NewTransaction {
        category_id: request.category_id,
        name: request.name,
        description: request.description,
        amount: request.amount,
        date: request.date,
        time: request.time.unwrap_or_else(|| state.clock.time_of_day()),
    };

    let (template, config) =
        lifecycle::create_with_recurrence(&state.db, user_id, new_transaction, recurrence)
            .await
            .map_err(engine_error)?;

    info!("Recurring transaction {} created from template {}", config.id, template.id);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(
            RecurringTransactionResponse::from(config),
            "Recurring transaction created successfully",
        )),
    ))
}

/// Make an existing transaction recurring
#[utoipa::path(
    post,
    path = "/api/v1/users/{user_id}/transactions/{transaction_id}/recurring",
    tag = "recurring-transactions",
    params(
        ("user_id" = i32, Path, description = "Owner of the transaction"),
        ("transaction_id" = i32, Path, description = "Template transaction")
    ),
    request_body = RecurrenceBody,
    responses(
        (status = 201, description = "Recurrence attached", body = ApiResponse<RecurringTransactionResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 403, description = "Transaction belongs to another user", body = ErrorResponse),
        (status = 404, description = "Transaction not found", body = ErrorResponse),
        (status = 409, description = "Transaction is already recurring", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request))]
pub async fn make_transaction_recurring(
    Path((user_id, transaction_id)): Path<(i32, i32)>,
    State(state): State<AppState>,
    Json(request): Json<RecurrenceBody>,
) -> Result<(StatusCode, Json<ApiResponse<RecurringTransactionResponse>>), HandlerError> {
    request.validate().map_err(validation_error)?;

    let config = lifecycle::make_recurring(&state.db, user_id, transaction_id, request.into_request()?)
        .await
        .map_err(engine_error)?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(
            RecurringTransactionResponse::from(config),
            "Transaction is now recurring",
        )),
    ))
}

/// Pause or resume a recurring transaction
#[utoipa::path(
    put,
    path = "/api/v1/users/{user_id}/recurring-transactions/{recurring_id}/active",
    tag = "recurring-transactions",
    params(
        ("user_id" = i32, Path, description = "Owner of the schedule"),
        ("recurring_id" = i32, Path, description = "Recurring transaction")
    ),
    request_body = SetActiveRequest,
    responses(
        (status = 200, description = "State updated", body = ApiResponse<RecurringTransactionResponse>),
        (status = 403, description = "Schedule belongs to another user", body = ErrorResponse),
        (status = 404, description = "Schedule not found", body = ErrorResponse),
        (status = 409, description = "Schedule already ended", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn set_recurring_active(
    Path((user_id, recurring_id)): Path<(i32, i32)>,
    State(state): State<AppState>,
    Json(request): Json<SetActiveRequest>,
) -> Result<(StatusCode, Json<ApiResponse<RecurringTransactionResponse>>), HandlerError> {
    let config = lifecycle::set_active(&state.db, user_id, recurring_id, request.is_active)
        .await
        .map_err(engine_error)?;

    let message = if config.is_active {
        "Recurring transaction resumed"
    } else {
        "Recurring transaction paused"
    };
    Ok((
        StatusCode::OK,
        Json(ApiResponse::ok(RecurringTransactionResponse::from(config), message)),
    ))
}

/// Delete a recurring schedule, keeping the transactions it generated
#[utoipa::path(
    delete,
    path = "/api/v1/users/{user_id}/recurring-transactions/{recurring_id}",
    tag = "recurring-transactions",
    params(
        ("user_id" = i32, Path, description = "Owner of the schedule"),
        ("recurring_id" = i32, Path, description = "Recurring transaction")
    ),
    responses(
        (status = 200, description = "Schedule deleted", body = ApiResponse<String>),
        (status = 403, description = "Schedule belongs to another user", body = ErrorResponse),
        (status = 404, description = "Schedule not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_recurring_transaction(
    Path((user_id, recurring_id)): Path<(i32, i32)>,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<ApiResponse<String>>), HandlerError> {
    lifecycle::delete_recurring(&state.db, user_id, recurring_id)
        .await
        .map_err(engine_error)?;

    Ok((
        StatusCode::OK,
        Json(ApiResponse::ok(
            format!("Recurring transaction {} deleted", recurring_id),
            "Recurring transaction deleted successfully",
        )),
    ))
}
