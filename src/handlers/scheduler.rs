use axum::{extract::State, http::StatusCode, response::Json};
use common::TickReport;
use engine::{DebtDueDateNotifier, RecurringTransactionEngine};
use tracing::{info, instrument};

use crate::handlers::{HandlerError, engine_error};
use crate::schemas::{ApiResponse, AppState, ErrorResponse};

/// Run the debt due-date notifier once
#[utoipa::path(
    post,
    path = "/api/v1/scheduler/debt-notifications",
    tag = "scheduler",
    responses(
        (status = 200, description = "Tick completed", body = ApiResponse<TickReport>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn run_debt_notifications(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<ApiResponse<TickReport>>), HandlerError> {
    let notifier =
        DebtDueDateNotifier::new(state.push.clone(), state.clock.clone(), state.options.clone());
    let report = notifier.run(&state.db).await.map_err(engine_error)?;

    info!("Manual debt notification tick: {:?}", report);
    Ok((StatusCode::OK, Json(ApiResponse::ok(report, "Debt notifications processed"))))
}

/// Run the recurring transaction engine once
#[utoipa::path(
    post,
    path = "/api/v1/scheduler/recurring-transactions",
    tag = "scheduler",
    responses(
        (status = 200, description = "Tick completed", body = ApiResponse<TickReport>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn run_recurring_transactions(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<ApiResponse<TickReport>>), HandlerError> {
    let engine = RecurringTransactionEngine::new(
        state.push.clone(),
        state.clock.clone(),
        state.options.clone(),
    );
    let report = engine.run(&state.db).await.map_err(engine_error)?;

    info!("Manual recurring transaction tick: {:?}", report);
    Ok((StatusCode::OK, Json(ApiResponse::ok(report, "Recurring transactions processed"))))
}
