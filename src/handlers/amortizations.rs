use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use chrono::NaiveDate;
use engine::debts;
use model::entities::debt::PaymentStatus;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use utoipa::ToSchema;

use crate::handlers::{HandlerError, engine_error};
use crate::schemas::{ApiResponse, AppState, ErrorResponse};

/// Request body for paying an installment
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct PayInstallmentRequest {
    /// Payment date (defaults to today in the configured timezone)
    pub payment_date: Option<NaiveDate>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct InstallmentPaymentResponse {
    pub amortization_id: i32,
    pub debt_id: i32,
    pub payment_date: NaiveDate,
    /// "Pendiente" or "Pagado"
    pub debt_status: String,
}

fn status_label(status: PaymentStatus) -> String {
    match status {
        PaymentStatus::Pending => "Pendiente",
        PaymentStatus::Paid => "Pagado",
    }
    .to_string()
}

/// Mark a debt installment as paid
#[utoipa::path(
    post,
    path = "/api/v1/users/{user_id}/amortizations/{amortization_id}/pay",
    tag = "debts",
    params(
        ("user_id" = i32, Path, description = "Owner of the debt"),
        ("amortization_id" = i32, Path, description = "Installment to pay")
    ),
    request_body = PayInstallmentRequest,
    responses(
        (status = 200, description = "Installment paid", body = ApiResponse<InstallmentPaymentResponse>),
        (status = 403, description = "Installment belongs to another user", body = ErrorResponse),
        (status = 404, description = "Installment not found", body = ErrorResponse),
        (status = 409, description = "Installment already paid", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn pay_installment(
    Path((user_id, amortization_id)): Path<(i32, i32)>,
    State(state): State<AppState>,
    Json(request): Json<PayInstallmentRequest>,
) -> Result<(StatusCode, Json<ApiResponse<InstallmentPaymentResponse>>), HandlerError> {
    let payment_date = request
        .payment_date
        .unwrap_or_else(|| state.clock.today());
    debug!("Paying installment {} on {}", amortization_id, payment_date);

    let (installment, debt) =
        debts::mark_installment_paid(&state.db, user_id, amortization_id, payment_date)
            .await
            .map_err(engine_error)?;

    info!(
        "Installment {} of debt {} paid, debt is {:?}",
        installment.id, debt.id, debt.status
    );
    let response = InstallmentPaymentResponse {
        amortization_id: installment.id,
        debt_id: debt.id,
        payment_date,
        debt_status: status_label(debt.status),
    };
    Ok((StatusCode::OK, Json(ApiResponse::ok(response, "Installment paid successfully"))))
}
