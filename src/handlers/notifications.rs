use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::{NaiveDate, NaiveTime};
use engine::notifications;
use model::entities::notification;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use utoipa::{IntoParams, ToSchema};

use crate::handlers::{HandlerError, engine_error};
use crate::schemas::{ApiResponse, AppState, ErrorResponse};

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct NotificationQuery {
    /// Only return unread notifications
    #[serde(default)]
    pub unread_only: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct NotificationResponse {
    pub id: i32,
    pub title: String,
    pub message: String,
    pub is_read: bool,
    pub debt_id: Option<i32>,
    pub amortization_id: Option<i32>,
    pub recurring_transaction_id: Option<i32>,
    /// Due date the notice refers to
    pub occurrence_date: Option<NaiveDate>,
    pub date: NaiveDate,
    pub time: NaiveTime,
}

impl From<notification::Model> for NotificationResponse {
    fn from(model: notification::Model) -> Self {
        Self {
            id: model.id,
            title: model.title,
            message: model.message,
            is_read: model.is_read,
            debt_id: model.debt_id,
            amortization_id: model.amortization_id,
            recurring_transaction_id: model.recurring_transaction_id,
            occurrence_date: model.occurrence_date,
            date: model.date,
            time: model.time,
        }
    }
}

/// List a user's notifications, newest first
#[utoipa::path(
    get,
    path = "/api/v1/users/{user_id}/notifications",
    tag = "notifications",
    params(
        ("user_id" = i32, Path, description = "Recipient"),
        NotificationQuery
    ),
    responses(
        (status = 200, description = "Notifications retrieved", body = ApiResponse<Vec<NotificationResponse>>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn list_notifications(
    Path(user_id): Path<i32>,
    Query(query): Query<NotificationQuery>,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<ApiResponse<Vec<NotificationResponse>>>), HandlerError> {
    let found = notifications::list_for_user(&state.db, user_id, query.unread_only)
        .await
        .map_err(engine_error)?;
    debug!("Returning {} notifications", found.len());

    let data = found.into_iter().map(NotificationResponse::from).collect();
    Ok((StatusCode::OK, Json(ApiResponse::ok(data, "Notifications retrieved successfully"))))
}

/// Mark a notification as read
#[utoipa::path(
    put,
    path = "/api/v1/users/{user_id}/notifications/{notification_id}/read",
    tag = "notifications",
    params(
        ("user_id" = i32, Path, description = "Recipient"),
        ("notification_id" = i32, Path, description = "Notification to mark")
    ),
    responses(
        (status = 200, description = "Notification marked as read", body = ApiResponse<NotificationResponse>),
        (status = 403, description = "Notification belongs to another user", body = ErrorResponse),
        (status = 404, description = "Notification not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn mark_notification_read(
    Path((user_id, notification_id)): Path<(i32, i32)>,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<ApiResponse<NotificationResponse>>), HandlerError> {
    let updated = notifications::mark_as_read(&state.db, user_id, notification_id)
        .await
        .map_err(engine_error)?;

    Ok((
        StatusCode::OK,
        Json(ApiResponse::ok(
            NotificationResponse::from(updated),
            "Notification marked as read",
        )),
    ))
}
