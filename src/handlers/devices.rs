use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use chrono::NaiveDateTime;
use engine::devices::{self, PreferenceRequest};
use model::entities::{device, notification_preference};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use utoipa::ToSchema;
use validator::Validate;

use crate::handlers::{HandlerError, engine_error, validation_error};
use crate::schemas::{ApiResponse, AppState, ErrorResponse};

/// Request body for registering a device
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct RegisterDeviceRequest {
    /// Display name, e.g. "Work laptop"
    #[validate(length(min = 1, max = 100))]
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeviceResponse {
    pub id: i32,
    pub user_id: i32,
    pub name: String,
    pub created_at: NaiveDateTime,
}

impl From<device::Model> for DeviceResponse {
    fn from(model: device::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            name: model.name,
            created_at: model.created_at,
        }
    }
}

/// Request body for a device's notification preference
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct CreatePreferenceRequest {
    /// Defaults to true
    pub push_enabled: Option<bool>,
    /// Push subscription JSON exactly as returned by the browser
    #[validate(length(min = 1))]
    pub subscription: String,
    /// Days of advance notice; omit to receive no scheduled notices
    #[validate(range(min = 0, max = 365))]
    pub days_before_notify: Option<i32>,
}

/// Preference as returned by the API. The subscription is never echoed back.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PreferenceResponse {
    pub id: i32,
    pub device_id: i32,
    pub push_enabled: bool,
    pub days_before_notify: Option<i32>,
}

impl From<notification_preference::Model> for PreferenceResponse {
    fn from(model: notification_preference::Model) -> Self {
        Self {
            id: model.id,
            device_id: model.device_id,
            push_enabled: model.push_enabled,
            days_before_notify: model.days_before_notify,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UnsubscribeResponse {
    pub preferences_removed: u64,
    pub notifications_removed: u64,
}

/// Register a device for a user
#[utoipa::path(
    post,
    path = "/api/v1/users/{user_id}/devices",
    tag = "devices",
    params(("user_id" = i32, Path, description = "Owner of the device")),
    request_body = RegisterDeviceRequest,
    responses(
        (status = 201, description = "Device registered", body = ApiResponse<DeviceResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn register_device(
    Path(user_id): Path<i32>,
    State(state): State<AppState>,
    Json(request): Json<RegisterDeviceRequest>,
) -> Result<(StatusCode, Json<ApiResponse<DeviceResponse>>), HandlerError> {
    request.validate().map_err(validation_error)?;

    let device = devices::register_device(&state.db, state.clock.as_ref(), user_id, &request.name)
        .await
        .map_err(engine_error)?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(DeviceResponse::from(device), "Device registered successfully")),
    ))
}

/// Create a notification preference for a device
#[utoipa::path(
    post,
    path = "/api/v1/users/{user_id}/devices/{device_id}/preferences",
    tag = "devices",
    params(
        ("user_id" = i32, Path, description = "Owner of the device"),
        ("device_id" = i32, Path, description = "Device to configure")
    ),
    request_body = CreatePreferenceRequest,
    responses(
        (status = 201, description = "Preference created", body = ApiResponse<PreferenceResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 403, description = "Device belongs to another user", body = ErrorResponse),
        (status = 404, description = "Device not found", body = ErrorResponse),
        (status = 409, description = "Push-enabled device limit reached", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request))]
pub async fn create_preference(
    Path((user_id, device_id)): Path<(i32, i32)>,
    State(state): State<AppState>,
    Json(request): Json<CreatePreferenceRequest>,
) -> Result<(StatusCode, Json<ApiResponse<PreferenceResponse>>), HandlerError> {
    request.validate().map_err(validation_error)?;

    let preference = devices::create_preference(
        &state.db,
        user_id,
        device_id,
        PreferenceRequest {
            push_enabled: request.push_enabled.unwrap_or(true),
            subscription: request.subscription,
            days_before_notify: request.days_before_notify,
        },
    )
    .await
    .map_err(engine_error)?;

    info!("Preference {} created for device {}", preference.id, device_id);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(
            PreferenceResponse::from(preference),
            "Preference created successfully",
        )),
    ))
}

/// Unsubscribe a device from push notifications
///
/// Removes the device's preferences and the user's notifications.
#[utoipa::path(
    delete,
    path = "/api/v1/users/{user_id}/devices/{device_id}/subscription",
    tag = "devices",
    params(
        ("user_id" = i32, Path, description = "Owner of the device"),
        ("device_id" = i32, Path, description = "Device to unsubscribe")
    ),
    responses(
        (status = 200, description = "Device unsubscribed", body = ApiResponse<UnsubscribeResponse>),
        (status = 403, description = "Device belongs to another user", body = ErrorResponse),
        (status = 404, description = "Device not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn unsubscribe_device(
    Path((user_id, device_id)): Path<(i32, i32)>,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<ApiResponse<UnsubscribeResponse>>), HandlerError> {
    let outcome = devices::unsubscribe_device(&state.db, user_id, device_id)
        .await
        .map_err(engine_error)?;

    let response = UnsubscribeResponse {
        preferences_removed: outcome.preferences_removed,
        notifications_removed: outcome.notifications_removed,
    };
    Ok((StatusCode::OK, Json(ApiResponse::ok(response, "Device unsubscribed successfully"))))
}
