pub mod amortizations;
pub mod devices;
pub mod health;
pub mod notifications;
pub mod recurring;
pub mod scheduler;

use axum::{http::StatusCode, response::Json};
use engine::EngineError;
use tracing::{error, warn};
use validator::ValidationErrors;

use crate::schemas::ErrorResponse;

pub type HandlerError = (StatusCode, Json<ErrorResponse>);

pub fn error_response(status: StatusCode, code: &str, error: impl Into<String>) -> HandlerError {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
            code: code.to_string(),
            success: false,
        }),
    )
}

/// Maps service errors onto HTTP statuses and stable error codes.
pub fn engine_error(e: EngineError) -> HandlerError {
    match e {
        EngineError::NotFound { .. } => {
            warn!("{}", e);
            error_response(StatusCode::NOT_FOUND, "NOT_FOUND", e.to_string())
        }
        EngineError::Ownership { .. } => {
            warn!("{}", e);
            error_response(StatusCode::FORBIDDEN, "FORBIDDEN", e.to_string())
        }
        EngineError::LimitReached(_) => {
            warn!("{}", e);
            error_response(StatusCode::CONFLICT, "LIMIT_REACHED", e.to_string())
        }
        EngineError::Conflict(_) => {
            warn!("{}", e);
            error_response(StatusCode::CONFLICT, "CONFLICT", e.to_string())
        }
        EngineError::Validation(_) => {
            warn!("{}", e);
            error_response(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", e.to_string())
        }
        EngineError::Database(_) => {
            error!("{}", e);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "DATABASE_ERROR",
                "Internal database error",
            )
        }
    }
}

pub fn validation_error(e: ValidationErrors) -> HandlerError {
    warn!("Invalid request: {}", e);
    error_response(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", e.to_string())
}
