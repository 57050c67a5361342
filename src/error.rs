use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use validator::ValidationErrors;

use crate::{dao::storage::StorageError, payments::PaymentError};

/// Failures surfaced by the service layer.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The play store could not serve the request.
    #[error("storage unavailable")]
    Unavailable(#[from] StorageError),
    /// The caller sent something the game rules reject.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// The play is not in a state that allows the action.
    #[error("invalid state: {0}")]
    InvalidState(String),
    /// Unknown play or user.
    #[error("not found: {0}")]
    NotFound(String),
    /// The payment gateway refused or could not settle a transfer. Never retried.
    #[error("payment failed")]
    PaymentFailed(#[from] PaymentError),
}

/// Errors rendered as HTTP responses with a JSON `{ "message": ... }` body.
#[derive(Debug, Error)]
pub enum AppError {
    /// 400.
    #[error("bad request: {0}")]
    BadRequest(String),
    /// 402.
    #[error("payment required: {0}")]
    PaymentRequired(String),
    /// 404.
    #[error("not found: {0}")]
    NotFound(String),
    /// 409.
    #[error("conflict: {0}")]
    Conflict(String),
    /// 503.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
    /// 500.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::PaymentRequired(_) => StatusCode::PAYMENT_REQUIRED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(err: ValidationErrors) -> Self {
        AppError::BadRequest(format!("validation failed: {err}"))
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Unavailable(StorageError::Corrupted { id, reason }) => {
                AppError::Internal(format!("record `{id}` is corrupted: {reason}"))
            }
            ServiceError::Unavailable(source) => AppError::ServiceUnavailable(source.to_string()),
            ServiceError::InvalidInput(message) => AppError::BadRequest(message),
            ServiceError::InvalidState(message) => AppError::Conflict(message),
            ServiceError::NotFound(message) => AppError::NotFound(message),
            ServiceError::PaymentFailed(source) => AppError::PaymentRequired(source.to_string()),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            message: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}
