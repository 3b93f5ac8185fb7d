// src/errors.rs

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Record not found: {0}")]
    NotFound(String),

    // Auth errors
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Invalid token")]
    InvalidToken,

    // Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    // HRMS backend errors
    #[error("HRMS backend error: {message}")]
    Backend { status: Option<u16>, message: String },

    #[error("Entry saved but payment failed: {message}")]
    PaymentFailed { status: Option<u16>, message: String },

    // Lifecycle errors
    #[error("Payroll entry for assignment {assignment_id} is already paid")]
    AlreadyPaid { assignment_id: i64 },

    #[error("All employees are already marked as paid for this period")]
    NothingToPay,

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized(_) | AppError::InvalidToken => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::AlreadyPaid { .. } | AppError::NothingToPay => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AppError::Backend { status, .. } | AppError::PaymentFailed { status, .. } => {
                upstream_status(*status)
            }
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Re-labels a backend failure of the pay call, which always follows a
    /// successful persist.
    pub fn into_payment_failed(self) -> Self {
        match self {
            AppError::Backend { status, message } => AppError::PaymentFailed { status, message },
            other => other,
        }
    }
}

// Backend 4xx rejections are passed through; anything else is a bad gateway.
fn upstream_status(status: Option<u16>) -> StatusCode {
    status
        .and_then(|code| StatusCode::from_u16(code).ok())
        .filter(StatusCode::is_client_error)
        .unwrap_or(StatusCode::BAD_GATEWAY)
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Backend {
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = json!({
            "error": {
                "code": status.as_u16(),
                "message": self.to_string(),
            }
        });
        (status, Json(body)).into_response()
    }
}

// Convenience alias
pub type AppResult<T> = Result<T, AppError>;
