use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::{error, warn};

use crate::checkout::CheckoutError;
use crate::models::NewEventError;
use crate::store::StoreError;
use crate::utils::response::error as error_response;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    CheckoutRejected(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Store error")]
    Store(#[from] StoreError),

    #[error("Internal server error")]
    Internal(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::CheckoutRejected(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Auth(_) => "AUTH_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::CheckoutRejected(_) => "CHECKOUT_REJECTED",
            AppError::Conflict(_) => "CONFLICT",
            AppError::Store(_) => "STORE_ERROR",
            AppError::Internal(_) => "INTERNAL_SERVER_ERROR",
        }
    }

    fn log(&self) {
        match self {
            AppError::Store(e) => {
                error!(error = ?e, "Store error");
            }
            AppError::Internal(msg) => {
                error!(message = %msg, "Internal error");
            }
            AppError::Validation(msg)
            | AppError::Auth(msg)
            | AppError::NotFound(msg)
            | AppError::CheckoutRejected(msg)
            | AppError::Conflict(msg) => {
                warn!(error = ?self, message = %msg, "Request rejected");
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();

        // Log internal details
        self.log();

        // Only expose high-level messages to the client
        let public_message = match &self {
            AppError::Validation(msg)
            | AppError::Auth(msg)
            | AppError::NotFound(msg)
            | AppError::CheckoutRejected(msg)
            | AppError::Conflict(msg) => msg.clone(),
            AppError::Store(_) => "A storage error occurred".to_string(),
            AppError::Internal(_) => "An internal error occurred".to_string(),
        };

        error_response(code, public_message, None, status)
    }
}

impl From<CheckoutError> for AppError {
    fn from(error: CheckoutError) -> Self {
        match error {
            CheckoutError::Rejected(failure) => AppError::CheckoutRejected(failure.to_string()),
            conflict @ CheckoutError::Conflict(_) => AppError::Conflict(conflict.to_string()),
            CheckoutError::Store(e) => AppError::Store(e),
        }
    }
}

impl From<NewEventError> for AppError {
    fn from(error: NewEventError) -> Self {
        AppError::Validation(error.to_string())
    }
}
