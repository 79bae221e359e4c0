use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::store::StoreError;

/// Every failure an API request can end in.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("unauthenticated")]
    Unauthenticated,

    #[error("email already registered")]
    DuplicateAccount,

    #[error("too many failed login attempts")]
    TooManyAttempts,

    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn missing_field(field: &str) -> Self {
        AppError::Validation(format!("Missing field: {field}"))
    }

    pub fn invalid_field(field: &str) -> Self {
        AppError::Validation(format!("Invalid field: {field}"))
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidCredentials | AppError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AppError::DuplicateAccount => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::TooManyAttempts => StatusCode::TOO_MANY_REQUESTS,
            AppError::StoreUnavailable(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message sent to the client. Server-side detail never leaves the process.
    pub fn public_message(&self) -> String {
        match self {
            AppError::Validation(msg) => msg.clone(),
            AppError::InvalidCredentials => "Invalid credentials".into(),
            AppError::Unauthenticated => "Unauthorized".into(),
            AppError::DuplicateAccount => "Email already registered".into(),
            AppError::TooManyAttempts => {
                "Too many failed login attempts, try again later".into()
            }
            AppError::StoreUnavailable(_) | AppError::Internal(_) => {
                "Internal Server Error".into()
            }
        }
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::DuplicateEmail => AppError::DuplicateAccount,
            // the user behind a resolved identity is gone
            StoreError::NotFound => AppError::Unauthenticated,
            StoreError::TokenCollision => {
                AppError::Internal("issued token collided with a live token".into())
            }
            StoreError::Unavailable(e) => AppError::StoreUnavailable(format!("{e:#}")),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        }
        (status, Json(json!({ "message": self.public_message() }))).into_response()
    }
}
