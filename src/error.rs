use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::repositories::user_repository::RepositoryError;
use crate::services::{CheckInServiceError, UserServiceError};

// Type alias for Result with our AppError
pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("User not found")]
    UserNotFound,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal server error")]
    InternalError,
}

impl From<UserServiceError> for AppError {
    fn from(err: UserServiceError) -> Self {
        match err {
            UserServiceError::MissingName | UserServiceError::InvalidEmail => {
                AppError::Validation(err.to_string())
            }
            UserServiceError::UserNotFound => AppError::UserNotFound,
            UserServiceError::TokenCollision => AppError::InternalError,
            UserServiceError::RepositoryError(e) => AppError::Repository(e),
        }
    }
}

impl From<CheckInServiceError> for AppError {
    fn from(err: CheckInServiceError) -> Self {
        match err {
            CheckInServiceError::UserNotFound => AppError::UserNotFound,
            CheckInServiceError::RepositoryError(e) => AppError::Repository(e),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let AppError::Database(_) | AppError::Repository(_) | AppError::InternalError = &self {
            tracing::error!("Request failed: {}", self);
        }

        let (status, error_message) = match self {
            AppError::UserNotFound => (StatusCode::NOT_FOUND, "User not found".to_string()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Database(_) | AppError::Repository(_) | AppError::InternalError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        (status, error_message).into_response()
    }
}
