use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::response::ApiResponse;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentError {
    WrongType,
    TooLarge,
    StorageFailed,
}

impl AttachmentError {
    fn message(&self) -> &'static str {
        match self {
            AttachmentError::WrongType => "Attachment must be a PDF file",
            AttachmentError::TooLarge => "Attachment exceeds the 5 MiB size limit",
            AttachmentError::StorageFailed => "Failed to store attachment, please try again",
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Authentication required")]
    AuthenticationRequired,

    #[error("{0}")]
    AuthorizationDenied(String),

    #[error("Validation failed: {}", .0.join(", "))]
    ValidationFailed(Vec<String>),

    #[error("A pending {0} request already exists")]
    DuplicatePendingRequest(String),

    #[error("Your cart is empty")]
    EmptyCart,

    #[error("Not enough stock for {0}")]
    InsufficientStock(String),

    #[error("{}", .0.message())]
    AttachmentRejected(AttachmentError),

    #[error("Not Found")]
    NotFound,

    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Database error")]
    Db(#[from] sqlx::Error),

    #[error("Internal Server Error")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let errors = match &self {
            AppError::ValidationFailed(fields) => Some(fields.clone()),
            _ => None,
        };
        let (status, message) = match &self {
            AppError::AuthenticationRequired => (StatusCode::UNAUTHORIZED, self.to_string()),
            AppError::AuthorizationDenied(_) => (StatusCode::FORBIDDEN, self.to_string()),
            AppError::ValidationFailed(_) => (StatusCode::UNPROCESSABLE_ENTITY, self.to_string()),
            AppError::DuplicatePendingRequest(_) => (StatusCode::CONFLICT, self.to_string()),
            AppError::EmptyCart => (StatusCode::BAD_REQUEST, self.to_string()),
            AppError::InsufficientStock(_) => (StatusCode::CONFLICT, self.to_string()),
            AppError::AttachmentRejected(reason) => {
                let status = match reason {
                    AttachmentError::TooLarge => StatusCode::PAYLOAD_TOO_LARGE,
                    _ => StatusCode::BAD_REQUEST,
                };
                (status, self.to_string())
            }
            AppError::NotFound => (StatusCode::NOT_FOUND, self.to_string()),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            // Store failures never leak their cause to the client.
            AppError::Db(err) => {
                tracing::error!(error = %err, "database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Something went wrong. Please try again later.".to_string(),
                )
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Something went wrong. Please try again later.".to_string(),
                )
            }
        };

        let body = ApiResponse::failure(message, errors);

        (status, axum::Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
