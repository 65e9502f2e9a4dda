//! Error surface shared by every handler in the API.
//!
//! Validation and malformed-input problems map to 4xx status codes and are
//! rejected before any side effect takes place. Failures of the remote document
//! library map to 502; everything else is a generic 500. Bodies are always
//! `{"error": "..."}` JSON.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing required field, unknown template, malformed signature payload.
    #[error("{0}")]
    Validation(String),

    /// Missing, invalid or expired bearer token, or bad credentials.
    #[error("unauthorized")]
    Unauthorized,

    /// Valid token, insufficient role.
    #[error("forbidden")]
    Forbidden,

    #[error("{0} not found")]
    NotFound(&'static str),

    /// The remote document library rejected or never answered an upload.
    /// Nothing is retried; the whole request aborts.
    #[error("storage upload failed: {0}")]
    Storage(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("pdf rendering failed: {0}")]
    Render(String),

    #[error("{0}")]
    Internal(String),
}

impl From<lopdf::Error> for ApiError {
    fn from(err: lopdf::Error) -> Self {
        ApiError::Render(err.to_string())
    }
}

impl From<bcrypt::BcryptError> for ApiError {
    fn from(err: bcrypt::BcryptError) -> Self {
        ApiError::Internal(format!("password hashing failed: {}", err))
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Storage(_) => StatusCode::BAD_GATEWAY,
            ApiError::Database(_) | ApiError::Render(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({ "error": self.to_string() }))
    }
}
