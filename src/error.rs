//!
//! # Custom Error Handling
//!
//! This module defines `AppError`, the only error type that crosses the HTTP
//! boundary. Every variant maps to exactly one status code, and the response
//! body always uses the [`ApiResponse`](crate::response::ApiResponse) envelope
//! with `success: false`.
//!
//! Business errors (`Unauthorized`, `Forbidden`, `NotFound`, ...) carry a
//! message that is safe to show to clients. Server-side failures
//! (`InternalServerError`, `DatabaseError`) carry diagnostic detail that is
//! logged and then replaced by a generic message in the response.

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use std::fmt;
use validator::ValidationErrors;

use crate::repository::StoreError;
use crate::response::ApiResponse;

/// Message returned to clients for any server-side failure.
pub const GENERIC_ERROR_MESSAGE: &str = "something went wrong";

/// Represents all possible errors that can occur within the application.
#[derive(Debug)]
pub enum AppError {
    /// Missing, invalid or revoked credentials (HTTP 401).
    Unauthorized(String),
    /// The caller is authenticated but the request cannot be honoured for
    /// this identity (HTTP 403).
    Forbidden(String),
    /// Malformed request: undecodable body, bad path or query (HTTP 400).
    BadRequest(String),
    /// Requested resource does not exist or is not owned by the caller (HTTP 404).
    NotFound(String),
    /// Well-formed request rejected by a business rule, e.g. a duplicate email (HTTP 422).
    UnprocessableEntity(String),
    /// Input failed field validation (HTTP 422).
    ValidationError(String),
    /// Unexpected server-side failure (HTTP 500). The message is logged, not returned.
    InternalServerError(String),
    /// Failure reported by a backing store (HTTP 500). The message is logged, not returned.
    DatabaseError(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            AppError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            AppError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            AppError::UnprocessableEntity(msg) => write!(f, "Unprocessable Entity: {}", msg),
            AppError::ValidationError(msg) => write!(f, "Validation Error: {}", msg),
            AppError::InternalServerError(msg) => write!(f, "Internal Server Error: {}", msg),
            AppError::DatabaseError(msg) => write!(f, "Database Error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl AppError {
    /// The text placed in the `error` field of the response envelope.
    fn public_message(&self) -> &str {
        match self {
            AppError::Unauthorized(msg)
            | AppError::Forbidden(msg)
            | AppError::BadRequest(msg)
            | AppError::NotFound(msg)
            | AppError::UnprocessableEntity(msg)
            | AppError::ValidationError(msg) => msg,
            AppError::InternalServerError(_) | AppError::DatabaseError(_) => GENERIC_ERROR_MESSAGE,
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::UnprocessableEntity(_) | AppError::ValidationError(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AppError::InternalServerError(_) | AppError::DatabaseError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let AppError::InternalServerError(detail) | AppError::DatabaseError(detail) = self {
            log::error!("{}: {}", self.status_code(), detail);
        }
        HttpResponse::build(self.status_code()).json(ApiResponse::failure(self.public_message()))
    }
}

/// Store lookups that find nothing become `NotFound`; a uniqueness conflict is
/// a business rule violation; anything else is a backend failure.
impl From<StoreError> for AppError {
    fn from(error: StoreError) -> AppError {
        match error {
            StoreError::NotFound => AppError::NotFound("record not found".into()),
            StoreError::Conflict(msg) => AppError::UnprocessableEntity(msg),
            StoreError::Backend(msg) => AppError::DatabaseError(msg),
        }
    }
}

/// Converts `validator::ValidationErrors` into `AppError::ValidationError`.
///
/// The detailed validation messages are preserved.
impl From<ValidationErrors> for AppError {
    fn from(error: ValidationErrors) -> AppError {
        AppError::ValidationError(error.to_string())
    }
}
