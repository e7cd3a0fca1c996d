//! HTTP error mapping for the API surface.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::errors::Error;

/// Error envelope returned by every failing endpoint.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiErrorBody {
    pub error: String,
    pub message: String,
}

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ApiErrorBody,
}

impl ApiError {
    pub fn new(status: StatusCode, error: impl Into<String>, message: impl Into<String>) -> Self {
        Self { status, body: ApiErrorBody { error: error.into(), message: message.into() } }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "bad_request", message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "unauthorized", message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, "forbidden", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "not_found", message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, "conflict", message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match &err {
            Error::Validation { message, .. } => ApiError::bad_request(message.clone()),
            Error::Auth { message, .. } => ApiError::unauthorized(message.clone()),
            Error::Forbidden { message } => ApiError::forbidden(message.clone()),
            Error::NotFound { resource_type, id } => {
                ApiError::not_found(format!("{} '{}' not found", resource_type, id))
            }
            Error::Conflict { message, .. } => ApiError::conflict(message.clone()),
            Error::Database { source, .. } => {
                // Races past the pre-insert existence check land on the
                // unique index; surface those as conflicts, not 500s.
                if let Some(db_err) = source.as_database_error() {
                    if db_err.code().as_deref() == Some("2067") {
                        return ApiError::conflict("Resource already exists");
                    }
                }
                tracing::error!(error = %err, "Database error while handling request");
                ApiError::internal("Internal server error")
            }
            _ => {
                tracing::error!(error = %err, "Unexpected error while handling request");
                ApiError::internal("Internal server error")
            }
        }
    }
}
