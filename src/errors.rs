// ABOUTME: Centralized error taxonomy shared by the HTTP edge, broker, and event pipelines
// ABOUTME: Maps every fault in the system onto one of eight kinds with a stable status code
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! # Unified Error Handling System
//!
//! Every fault raised anywhere in the core is one of the [`ErrorKind`] variants below.
//! Handlers propagate [`AppError`] by value up to the Axum edge, which is the only place
//! that knows about HTTP status codes.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

/// Fault taxonomy. Every error in the system is exactly one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Invalid input shape, missing required header, tenant client requested without gym context.
    BadRequest,
    /// No, expired, or invalid bearer token.
    Unauthorized,
    /// Failed role or feature-flag check; cross-tenant access attempt.
    Forbidden,
    /// Entity missing or soft-deleted.
    NotFound,
    /// Unique constraint violation, duplicate period, already-settled transition.
    Conflict,
    /// Semantic validation failure that passed shape validation.
    UnprocessableEntity,
    /// Pool exhaustion, upstream timeout; caller may retry.
    Transient,
    /// Anything else; logged with request id.
    Internal,
}

impl ErrorKind {
    /// HTTP status code this kind maps to at the edge.
    #[must_use]
    pub const fn status_code(self) -> StatusCode {
        match self {
            Self::BadRequest => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Conflict => StatusCode::CONFLICT,
            Self::UnprocessableEntity => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Transient => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// The one error type passed by value from domain code up to the HTTP edge.
#[derive(Debug, Clone, Error)]
#[error("{kind:?}: {message}")]
pub struct AppError {
    /// Which of the eight fault kinds this is.
    pub kind: ErrorKind,
    /// Human-readable message. Sanitized before reaching the client for internal kinds.
    pub message: String,
    /// Request id for correlation with logs, attached by the tracing middleware.
    pub request_id: Option<String>,
}

impl AppError {
    /// Build a new error of the given kind.
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            request_id: None,
        }
    }

    /// Attach a request id, typically done by the tracing middleware just before response.
    #[must_use]
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    /// Message safe to send to the client. Internal/Transient faults never leak detail.
    #[must_use]
    pub fn sanitized_message(&self) -> String {
        match self.kind {
            ErrorKind::Internal | ErrorKind::Transient => {
                "An unexpected error occurred".to_owned()
            }
            _ => self.message.clone(),
        }
    }

    /// Bad request shorthand.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::BadRequest, message)
    }

    /// No principal, or an invalid/expired bearer token.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unauthorized, message)
    }

    /// Role, feature-flag, or tenant-scope check failed.
    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Forbidden, message)
    }

    /// Entity missing or soft-deleted.
    #[must_use]
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, format!("{} not found", resource.into()))
    }

    /// Constraint violation or already-settled state transition.
    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    /// Semantic validation failure.
    #[must_use]
    pub fn unprocessable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnprocessableEntity, message)
    }

    /// Retryable transient failure (pool exhaustion, upstream timeout).
    #[must_use]
    pub fn transient(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Transient, message)
    }

    /// Catch-all for anything that isn't one of the above.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }
}

/// Result type alias used throughout the crate.
pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: ErrorKind,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    request_id: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.kind.status_code();
        if status.is_server_error() {
            tracing::error!(kind = ?self.kind, request_id = ?self.request_id, "{}", self.message);
        } else {
            tracing::warn!(kind = ?self.kind, request_id = ?self.request_id, "{}", self.message);
        }

        let body = ErrorBody {
            error: self.kind,
            message: self.sanitized_message(),
            request_id: self.request_id,
        };
        (status, Json(body)).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> Self {
        match &error {
            sqlx::Error::RowNotFound => Self::not_found("row"),
            sqlx::Error::Database(db_err) => {
                if db_err.is_unique_violation() || db_err.is_foreign_key_violation() {
                    Self::conflict(db_err.message().to_owned())
                } else {
                    Self::internal(format!("database error: {db_err}"))
                }
            }
            sqlx::Error::PoolTimedOut | sqlx::Error::Io(_) => {
                Self::transient(format!("database unavailable: {error}"))
            }
            other => Self::internal(format!("database error: {other}")),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        Self::bad_request(format!("JSON error: {error}"))
    }
}

impl From<uuid::Error> for AppError {
    fn from(error: uuid::Error) -> Self {
        Self::bad_request(format!("UUID error: {error}"))
    }
}

impl From<chrono::ParseError> for AppError {
    fn from(error: chrono::ParseError) -> Self {
        Self::bad_request(format!("date parse error: {error}"))
    }
}

impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(error: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind as JwtKind;
        match error.kind() {
            JwtKind::ExpiredSignature => Self::unauthorized("token expired"),
            _ => Self::unauthorized(format!("invalid token: {error}")),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::internal(error.to_string())
    }
}
