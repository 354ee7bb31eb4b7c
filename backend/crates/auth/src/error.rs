//! Auth Error Types
//!
//! This module provides auth-specific error variants that integrate
//! with the unified `kernel::error::AppError` system.
//!
//! Every "who are you?" failure renders the same 401 body, so callers
//! cannot tell an unknown identifier from a wrong password, or an expired
//! session from one that never existed.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use thiserror::Error;

/// Auth-specific result type alias
pub type AuthResult<T> = Result<T, AuthError>;

/// Auth-specific error variants
#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown identifier or wrong password
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// No session, expired session, unknown session, or bad bearer token
    #[error("Session not found or expired")]
    SessionInvalid,

    /// Endpoint called with the wrong HTTP method
    #[error("Method not allowed")]
    MethodNotAllowed,

    /// Request body could not be parsed
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Credential or session storage failed (distinct from "not found")
    #[error("Store unavailable: {0}")]
    StoreUnavailable(#[from] sqlx::Error),

    /// A stored password hash could not be parsed
    #[error("Stored password hash is malformed")]
    MalformedHash,

    /// The OS entropy source failed; not retriable
    #[error("Entropy source unavailable")]
    EntropyUnavailable,

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::InvalidCredentials | AuthError::SessionInvalid => StatusCode::UNAUTHORIZED,
            AuthError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            AuthError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AuthError::StoreUnavailable(_)
            | AuthError::MalformedHash
            | AuthError::EntropyUnavailable
            | AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::InvalidCredentials | AuthError::SessionInvalid => ErrorKind::Unauthorized,
            AuthError::MethodNotAllowed => ErrorKind::MethodNotAllowed,
            AuthError::BadRequest(_) => ErrorKind::BadRequest,
            AuthError::StoreUnavailable(_)
            | AuthError::MalformedHash
            | AuthError::EntropyUnavailable
            | AuthError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    /// Convert to AppError
    ///
    /// Unauthorized and server-side variants use fixed messages; internal
    /// details stay in the logs.
    pub fn to_app_error(&self) -> AppError {
        match self.kind() {
            ErrorKind::Unauthorized => AppError::unauthorized("Unauthorized"),
            ErrorKind::InternalServerError => AppError::internal("Internal server error"),
            kind => AppError::new(kind, self.to_string()),
        }
    }

    /// Log the error with appropriate level
    fn log(&self) {
        match self {
            AuthError::StoreUnavailable(e) => {
                tracing::error!(error = %e, "Auth store unavailable");
            }
            AuthError::MalformedHash => {
                tracing::error!("Malformed password hash in credential store");
            }
            AuthError::EntropyUnavailable => {
                tracing::error!("OS entropy source failed while creating a session");
            }
            AuthError::Internal(msg) => {
                tracing::error!(message = %msg, "Auth internal error");
            }
            AuthError::InvalidCredentials => {
                tracing::warn!("Invalid login attempt");
            }
            _ => {
                tracing::debug!(error = %self, "Auth error");
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}

impl From<AppError> for AuthError {
    fn from(err: AppError) -> Self {
        match err.kind() {
            ErrorKind::BadRequest => AuthError::BadRequest(err.message().to_string()),
            _ => AuthError::Internal(err.to_string()),
        }
    }
}
