/*
 * Responsibility
 * - AppError: the error every handler returns
 * - IntoResponse (HTTP status + JSON error body)
 * - Conversion from AuthError / RepoError, split into business vs technical failures
 */
use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::repos::error::RepoError;
use crate::services::auth::AuthError;

/// Who can fix a failure.
///
/// - `Business`: the caller (bad credentials, bad token, duplicate username, ...)
/// - `Technical`: the operator (store unreachable, signing failure, ...)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Business,
    Technical,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    InvalidRequest(String),

    /// Every authentication failure, whatever its cause.
    #[error("authentication failed")]
    Unauthorized,

    #[error("access denied")]
    Forbidden,

    #[error("{resource} not found")]
    NotFound {
        code: &'static str,
        resource: &'static str,
    },

    #[error("{message}")]
    Conflict { code: &'static str, message: String },

    #[error("internal server error")]
    Internal,
}

#[derive(Serialize)]
struct ErrorResponseBody {
    error: ErrorBody,
}

#[derive(Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
}

impl AppError {
    pub fn conflict(code: &'static str, message: impl Into<String>) -> Self {
        Self::Conflict {
            code,
            message: message.into(),
        }
    }

    pub fn user_not_found() -> Self {
        Self::NotFound {
            code: "USER_NOT_FOUND",
            resource: "user",
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            AppError::Internal => ErrorCategory::Technical,
            _ => ErrorCategory::Business,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            AppError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST"),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            AppError::Forbidden => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            AppError::NotFound { code, .. } => (StatusCode::NOT_FOUND, *code),
            AppError::Conflict { code, .. } => (StatusCode::CONFLICT, *code),
            AppError::Internal => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL"),
        };

        let body = ErrorResponseBody {
            error: ErrorBody {
                code,
                message: self.to_string(),
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        match e.category() {
            // The specific kind stays in the logs, never in the response.
            ErrorCategory::Business => AppError::Unauthorized,
            ErrorCategory::Technical => {
                error!(error = %e, "authentication backend failure");
                AppError::Internal
            }
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(e: JsonRejection) -> Self {
        AppError::InvalidRequest(e.body_text())
    }
}

impl From<RepoError> for AppError {
    fn from(e: RepoError) -> Self {
        match e {
            RepoError::Conflict => AppError::conflict("CONFLICT", "resource already exists"),
            RepoError::RoleNotFound(role) => {
                error!(role = %role, "required role is not provisioned");
                AppError::Internal
            }
            RepoError::Db(err) => {
                error!(error = %err, "database error");
                AppError::Internal
            }
        }
    }
}
