use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use mongodb::error::{ErrorKind, WriteFailure, RETRYABLE_WRITE_ERROR};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid credentials")]
    BadCredentials,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Not found")]
    NotFound,

    #[error("Temporarily unavailable: {0}")]
    Retryable(String),

    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("Database error: {0}")]
    Db(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Whether a client may safely repeat the request.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::Retryable(_))
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::BadCredentials | AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Retryable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::InvariantViolation(_) | AppError::Db(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Duplicate key (E11000) on insert or update.
pub fn is_duplicate_key(e: &mongodb::error::Error) -> bool {
    matches!(
        e.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(we)) if we.code == 11000
    )
}

fn is_transient(e: &mongodb::error::Error) -> bool {
    e.contains_label(RETRYABLE_WRITE_ERROR)
        || matches!(
            e.kind.as_ref(),
            ErrorKind::Io(_) | ErrorKind::ServerSelection { .. } | ErrorKind::ConnectionPoolCleared { .. }
        )
}

impl From<mongodb::error::Error> for AppError {
    fn from(e: mongodb::error::Error) -> Self {
        if is_transient(&e) {
            AppError::Retryable(e.to_string())
        } else if is_duplicate_key(&e) {
            AppError::Conflict("duplicate key".into())
        } else {
            AppError::Db(e.to_string())
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let msg = match &self {
            AppError::Validation(s) => s.as_str(),
            AppError::BadCredentials => "invalid credentials",
            AppError::Unauthorized => "unauthorized",
            AppError::Conflict(s) => s.as_str(),
            AppError::NotFound => "not found",
            AppError::Retryable(_) => "temporarily unavailable, retry later",
            AppError::InvariantViolation(detail) => {
                tracing::error!(%detail, "invariant violation");
                "internal error"
            }
            AppError::Db(detail) => {
                tracing::error!(%detail, "database error");
                "database error"
            }
            AppError::Internal(detail) => {
                tracing::error!(%detail, "internal error");
                "internal error"
            }
        };

        let body = Json(json!({ "error": msg }));
        if self.is_retryable() {
            (status, [(header::RETRY_AFTER, "1")], body).into_response()
        } else {
            (status, body).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_failures_share_401() {
        assert_eq!(AppError::BadCredentials.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::NotFound.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn only_retryable_is_retryable() {
        assert!(AppError::Retryable("store timed out".into()).is_retryable());
        assert!(!AppError::Unauthorized.is_retryable());
        assert!(!AppError::BadCredentials.is_retryable());
        assert!(!AppError::InvariantViolation("two edges".into()).is_retryable());
    }

    #[test]
    fn retryable_response_carries_retry_after() {
        let resp = AppError::Retryable("timeout".into()).into_response();
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(resp.headers().get(header::RETRY_AFTER).unwrap(), "1");

        let resp = AppError::Unauthorized.into_response();
        assert!(resp.headers().get(header::RETRY_AFTER).is_none());
    }
}
