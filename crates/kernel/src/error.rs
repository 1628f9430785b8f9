//! Application error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::content::DocumentError;

/// Application errors.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("internal server error")]
    Internal(#[from] anyhow::Error),

    #[error("not found")]
    NotFound,

    #[error("unauthorized")]
    Unauthorized,

    #[error("forbidden")]
    Forbidden,

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("conflict: {0}")]
    InvariantViolation(String),

    #[error("malformed document: {0}")]
    MalformedDocument(String),

    #[error("database error")]
    Database(#[from] sqlx::Error),
}

impl From<DocumentError> for AppError {
    fn from(err: DocumentError) -> Self {
        match err {
            DocumentError::NotFound => AppError::NotFound,
            DocumentError::InvariantViolation(msg) => AppError::InvariantViolation(msg.to_string()),
            DocumentError::MalformedDocument(msg) => AppError::MalformedDocument(msg),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::InvariantViolation(_) => StatusCode::CONFLICT,
            AppError::MalformedDocument(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        // Internal failures log the detail and answer with a vague message.
        let body = match &self {
            AppError::Internal(e) => {
                tracing::error!(error = %e, "internal server error");
                "internal server error".to_string()
            }
            AppError::Database(e) => {
                tracing::error!(error = %e, "database error");
                "internal server error".to_string()
            }
            _ => self.to_string(),
        };

        (status, body).into_response()
    }
}

/// Result type alias using AppError.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn document_errors_map_to_app_errors() {
        assert!(matches!(
            AppError::from(DocumentError::NotFound),
            AppError::NotFound
        ));
        assert!(matches!(
            AppError::from(DocumentError::InvariantViolation("x")),
            AppError::InvariantViolation(_)
        ));
        assert!(matches!(
            AppError::from(DocumentError::MalformedDocument("bad".to_string())),
            AppError::MalformedDocument(_)
        ));
    }
}
