// src/error.rs

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

/// Global Application Error Enum.
///
/// The engine raises the domain kinds; the HTTP layer maps them to status
/// codes in `into_response`. Validation kinds are always raised before the
/// first write of an operation.
#[derive(Debug, Error)]
pub enum AppError {
    /// Target type unsupported, or the target does not exist.
    #[error("invalid target")]
    InvalidTarget,

    /// `reply_id` points at a comment that does not exist on this target.
    #[error("parent comment not found")]
    ParentNotFound,

    #[error("reply depth {depth} exceeds maximum {max}")]
    DepthExceeded { depth: i64, max: i64 },

    /// Caller is not the owning author.
    #[error("forbidden")]
    Forbidden,

    #[error("not found")]
    NotFound,

    /// Mutation attempted without a resolved identity.
    #[error("unauthorized")]
    Unauthorized,

    /// A counter step failed after its mutation succeeded. The surrounding
    /// transaction is never committed.
    #[error("internal inconsistency: {0}")]
    InternalInconsistency(String),

    // 400 Bad Request
    #[error("{0}")]
    BadRequest(String),

    #[error("configuration error: {0}")]
    Config(String),

    /// A token could not be issued.
    #[error("token error: {0}")]
    Token(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Converts the error into a JSON response with appropriate HTTP status code.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::InvalidTarget | AppError::BadRequest(_) | AppError::DepthExceeded { .. } => {
                StatusCode::BAD_REQUEST
            }
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::NotFound | AppError::ParentNotFound => StatusCode::NOT_FOUND,
            AppError::InternalInconsistency(_)
            | AppError::Config(_)
            | AppError::Token(_)
            | AppError::Database(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let error_message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("Internal Server Error: {}", self);
            "Internal Server Error".to_string()
        } else {
            self.to_string()
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_error_kind() {
        let cases = [
            (AppError::InvalidTarget, StatusCode::BAD_REQUEST),
            (AppError::DepthExceeded { depth: 6, max: 5 }, StatusCode::BAD_REQUEST),
            (AppError::Unauthorized, StatusCode::UNAUTHORIZED),
            (AppError::Forbidden, StatusCode::FORBIDDEN),
            (AppError::ParentNotFound, StatusCode::NOT_FOUND),
            (
                AppError::Token("clock went backwards".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                AppError::InternalInconsistency("comment count".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }

    #[test]
    fn token_errors_are_not_counter_failures() {
        let err = AppError::Token("clock went backwards".to_string());
        assert_eq!(err.to_string(), "token error: clock went backwards");
        assert!(!matches!(err, AppError::InternalInconsistency(_)));
    }
}
