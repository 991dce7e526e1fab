use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Json},
};
use serde_json::json;

pub type Result<T> = std::result::Result<T, Error>;

pub const BATCH_FAILURE_DETAILS: &str = "Failed to batch generate quizzes";

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Too many requests")]
    RateLimited { retry_after_secs: u64 },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A backfill run that could not complete. Carries the message of the
    /// underlying failure.
    #[error("{0}")]
    BatchFailed(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn batch_failed(err: Error) -> Self {
        match err {
            Error::BatchFailed(msg) => Error::BatchFailed(msg),
            other => Error::BatchFailed(other.to_string()),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        match self {
            Error::Unauthorized(_) => {
                (StatusCode::UNAUTHORIZED, Json(json!({ "error": self.to_string() })))
                    .into_response()
            }
            Error::Forbidden(_) => {
                (StatusCode::FORBIDDEN, Json(json!({ "error": self.to_string() }))).into_response()
            }
            Error::RateLimited { retry_after_secs } => (
                StatusCode::TOO_MANY_REQUESTS,
                [(header::RETRY_AFTER, retry_after_secs.to_string())],
                Json(json!({ "error": "rate_limit_exceeded" })),
            )
                .into_response(),
            Error::BatchFailed(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": msg, "details": BATCH_FAILURE_DETAILS })),
            )
                .into_response(),
            Error::Database(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": err.to_string() })),
            )
                .into_response(),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "An unexpected error occurred" })),
            )
                .into_response(),
        }
    }
}
