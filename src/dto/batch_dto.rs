use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;
use utoipa::ToSchema;

use crate::models::batch::{BatchResult, BatchSummary};

pub const NO_CONTENT_MESSAGE: &str = "No books with content found";
pub const FULLY_COVERED_MESSAGE: &str = "All books already have quizzes";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, ToSchema)]
pub struct BatchRequest {
    /// Maximum number of books to process in this run.
    #[serde(default, deserialize_with = "lenient_limit")]
    #[schema(value_type = Option<i64>)]
    pub limit: Option<i64>,
}

/// Accepts any JSON number. Fractional limits round up, so `2.5` still
/// covers a third book. Anything that is not a number counts as absent.
fn lenient_limit<'de, D>(deserializer: D) -> std::result::Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<JsonValue>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(limit_from_json))
}

fn limit_from_json(value: &JsonValue) -> Option<i64> {
    let JsonValue::Number(n) = value else {
        return None;
    };
    n.as_i64()
        .or_else(|| n.as_u64().map(|_| i64::MAX))
        .or_else(|| n.as_f64().map(|f| f.ceil() as i64))
}

impl BatchRequest {
    /// Reads an optional JSON body. Anything that is not a valid request,
    /// including an empty body, falls back to the defaults.
    pub fn from_body(body: &[u8]) -> Self {
        serde_json::from_slice(body).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BatchSummaryResponse {
    pub success: bool,
    pub books_processed: usize,
    pub quizzes_generated: usize,
    pub books_with_new_quizzes: usize,
    pub books_with_errors: usize,
    pub results: Vec<BatchResult>,
}

impl From<BatchSummary> for BatchSummaryResponse {
    fn from(summary: BatchSummary) -> Self {
        Self {
            success: true,
            books_processed: summary.books_processed,
            quizzes_generated: summary.quizzes_generated,
            books_with_new_quizzes: summary.books_with_new_quizzes,
            books_with_errors: summary.books_with_errors,
            results: summary.results,
        }
    }
}

/// Informational reply for runs that found nothing to do.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BatchNoticeResponse {
    pub message: String,
    pub books_processed: usize,
}

impl BatchNoticeResponse {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
            books_processed: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}
