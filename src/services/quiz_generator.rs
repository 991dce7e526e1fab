//! Client for the external quiz-generation function.
//!
//! The function creates a quiz for one (book, difficulty) pair and persists
//! it on its own; callers only learn whether that worked.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::error::{Error, Result};
use crate::models::book::Difficulty;

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    /// The function answered but refused or failed the request.
    #[error("{0}")]
    Rejected(String),

    #[error("{0}")]
    Transport(String),

    #[error("request timed out")]
    Timeout,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    pub book_id: uuid::Uuid,
    pub num_questions: u32,
    pub difficulty: Difficulty,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QuizGenerator: Send + Sync {
    async fn generate(&self, request: GenerationRequest) -> std::result::Result<(), GenerationError>;
}

#[derive(Clone)]
pub struct HttpQuizGenerator {
    client: Client,
    endpoint: url::Url,
    service_key: String,
}

impl HttpQuizGenerator {
    pub fn new(client: Client, functions_url: &url::Url, service_key: String) -> Result<Self> {
        let endpoint = endpoint_for(functions_url)?;
        Ok(Self {
            client,
            endpoint,
            service_key,
        })
    }
}

fn endpoint_for(functions_url: &url::Url) -> Result<url::Url> {
    let mut base = functions_url.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join("generate-quiz")
        .map_err(|e| Error::Config(format!("Invalid quiz functions URL: {}", e)))
}

/// Pulls a human readable reason out of a failed function response.
fn rejection_message(status: reqwest::StatusCode, body: &str) -> String {
    serde_json::from_str::<JsonValue>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.as_str().map(str::to_string).or_else(|| {
                    e.get("message").and_then(|m| m.as_str()).map(str::to_string)
                }))
        })
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                format!("generator returned {}", status)
            } else {
                format!("generator returned {}: {}", status, body.trim())
            }
        })
}

#[async_trait]
impl QuizGenerator for HttpQuizGenerator {
    async fn generate(&self, request: GenerationRequest) -> std::result::Result<(), GenerationError> {
        let res = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(&self.service_key)
            .header("apikey", &self.service_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GenerationError::Timeout
                } else {
                    GenerationError::Transport(e.to_string())
                }
            })?;

        let status = res.status();
        if status.is_success() {
            return Ok(());
        }

        let text = res.text().await.unwrap_or_default();
        Err(GenerationError::Rejected(rejection_message(status, &text)))
    }
}
