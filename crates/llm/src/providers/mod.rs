//! Completion provider implementations.

pub mod ollama;
pub mod openai;

pub use ollama::OllamaClient;
pub use openai::OpenAiClient;

use rag_core::{AppError, AppResult};
use std::time::Duration;

/// Build the shared HTTP client used by every provider.
pub(crate) fn http_client(timeout: Option<Duration>) -> AppResult<reqwest::Client> {
    let mut builder = reqwest::Client::builder();
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder
        .build()
        .map_err(|e| AppError::Llm(format!("Failed to create HTTP client: {}", e)))
}

/// Turn a non-success HTTP response into an `AppError::Llm`.
pub(crate) async fn status_error(provider: &str, response: reqwest::Response) -> AppError {
    let status = response.status();
    let error_text = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    AppError::Llm(format!("{} API error ({}): {}", provider, status, error_text))
}
