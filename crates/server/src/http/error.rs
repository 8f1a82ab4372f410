//! HTTP error responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use rag_core::AppError;
use serde_json::json;

pub const LLM_UNAVAILABLE: &str = "LLM service temporarily unavailable";

#[derive(Debug)]
pub enum ApiError {
    /// The completion service failed; upstream detail is not exposed
    LlmUnavailable,

    /// Writing to the store failed
    Storage(String),

    Internal(String),
}

impl ApiError {
    /// Map a failed query. Completion failures become 503.
    pub fn from_query(err: AppError) -> Self {
        if err.is_llm() {
            tracing::error!("Query failed in completion service: {}", err);
            Self::LlmUnavailable
        } else {
            tracing::error!("Query failed: {}", err);
            Self::Internal(err.to_string())
        }
    }

    pub fn from_add(err: AppError) -> Self {
        tracing::error!("Failed to add knowledge: {}", err);
        Self::Storage(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::LlmUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "detail": LLM_UNAVAILABLE })),
            )
                .into_response(),
            ApiError::Storage(message) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "status": "error", "message": message })),
            )
                .into_response(),
            ApiError::Internal(message) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "detail": message })),
            )
                .into_response(),
        }
    }
}
