//! Error types for the RAG API service.
//!
//! This module defines a unified error enum that covers every error category
//! in the service: configuration, I/O, completion service, knowledge store
//! and prompt errors.

use thiserror::Error;

/// Unified error type for the RAG API service.
///
/// All library functions return `Result<T, AppError>`. Transport status codes
/// are chosen from the variant at the HTTP boundary only.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Completion service errors
    #[error("LLM error: {0}")]
    Llm(String),

    /// Document store and embedding errors
    #[error("Knowledge error: {0}")]
    Knowledge(String),

    /// Prompt system errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl AppError {
    /// Whether this error originated in the completion service.
    pub fn is_llm(&self) -> bool {
        matches!(self, AppError::Llm(_))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AppError::Llm("rate limited".to_string());
        assert_eq!(err.to_string(), "LLM error: rate limited");
        assert!(err.is_llm());
        assert!(!AppError::Knowledge("disk full".to_string()).is_llm());
    }

    #[test]
    fn test_from_serde_json() {
        let err: AppError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert!(matches!(err, AppError::Serialization(_)));
    }
}
