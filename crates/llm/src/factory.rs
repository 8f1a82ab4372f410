//! LLM provider factory.
//!
//! Builds a completion client from the resolved configuration.

use crate::client::LlmClient;
use crate::providers::{OllamaClient, OpenAiClient};
use crate::types::ProviderType;
use rag_core::{AppError, AppResult};
use std::sync::Arc;
use std::time::Duration;

/// Create an LLM client based on the provider name.
///
/// # Arguments
/// * `provider` - Provider identifier ("openai", "ollama")
/// * `endpoint` - Optional custom base URL
/// * `api_key` - API key (required by hosted providers)
/// * `timeout` - Optional per-request timeout
///
/// # Errors
/// Returns `AppError::Llm` if the provider is unknown or a required key is missing.
pub fn create_client(
    provider: &str,
    endpoint: Option<&str>,
    api_key: Option<&str>,
    timeout: Option<Duration>,
) -> AppResult<Arc<dyn LlmClient>> {
    let provider_type = ProviderType::parse(provider)
        .ok_or_else(|| AppError::Llm(format!("Unknown provider: {}", provider)))?;
    let base_url = endpoint.unwrap_or(provider_type.default_endpoint());

    match provider_type {
        ProviderType::Ollama => {
            let client = match timeout {
                Some(timeout) => OllamaClient::with_timeout(base_url, timeout)?,
                None => OllamaClient::with_base_url(base_url),
            };
            Ok(Arc::new(client))
        }
        ProviderType::OpenAI => {
            let api_key = api_key.ok_or_else(|| {
                AppError::Llm("OpenAI provider requires API key".to_string())
            })?;
            Ok(Arc::new(OpenAiClient::with_base_url(base_url, api_key, timeout)?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_ollama_client() {
        let client = create_client("ollama", None, None, None).unwrap();
        assert_eq!(client.provider_name(), "ollama");
    }

    #[test]
    fn test_create_ollama_with_custom_endpoint() {
        let client = create_client(
            "ollama",
            Some("http://localhost:8080"),
            None,
            Some(Duration::from_secs(5)),
        );
        assert!(client.is_ok());
    }

    #[test]
    fn test_create_openai_client() {
        let client = create_client("openai", None, Some("sk-test"), None).unwrap();
        assert_eq!(client.provider_name(), "openai");
    }

    #[test]
    fn test_openai_requires_api_key() {
        match create_client("openai", None, None, None) {
            Err(err) => assert!(err.to_string().contains("OpenAI provider requires API key")),
            Ok(_) => panic!("Expected error for OpenAI without API key"),
        }
    }

    #[test]
    fn test_unknown_provider() {
        match create_client("unknown", None, None, None) {
            Err(err) => assert!(err.to_string().contains("Unknown provider")),
            Ok(_) => panic!("Expected error for unknown provider"),
        }
    }
}
