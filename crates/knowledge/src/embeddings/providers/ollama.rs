//! Ollama embedding provider.
//!
//! Calls `POST {base}/api/embeddings` once per text. The model must already
//! be pulled on the Ollama host.

use crate::embeddings::config::EmbeddingConfig;
use crate::embeddings::normalize;
use crate::embeddings::provider::EmbeddingProvider;
use rag_core::{AppError, AppResult};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
const EMBEDDING_ENDPOINT: &str = "/api/embeddings";
const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct OllamaProvider {
    client: Client,
    base_url: String,
    model: String,
    dimensions: usize,
    normalize: bool,
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

impl OllamaProvider {
    /// Build a provider from configuration. No request is made until the
    /// first embedding.
    pub fn new(config: &EmbeddingConfig) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| {
                AppError::Knowledge(format!("Failed to create HTTP client for Ollama: {}", e))
            })?;

        let base_url = config
            .endpoint
            .as_deref()
            .unwrap_or(DEFAULT_OLLAMA_URL)
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            client,
            base_url,
            model: config.model.clone(),
            dimensions: config.dimensions,
            normalize: config.normalize,
        })
    }

    #[instrument(skip(self, text), fields(text_len = text.len(), model = %self.model))]
    async fn embed_single(&self, text: &str) -> AppResult<Vec<f32>> {
        let url = format!("{}{}", self.base_url, EMBEDDING_ENDPOINT);

        let response = self
            .client
            .post(&url)
            .json(&EmbeddingRequest {
                model: &self.model,
                prompt: text,
            })
            .send()
            .await
            .map_err(|e| AppError::Knowledge(format!("Failed to send request to Ollama: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Knowledge(format!(
                "Ollama embedding error ({}): {}",
                status, body
            )));
        }

        let body: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| AppError::Knowledge(format!("Failed to parse Ollama response: {}", e)))?;

        check_dimensions(&body.embedding, self.dimensions)?;

        let mut embedding = body.embedding;
        if self.normalize {
            normalize(&mut embedding);
        }
        Ok(embedding)
    }
}

fn check_dimensions(embedding: &[f32], expected: usize) -> AppResult<()> {
    if embedding.len() != expected {
        return Err(AppError::Knowledge(format!(
            "Unexpected embedding dimensions: got {}, expected {}",
            embedding.len(),
            expected
        )));
    }
    Ok(())
}

#[async_trait::async_trait]
impl EmbeddingProvider for OllamaProvider {
    fn provider_name(&self) -> &str {
        "ollama"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        debug!("Embedding batch of {} texts", texts.len());

        let mut embeddings = Vec::with_capacity(texts.len());
        for text in texts {
            embeddings.push(self.embed_single(text).await?);
        }
        Ok(embeddings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(endpoint: Option<&str>) -> EmbeddingConfig {
        EmbeddingConfig {
            provider: "ollama".to_string(),
            model: "nomic-embed-text".to_string(),
            dimensions: 768,
            normalize: true,
            endpoint: endpoint.map(String::from),
        }
    }

    #[test]
    fn test_default_base_url() {
        let provider = OllamaProvider::new(&config(None)).unwrap();
        assert_eq!(provider.base_url, "http://localhost:11434");
        assert_eq!(provider.dimensions(), 768);
    }

    #[test]
    fn test_custom_base_url_trims_slash() {
        let provider = OllamaProvider::new(&config(Some("http://gpu-box:11434/"))).unwrap();
        assert_eq!(provider.base_url, "http://gpu-box:11434");
    }

    #[test]
    fn test_check_dimensions() {
        assert!(check_dimensions(&[0.0; 4], 4).is_ok());
        let err = check_dimensions(&[0.0; 3], 4).unwrap_err();
        assert!(err.to_string().contains("got 3, expected 4"));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_knowledge_error() {
        let provider = OllamaProvider::new(&config(Some("http://127.0.0.1:1"))).unwrap();
        let result = provider.embed("hello").await;
        assert!(matches!(result, Err(AppError::Knowledge(_))));
    }
}
