//! Embedding configuration types.

use rag_core::config::EmbeddingSettings;
use rag_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Embedding configuration for a document store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmbeddingConfig {
    /// Provider name: "trigram", "ollama"
    pub provider: String,

    /// Model identifier (provider-specific)
    pub model: String,

    /// Embedding vector dimensions
    pub dimensions: usize,

    /// Whether to normalize embeddings to unit length
    #[serde(default = "default_normalize")]
    pub normalize: bool,

    /// Provider endpoint, if not the default
    #[serde(default)]
    pub endpoint: Option<String>,
}

fn default_normalize() -> bool {
    true
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self::from(&EmbeddingSettings::default())
    }
}

impl From<&EmbeddingSettings> for EmbeddingConfig {
    fn from(settings: &EmbeddingSettings) -> Self {
        Self {
            provider: settings.provider.clone(),
            model: settings.model.clone(),
            dimensions: settings.dimensions,
            normalize: true,
            endpoint: settings.endpoint.clone(),
        }
    }
}

impl EmbeddingConfig {
    /// Validate that another config produces vectors in the same space.
    pub fn validate_consistency(&self, other: &Self) -> AppResult<()> {
        if self.provider != other.provider {
            return Err(AppError::Knowledge(format!(
                "Provider mismatch: expected '{}', got '{}'",
                self.provider, other.provider
            )));
        }

        if self.model != other.model {
            return Err(AppError::Knowledge(format!(
                "Model mismatch: expected '{}', got '{}'",
                self.model, other.model
            )));
        }

        if self.dimensions != other.dimensions {
            return Err(AppError::Knowledge(format!(
                "Dimension mismatch: expected {}, got {}",
                self.dimensions, other.dimensions
            )));
        }

        Ok(())
    }
}
