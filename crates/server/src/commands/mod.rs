//! Command handlers for the rag-api binary.

pub mod ask;
pub mod seed;
pub mod serve;

pub use ask::AskCommand;
pub use seed::SeedCommand;
pub use serve::ServeCommand;

use rag_core::{config::AppConfig, AppError, AppResult};
use rag_knowledge::{AnswerComposer, DocumentStore, EmbeddingConfig};
use std::sync::Arc;
use std::time::Duration;

/// Open the configured document store, creating the data directory.
pub(crate) fn open_store(config: &AppConfig) -> AppResult<Arc<dyn DocumentStore>> {
    config.ensure_data_dir()?;
    let store = rag_knowledge::open_store(
        &config.data_dir,
        &config.retrieval.collection,
        &EmbeddingConfig::from(&config.embedding),
    )?;
    Ok(Arc::new(store))
}

/// Build the answer composer: store, completion client and prompts.
///
/// Fails when the configuration is invalid, including a missing credential.
pub(crate) fn build_composer(config: &AppConfig) -> AppResult<AnswerComposer> {
    config.validate()?;

    let api_key = config.resolve_api_key(&config.provider);
    let llm = rag_llm::create_client(
        &config.provider,
        config.endpoint.as_deref(),
        api_key.as_deref(),
        Some(Duration::from_secs(config.timeout_secs)),
    )
    .map_err(|e| AppError::Config(format!("Failed to create completion client: {}", e)))?;

    let store = open_store(config)?;
    rag_knowledge::build_composer(store, llm, config)
}
