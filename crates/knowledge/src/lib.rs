//! Knowledge store and retrieval-augmented answering.
//!
//! Provides a persistent SQLite document store with local embeddings, the
//! retrieval gate and the answer composer that ties search to completion.

pub mod config;
pub mod embeddings;
pub mod index;
pub mod rag;
pub mod store;
pub mod types;


// Re-export commonly used types
pub use embeddings::{create_provider, EmbeddingConfig, EmbeddingProvider};
pub use index::SqliteDocumentStore;
pub use rag::{AnswerComposer, AnswerPrompts, AnswerResponse, AnswerSource, RetrievalGate};
pub use store::DocumentStore;
pub use types::{KnowledgeItem, SearchHit};

use rag_core::AppResult;
use std::path::Path;
use std::sync::Arc;

/// Identifier the seed document is stored under.
pub const SEED_DOCUMENT_ID: &str = "knowledge";

/// Open (or create) the SQLite store for `collection` under `data_dir`.
pub fn open_store(
    data_dir: &Path,
    collection: &str,
    embedding: &EmbeddingConfig,
) -> AppResult<SqliteDocumentStore> {
    let embedder = create_provider(embedding)?;
    let path = config::get_index_path(data_dir, collection);

    tracing::info!(
        "Opening document store {:?} (embedding: {}/{})",
        path,
        embedder.provider_name(),
        embedder.model_name()
    );
    SqliteDocumentStore::open(&path, embedder)
}

/// Append `text` under a fresh identifier. The text is stored as given.
pub async fn add_knowledge(store: &dyn DocumentStore, text: &str) -> AppResult<KnowledgeItem> {
    let item = KnowledgeItem::new(text);
    store.add(&item).await?;

    tracing::info!("Added knowledge item {} ({} bytes)", item.id, item.text.len());
    Ok(item)
}

/// Store the whole of `path` as one document under [`SEED_DOCUMENT_ID`].
///
/// Reseeding replaces the previous seed document.
pub async fn seed_from_file(store: &dyn DocumentStore, path: &Path) -> AppResult<KnowledgeItem> {
    let text = std::fs::read_to_string(path)?;
    let item = KnowledgeItem::with_id(SEED_DOCUMENT_ID, text);
    store.upsert(&item).await?;

    tracing::info!("Seeded {:?} as '{}' ({} bytes)", path, item.id, item.text.len());
    Ok(item)
}

/// Build the shared answer composer from loaded configuration.
pub fn build_composer(
    store: Arc<dyn DocumentStore>,
    llm: Arc<dyn rag_llm::LlmClient>,
    config: &rag_core::AppConfig,
) -> AppResult<AnswerComposer> {
    let prompts = AnswerPrompts::load(config.prompts_dir.as_deref())?;
    let gate = RetrievalGate::new(config.retrieval.distance_threshold);

    Ok(
        AnswerComposer::new(store, llm, prompts, gate, config.model.clone())
            .with_top_k(config.retrieval.top_k),
    )
}
