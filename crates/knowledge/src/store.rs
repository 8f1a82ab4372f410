//! Document store abstraction.
//!
//! Defines the trait the answer composer and the HTTP handlers use for
//! similarity search and appends, independent of the backing index.

use crate::types::{KnowledgeItem, SearchHit};
use rag_core::AppResult;

/// Trait for document store backends.
///
/// Implementations are shared across concurrent requests and must do their
/// own synchronisation.
#[async_trait::async_trait]
pub trait DocumentStore: Send + Sync {
    /// Short backend identifier reported by the health check.
    fn backend_name(&self) -> &str;

    /// Append a new item. An existing ID is an error.
    async fn add(&self, item: &KnowledgeItem) -> AppResult<()>;

    /// Insert or replace an item by ID.
    async fn upsert(&self, item: &KnowledgeItem) -> AppResult<()>;

    /// Return at most `top_k` items closest to `query`, ascending by distance.
    ///
    /// An empty store yields an empty vector.
    async fn search(&self, query: &str, top_k: usize) -> AppResult<Vec<SearchHit>>;

    /// Number of stored items.
    async fn count(&self) -> AppResult<u64>;
}
