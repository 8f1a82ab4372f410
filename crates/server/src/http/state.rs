//! Shared handler state.

use rag_knowledge::{AnswerComposer, DocumentStore};
use std::sync::Arc;

/// Long-lived service handles, built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub composer: Arc<AnswerComposer>,
}

impl AppState {
    pub fn new(composer: Arc<AnswerComposer>) -> Self {
        Self { composer }
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        self.composer.store()
    }
}
