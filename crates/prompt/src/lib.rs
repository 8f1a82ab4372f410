//! Prompt system for the RAG API.
//!
//! This crate provides structured prompt management with:
//! - YAML prompt definitions (built in, overridable from a directory)
//! - Handlebars rendering of system and user messages
//! - Verbatim knowledge context injection

pub mod builder;
pub mod loader;
pub mod types;

// Re-export main types
pub use builder::build_prompt;
pub use loader::{load_prompt, KNOWLEDGE_BASE_PROMPT_ID, TRAINING_DATA_PROMPT_ID};
pub use types::{BuiltPrompt, BuiltPromptMetadata, PromptContextConfig, PromptDefinition};
