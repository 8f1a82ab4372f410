//! Completion service integration for the RAG API.
//!
//! This crate provides a provider-agnostic abstraction over hosted and local
//! LLM completion APIs behind the `LlmClient` trait.
//!
//! # Providers
//! - **OpenAI-compatible**: any hosted `/chat/completions` endpoint (default)
//! - **Ollama**: local LLM runtime
//!
//! # Example
//! ```no_run
//! use rag_llm::{LlmClient, LlmRequest, providers::OllamaClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OllamaClient::new();
//! let request = LlmRequest::new("Hello, world!", "tinyllama");
//! let response = client.complete(&request).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod providers;
pub mod types;

// Re-export main types
pub use client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
pub use factory::create_client;
pub use providers::{OllamaClient, OpenAiClient};
pub use types::ProviderType;
