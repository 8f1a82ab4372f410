//! Embedding generation for the document store.
//!
//! Provider-agnostic embedding behind the `EmbeddingProvider` trait.

pub mod config;
pub mod provider;
pub mod providers;

pub use config::EmbeddingConfig;
pub use provider::{create_provider, EmbeddingProvider};

/// Scale a vector to unit length in place. Zero vectors are left untouched.
pub(crate) fn normalize(embedding: &mut [f32]) {
    let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for v in embedding.iter_mut() {
            *v /= norm;
        }
    }
}
