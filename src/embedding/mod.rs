//! Embedding generation for semantic retrieval.
//!
//! The same embedder (and therefore the same embedding space) must be used
//! at index time and query time; the vector store records the model id so a
//! mismatch is caught before any query is embedded.

mod openai;

pub use openai::OpenAIEmbedder;

use crate::error::Result;
use async_trait::async_trait;

/// Trait for embedding generation.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Generate an embedding for a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embeddings for multiple texts, in input order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Get the embedding dimensions.
    fn dimensions(&self) -> usize;

    /// Identifier of the embedding model, stored alongside the index.
    fn model_id(&self) -> &str;
}
