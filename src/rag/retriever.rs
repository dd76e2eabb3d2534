//! Question-time retrieval against the vector index.

use super::RetrievalResult;
use crate::embedding::Embedder;
use crate::error::{ReplikkError, Result};
use crate::vector_store::VectorStore;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Retrieves the chunks most similar to a question.
pub struct Retriever {
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
}

impl Retriever {
    pub fn new(store: Arc<dyn VectorStore>, embedder: Arc<dyn Embedder>) -> Self {
        Self { store, embedder }
    }

    /// Return the top k chunks for a question, best first.
    ///
    /// Fails before embedding if the index is empty or was built with a
    /// different embedding model than the one configured now.
    #[instrument(skip(self, question))]
    pub async fn retrieve(&self, question: &str, k: usize) -> Result<Vec<RetrievalResult>> {
        if k == 0 {
            return Err(ReplikkError::InvalidInput(
                "top_k must be at least 1".to_string(),
            ));
        }
        if question.trim().is_empty() {
            return Err(ReplikkError::InvalidInput(
                "Question must not be empty".to_string(),
            ));
        }

        if self.store.chunk_count().await? == 0 {
            return Err(ReplikkError::EmptyIndex);
        }

        if let Some(meta) = self.store.index_meta().await? {
            if meta.embedding_model != self.embedder.model_id()
                || meta.dimensions != self.embedder.dimensions()
            {
                return Err(ReplikkError::Config(format!(
                    "Index was built with embedding model '{}' ({} dims) but the configured \
                     model is '{}' ({} dims). Rebuild the index or restore the old model.",
                    meta.embedding_model,
                    meta.dimensions,
                    self.embedder.model_id(),
                    self.embedder.dimensions()
                )));
            }
        }

        let query_embedding = self.embedder.embed(question).await?;
        let results = self.store.search(&query_embedding, k).await?;

        debug!("Retrieved {} chunks for question", results.len());
        Ok(results.into_iter().map(RetrievalResult::from).collect())
    }
}
