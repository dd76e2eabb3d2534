//! Vector store abstraction for Replikk.
//!
//! Provides a trait-based interface for different vector database backends.
//! Entries are keyed by deterministic chunk id, so rebuilding from unchanged
//! input never creates duplicates.

mod memory;
mod sqlite;

pub use memory::MemoryVectorStore;
pub use sqlite::SqliteVectorStore;

use crate::chunking::Chunk;
use crate::error::Result;
use crate::subtitles::EpisodeId;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A chunk persisted in the vector store together with its embedding.
///
/// Created at build time and never mutated; removed only on rebuild/clear.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkRecord {
    pub chunk: Chunk,
    /// Embedding vector, fixed length per index.
    pub embedding: Vec<f32>,
    /// When this chunk was indexed.
    pub indexed_at: DateTime<Utc>,
}

impl ChunkRecord {
    pub fn new(chunk: Chunk, embedding: Vec<f32>) -> Self {
        Self {
            chunk,
            embedding,
            indexed_at: Utc::now(),
        }
    }
}

/// A search result with score.
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// The matched chunk.
    pub chunk: Chunk,
    /// Similarity score (higher is better).
    pub score: f32,
}

/// Metadata recorded when the index is built.
///
/// Queries must embed with the same model the index was built with; the
/// retriever checks this before touching the embedding service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexMeta {
    pub embedding_model: String,
    pub dimensions: usize,
}

/// Summary information about an indexed episode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexedEpisode {
    pub season: u32,
    pub episode: u32,
    pub chunk_count: u32,
    pub indexed_at: DateTime<Utc>,
}

impl IndexedEpisode {
    pub fn label(&self) -> String {
        EpisodeId::new(self.season, self.episode).label()
    }
}

/// Trait for vector store implementations.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Upsert a batch of records as one atomic unit.
    async fn upsert_batch(&self, records: &[ChunkRecord]) -> Result<usize>;

    /// Check whether a chunk id is already indexed.
    async fn contains(&self, chunk_id: &str) -> Result<bool>;

    /// Return the k nearest chunks by cosine similarity, best first.
    async fn search(&self, query_embedding: &[f32], k: usize) -> Result<Vec<SearchResult>>;

    /// Delete all indexed chunks, returning how many were removed.
    async fn clear(&self) -> Result<usize>;

    /// Total number of indexed chunks.
    async fn chunk_count(&self) -> Result<usize>;

    /// List indexed episodes with chunk counts.
    async fn list_episodes(&self) -> Result<Vec<IndexedEpisode>>;

    /// Read the index metadata, if the index has been built.
    async fn index_meta(&self) -> Result<Option<IndexMeta>>;

    /// Record the index metadata.
    async fn set_index_meta(&self, meta: &IndexMeta) -> Result<()>;
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

/// Order results by descending score, then (season, episode, start_line)
/// ascending so equal scores rank deterministically, and keep the top k.
pub(crate) fn rank_results(results: &mut Vec<SearchResult>, k: usize) {
    results.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| {
                (a.chunk.season, a.chunk.episode, a.chunk.start_line).cmp(&(
                    b.chunk.season,
                    b.chunk.episode,
                    b.chunk.start_line,
                ))
            })
    });
    results.truncate(k);
}
