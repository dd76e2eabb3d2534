//! In-memory vector store implementation.
//!
//! Useful for testing and small datasets.

use super::{
    cosine_similarity, rank_results, ChunkRecord, IndexMeta, IndexedEpisode, SearchResult,
    VectorStore,
};
use crate::error::Result;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

/// In-memory vector store.
pub struct MemoryVectorStore {
    records: RwLock<HashMap<String, ChunkRecord>>,
    meta: RwLock<Option<IndexMeta>>,
}

impl MemoryVectorStore {
    /// Create a new in-memory vector store.
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            meta: RwLock::new(None),
        }
    }
}

impl Default for MemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    async fn upsert_batch(&self, records: &[ChunkRecord]) -> Result<usize> {
        let mut store = self.records.write().unwrap();
        for record in records {
            store.insert(record.chunk.chunk_id.clone(), record.clone());
        }
        Ok(records.len())
    }

    async fn contains(&self, chunk_id: &str) -> Result<bool> {
        let store = self.records.read().unwrap();
        Ok(store.contains_key(chunk_id))
    }

    async fn search(&self, query_embedding: &[f32], k: usize) -> Result<Vec<SearchResult>> {
        let store = self.records.read().unwrap();

        let mut results: Vec<SearchResult> = store
            .values()
            .map(|record| {
                let score = cosine_similarity(query_embedding, &record.embedding);
                SearchResult {
                    chunk: record.chunk.clone(),
                    score,
                }
            })
            .collect();

        rank_results(&mut results, k);
        Ok(results)
    }

    async fn clear(&self) -> Result<usize> {
        let mut store = self.records.write().unwrap();
        let deleted = store.len();
        store.clear();
        *self.meta.write().unwrap() = None;
        Ok(deleted)
    }

    async fn chunk_count(&self) -> Result<usize> {
        let store = self.records.read().unwrap();
        Ok(store.len())
    }

    async fn list_episodes(&self) -> Result<Vec<IndexedEpisode>> {
        let store = self.records.read().unwrap();

        let mut episodes: BTreeMap<(u32, u32), IndexedEpisode> = BTreeMap::new();

        for record in store.values() {
            let entry = episodes
                .entry((record.chunk.season, record.chunk.episode))
                .or_insert_with(|| IndexedEpisode {
                    season: record.chunk.season,
                    episode: record.chunk.episode,
                    chunk_count: 0,
                    indexed_at: record.indexed_at,
                });

            entry.chunk_count += 1;
            if record.indexed_at > entry.indexed_at {
                entry.indexed_at = record.indexed_at;
            }
        }

        Ok(episodes.into_values().collect())
    }

    async fn index_meta(&self) -> Result<Option<IndexMeta>> {
        Ok(self.meta.read().unwrap().clone())
    }

    async fn set_index_meta(&self, meta: &IndexMeta) -> Result<()> {
        *self.meta.write().unwrap() = Some(meta.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunking::Chunk;

    fn record(chunk_id: &str, episode: u32, start_line: usize, embedding: Vec<f32>) -> ChunkRecord {
        ChunkRecord::new(
            Chunk {
                chunk_id: chunk_id.to_string(),
                season: 1,
                episode,
                start_line,
                end_line: start_line + 1,
                text: "hello".to_string(),
            },
            embedding,
        )
    }

    #[tokio::test]
    async fn test_memory_vector_store() {
        let store = MemoryVectorStore::new();

        store
            .upsert_batch(&[
                record("a", 1, 0, vec![1.0, 0.0, 0.0]),
                record("b", 1, 1, vec![0.0, 1.0, 0.0]),
            ])
            .await
            .unwrap();

        assert_eq!(store.chunk_count().await.unwrap(), 2);
        assert!(store.contains("b").await.unwrap());

        let results = store.search(&[1.0, 0.0, 0.0], 10).await.unwrap();
        assert_eq!(results.len(), 2);
        assert!(results[0].score > results[1].score);

        let episodes = store.list_episodes().await.unwrap();
        assert_eq!(episodes.len(), 1);
        assert_eq!(episodes[0].chunk_count, 2);

        assert_eq!(store.clear().await.unwrap(), 2);
        assert_eq!(store.chunk_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_search_is_deterministic() {
        let store = MemoryVectorStore::new();

        // Equal embeddings force a score tie across insertion orders.
        store
            .upsert_batch(&[
                record("c", 2, 0, vec![1.0, 0.0]),
                record("a", 1, 0, vec![1.0, 0.0]),
                record("b", 1, 4, vec![1.0, 0.0]),
            ])
            .await
            .unwrap();

        let first = store.search(&[1.0, 0.0], 3).await.unwrap();
        let second = store.search(&[1.0, 0.0], 3).await.unwrap();

        let ids: Vec<&str> = first.iter().map(|r| r.chunk.chunk_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        let ids_again: Vec<&str> = second.iter().map(|r| r.chunk.chunk_id.as_str()).collect();
        assert_eq!(ids, ids_again);
    }
}
