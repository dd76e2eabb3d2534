//! Index building: embed chunks and persist them to the vector store.
//!
//! Builds run in one of two modes: a full rebuild drops the store and
//! re-indexes everything, an incremental build only indexes chunk ids not
//! already present. Each batch is embedded and committed as a single
//! transaction, so an interrupted build never leaves half-written entries;
//! committed batches survive a later failure.

use crate::chunking::Chunk;
use crate::embedding::Embedder;
use crate::error::{ReplikkError, Result};
use crate::vector_store::{ChunkRecord, IndexMeta, VectorStore};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};

/// How the indexer treats existing store contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexMode {
    /// Drop everything and re-index from scratch.
    Rebuild,
    /// Add only chunks whose ids are not yet in the store.
    Incremental,
}

/// Outcome of an index build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexReport {
    /// Chunks offered to the indexer.
    pub chunks_total: usize,
    /// Chunks embedded and committed by this build.
    pub chunks_indexed: usize,
    /// Chunks skipped because they were already present.
    pub chunks_skipped: usize,
}

/// Builds the vector index from chunked subtitles.
pub struct Indexer {
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
    batch_size: usize,
    max_attempts: u32,
    backoff_base: Duration,
}

impl Indexer {
    pub fn new(store: Arc<dyn VectorStore>, embedder: Arc<dyn Embedder>) -> Self {
        Self {
            store,
            embedder,
            batch_size: 64,
            max_attempts: 3,
            backoff_base: Duration::from_millis(250),
        }
    }

    /// Set the number of chunks embedded and committed per transaction.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Set the retry budget for embedding calls.
    pub fn with_retries(mut self, max_attempts: u32, backoff_base: Duration) -> Self {
        self.max_attempts = max_attempts.max(1);
        self.backoff_base = backoff_base;
        self
    }

    /// Build the index from the given chunks.
    #[instrument(skip(self, chunks), fields(total = chunks.len(), ?mode))]
    pub async fn build(&self, chunks: Vec<Chunk>, mode: IndexMode) -> Result<IndexReport> {
        let chunks_total = chunks.len();

        match mode {
            IndexMode::Rebuild => {
                let removed = self.store.clear().await?;
                if removed > 0 {
                    info!("Rebuild: dropped {} existing chunks", removed);
                }
            }
            IndexMode::Incremental => self.check_embedding_space().await?,
        }

        self.store
            .set_index_meta(&IndexMeta {
                embedding_model: self.embedder.model_id().to_string(),
                dimensions: self.embedder.dimensions(),
            })
            .await?;

        // In incremental mode, filter out chunks that are already indexed.
        let mut pending = Vec::with_capacity(chunks.len());
        let mut chunks_skipped = 0;
        for chunk in chunks {
            if mode == IndexMode::Incremental && self.store.contains(&chunk.chunk_id).await? {
                chunks_skipped += 1;
            } else {
                pending.push(chunk);
            }
        }

        let mut chunks_indexed = 0;
        for batch in pending.chunks(self.batch_size) {
            let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
            let embeddings = self.embed_with_retry(&texts, batch).await?;

            let records: Vec<ChunkRecord> = batch
                .iter()
                .cloned()
                .zip(embeddings)
                .map(|(chunk, embedding)| ChunkRecord::new(chunk, embedding))
                .collect();

            chunks_indexed += self.store.upsert_batch(&records).await?;
        }

        info!(
            "Index build complete: {} indexed, {} skipped, {} total",
            chunks_indexed, chunks_skipped, chunks_total
        );

        Ok(IndexReport {
            chunks_total,
            chunks_indexed,
            chunks_skipped,
        })
    }

    /// Refuse to mix embedding spaces: an incremental build must use the
    /// same model the existing index was built with.
    async fn check_embedding_space(&self) -> Result<()> {
        if let Some(meta) = self.store.index_meta().await? {
            if meta.embedding_model != self.embedder.model_id()
                || meta.dimensions != self.embedder.dimensions()
            {
                return Err(ReplikkError::Config(format!(
                    "Index was built with embedding model '{}' ({} dims) but the configured \
                     model is '{}' ({} dims). Run a full rebuild instead.",
                    meta.embedding_model,
                    meta.dimensions,
                    self.embedder.model_id(),
                    self.embedder.dimensions()
                )));
            }
        }
        Ok(())
    }

    /// Embed one batch, retrying transient failures with exponential backoff.
    ///
    /// After the retry budget is exhausted the build aborts; the error names
    /// the chunk ids that were not indexed. Batches committed before this
    /// point remain in the store.
    async fn embed_with_retry(&self, texts: &[String], batch: &[Chunk]) -> Result<Vec<Vec<f32>>> {
        let mut last_error = None;

        for attempt in 1..=self.max_attempts {
            match self.embedder.embed_batch(texts).await {
                Ok(embeddings) => return Ok(embeddings),
                Err(e) => {
                    warn!(
                        "Embedding attempt {}/{} failed: {}",
                        attempt, self.max_attempts, e
                    );
                    last_error = Some(e);
                    if attempt < self.max_attempts {
                        tokio::time::sleep(self.backoff_base * 2u32.pow(attempt - 1)).await;
                    }
                }
            }
        }

        let failed_ids: Vec<&str> = batch.iter().map(|c| c.chunk_id.as_str()).collect();
        Err(ReplikkError::Embedding(format!(
            "Giving up after {} attempts ({}); failed chunk_ids: [{}]",
            self.max_attempts,
            last_error.map(|e| e.to_string()).unwrap_or_default(),
            failed_ids.join(", ")
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subtitles::{DialogueLine, EpisodeId};
    use crate::vector_store::MemoryVectorStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Deterministic embedder test double; optionally fails the first N calls.
    struct StubEmbedder {
        calls: AtomicU32,
        fail_first: u32,
    }

    impl StubEmbedder {
        fn new() -> Self {
            Self {
                calls: AtomicU32::new(0),
                fail_first: 0,
            }
        }

        fn failing(fail_first: u32) -> Self {
            Self {
                calls: AtomicU32::new(0),
                fail_first,
            }
        }

        fn embedding_for(text: &str) -> Vec<f32> {
            let sum: u32 = text.bytes().map(u32::from).sum();
            vec![(sum % 97) as f32, (text.len() % 11) as f32, 1.0]
        }
    }

    #[async_trait]
    impl Embedder for StubEmbedder {
        async fn embed(&self, text: &str) -> crate::error::Result<Vec<f32>> {
            let all = self.embed_batch(&[text.to_string()]).await?;
            Ok(all.into_iter().next().unwrap())
        }

        async fn embed_batch(&self, texts: &[String]) -> crate::error::Result<Vec<Vec<f32>>> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.fail_first {
                return Err(ReplikkError::Embedding("backend unavailable".to_string()));
            }
            Ok(texts.iter().map(|t| Self::embedding_for(t)).collect())
        }

        fn dimensions(&self) -> usize {
            3
        }

        fn model_id(&self) -> &str {
            "stub-embed-1"
        }
    }

    fn sample_chunks(episode: u32, count: usize) -> Vec<Chunk> {
        let id = EpisodeId::new(1, episode);
        (0..count)
            .map(|i| {
                let lines = vec![DialogueLine {
                    season: 1,
                    episode,
                    line_index: i,
                    text: format!("S01E{:02} dialogue {}", episode, i),
                }];
                crate::chunking::chunk_episode(
                    id,
                    &lines,
                    &crate::chunking::ChunkingConfig {
                        window_lines: 1,
                        overlap_lines: 0,
                    },
                )
                .unwrap()
                .into_iter()
                .next()
                .unwrap()
            })
            .collect()
    }

    fn indexer(store: Arc<dyn VectorStore>, embedder: Arc<dyn Embedder>) -> Indexer {
        Indexer::new(store, embedder).with_retries(2, Duration::from_millis(1))
    }

    #[tokio::test]
    async fn test_rebuild_then_incremental_is_noop() {
        let store = Arc::new(MemoryVectorStore::new());
        let embedder = Arc::new(StubEmbedder::new());
        let indexer = indexer(store.clone(), embedder);

        let chunks = sample_chunks(1, 5);

        let report = indexer
            .build(chunks.clone(), IndexMode::Rebuild)
            .await
            .unwrap();
        assert_eq!(report.chunks_indexed, 5);
        assert_eq!(store.chunk_count().await.unwrap(), 5);

        // Same input again: everything is already present.
        let report = indexer.build(chunks, IndexMode::Incremental).await.unwrap();
        assert_eq!(report.chunks_indexed, 0);
        assert_eq!(report.chunks_skipped, 5);
        assert_eq!(store.chunk_count().await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_incremental_adds_only_new_chunks() {
        let store = Arc::new(MemoryVectorStore::new());
        let embedder = Arc::new(StubEmbedder::new());
        let indexer = indexer(store.clone(), embedder);

        indexer
            .build(sample_chunks(1, 3), IndexMode::Rebuild)
            .await
            .unwrap();

        let mut all = sample_chunks(1, 3);
        all.extend(sample_chunks(2, 2));

        let report = indexer.build(all, IndexMode::Incremental).await.unwrap();
        assert_eq!(report.chunks_indexed, 2);
        assert_eq!(report.chunks_skipped, 3);
        assert_eq!(store.chunk_count().await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_rebuild_drops_previous_contents() {
        let store = Arc::new(MemoryVectorStore::new());
        let embedder = Arc::new(StubEmbedder::new());
        let indexer = indexer(store.clone(), embedder);

        indexer
            .build(sample_chunks(1, 4), IndexMode::Rebuild)
            .await
            .unwrap();
        indexer
            .build(sample_chunks(2, 2), IndexMode::Rebuild)
            .await
            .unwrap();

        assert_eq!(store.chunk_count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_retry_recovers_from_transient_failure() {
        let store = Arc::new(MemoryVectorStore::new());
        // First call fails, retry succeeds.
        let embedder = Arc::new(StubEmbedder::failing(1));
        let indexer = indexer(store.clone(), embedder);

        let report = indexer
            .build(sample_chunks(1, 2), IndexMode::Rebuild)
            .await
            .unwrap();
        assert_eq!(report.chunks_indexed, 2);
    }

    #[tokio::test]
    async fn test_persistent_failure_reports_chunk_ids_and_keeps_committed_batches() {
        let store = Arc::new(MemoryVectorStore::new());
        // First batch succeeds, every later call fails.
        let embedder = Arc::new(StubEmbedder::failing(0));
        let chunks = sample_chunks(1, 4);
        let second_batch_ids: Vec<String> =
            chunks[2..].iter().map(|c| c.chunk_id.clone()).collect();

        // Force two batches, and make the embedder fail from the second call on.
        let flaky = Arc::new(FailAfter {
            inner: embedder,
            succeed_calls: 1,
        });
        let indexer = Indexer::new(store.clone(), flaky)
            .with_batch_size(2)
            .with_retries(2, Duration::from_millis(1));

        let err = indexer.build(chunks, IndexMode::Rebuild).await.unwrap_err();

        match err {
            ReplikkError::Embedding(msg) => {
                for id in &second_batch_ids {
                    assert!(msg.contains(id), "error should name failed chunk {}", id);
                }
            }
            other => panic!("expected Embedding error, got {:?}", other),
        }

        // The first committed batch is intact.
        assert_eq!(store.chunk_count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_incremental_rejects_mismatched_embedding_model() {
        let store = Arc::new(MemoryVectorStore::new());
        store
            .set_index_meta(&IndexMeta {
                embedding_model: "some-other-model".to_string(),
                dimensions: 3,
            })
            .await
            .unwrap();

        let embedder = Arc::new(StubEmbedder::new());
        let indexer = indexer(store, embedder);

        let err = indexer
            .build(sample_chunks(1, 1), IndexMode::Incremental)
            .await
            .unwrap_err();
        assert!(matches!(err, ReplikkError::Config(_)));
    }

    /// Wraps an embedder and fails every call after the first N.
    struct FailAfter {
        inner: Arc<StubEmbedder>,
        succeed_calls: u32,
    }

    #[async_trait]
    impl Embedder for FailAfter {
        async fn embed(&self, text: &str) -> crate::error::Result<Vec<f32>> {
            let all = self.embed_batch(&[text.to_string()]).await?;
            Ok(all.into_iter().next().unwrap())
        }

        async fn embed_batch(&self, texts: &[String]) -> crate::error::Result<Vec<Vec<f32>>> {
            let call = self.inner.calls.fetch_add(1, Ordering::SeqCst);
            if call >= self.succeed_calls {
                return Err(ReplikkError::Embedding("quota exceeded".to_string()));
            }
            Ok(texts
                .iter()
                .map(|t| StubEmbedder::embedding_for(t))
                .collect())
        }

        fn dimensions(&self) -> usize {
            3
        }

        fn model_id(&self) -> &str {
            "stub-embed-1"
        }
    }
}
