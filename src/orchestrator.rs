//! Pipeline orchestrator for Replikk.
//!
//! Wires configuration into concrete components and coordinates the offline
//! pipeline (load, chunk, embed, index) and the online one (retrieve, answer).

use crate::chunking::{chunk_corpus, ChunkingConfig};
use crate::config::{Prompts, Settings};
use crate::embedding::{Embedder, OpenAIEmbedder};
use crate::error::{ReplikkError, Result};
use crate::generation::{Generator, OpenAIGenerator};
use crate::indexer::{IndexMode, IndexReport, Indexer};
use crate::rag::{Answer, RagEngine, RetrievalResult};
use crate::subtitles::{load_directory, SkippedFile};
use crate::vector_store::{IndexedEpisode, MemoryVectorStore, SqliteVectorStore, VectorStore};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument};

/// The main orchestrator for the Replikk pipeline.
pub struct Orchestrator {
    settings: Settings,
    prompts: Prompts,
    embedder: Arc<dyn Embedder>,
    generator: Arc<dyn Generator>,
    vector_store: Arc<dyn VectorStore>,
}

impl Orchestrator {
    /// Create a new orchestrator from settings.
    pub fn new(settings: Settings) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        let embedder = Arc::new(OpenAIEmbedder::with_config(
            &settings.embedding.model,
            settings.embedding.dimensions as usize,
            Duration::from_secs(settings.embedding.request_timeout_seconds),
        ));

        let generator = Arc::new(OpenAIGenerator::with_config(
            &settings.rag.model,
            settings.rag.temperature,
            settings.rag.max_tokens,
            Duration::from_secs(settings.rag.request_timeout_seconds),
        ));

        let vector_store: Arc<dyn VectorStore> = match settings.vector_store.provider.as_str() {
            "memory" => Arc::new(MemoryVectorStore::new()),
            "sqlite" => {
                let path = settings.sqlite_path();
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                Arc::new(SqliteVectorStore::new(&path)?)
            }
            other => {
                return Err(ReplikkError::Config(format!(
                    "Unknown vector store provider: {}",
                    other
                )))
            }
        };

        Ok(Self {
            settings,
            prompts,
            embedder,
            generator,
            vector_store,
        })
    }

    /// Create an orchestrator with custom components.
    pub fn with_components(
        settings: Settings,
        prompts: Prompts,
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn Generator>,
        vector_store: Arc<dyn VectorStore>,
    ) -> Self {
        Self {
            settings,
            prompts,
            embedder,
            generator,
            vector_store,
        }
    }

    /// Get a reference to the vector store.
    pub fn vector_store(&self) -> Arc<dyn VectorStore> {
        self.vector_store.clone()
    }

    /// Get the settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Load subtitles, chunk them, and build the index.
    ///
    /// Returns the index report and any files skipped during loading.
    #[instrument(skip(self, subtitle_dir), fields(dir = %subtitle_dir.display(), ?mode))]
    pub async fn build_index(
        &self,
        subtitle_dir: &Path,
        mode: IndexMode,
    ) -> Result<(IndexReport, Vec<SkippedFile>)> {
        let corpus = load_directory(subtitle_dir)?;
        info!(
            "Loaded {} episodes ({} dialogue lines)",
            corpus.episodes.len(),
            corpus.line_count()
        );

        let chunking = ChunkingConfig {
            window_lines: self.settings.chunking.window_lines,
            overlap_lines: self.settings.chunking.overlap_lines,
        };
        let chunks = chunk_corpus(&corpus, &chunking)?;
        info!("Created {} chunks", chunks.len());

        let indexer = Indexer::new(self.vector_store.clone(), self.embedder.clone());
        let report = indexer.build(chunks, mode).await?;

        Ok((report, corpus.skipped))
    }

    /// Answer a question from the indexed subtitles.
    pub async fn ask(&self, question: &str, top_k: Option<usize>) -> Result<Answer> {
        self.engine(top_k).ask(question).await
    }

    /// Retrieve chunks for a question without generating an answer.
    pub async fn search(&self, question: &str, limit: usize) -> Result<Vec<RetrievalResult>> {
        self.engine(None).search(question, limit).await
    }

    /// List indexed episodes with chunk counts.
    pub async fn list_episodes(&self) -> Result<Vec<IndexedEpisode>> {
        self.vector_store.list_episodes().await
    }

    fn engine(&self, top_k: Option<usize>) -> RagEngine {
        RagEngine::new(
            self.vector_store.clone(),
            self.embedder.clone(),
            self.generator.clone(),
            top_k.unwrap_or(self.settings.rag.top_k),
        )
        .with_prompts(self.prompts.clone())
    }
}
