//! Answer composition from retrieved chunks.

use super::{Answer, Citation, RetrievalResult, Retriever};
use crate::config::Prompts;
use crate::embedding::Embedder;
use crate::error::Result;
use crate::generation::Generator;
use crate::vector_store::VectorStore;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Composes an answer from retrieved chunks via the generation model.
pub struct AnswerComposer {
    generator: Arc<dyn Generator>,
    prompts: Prompts,
}

impl AnswerComposer {
    pub fn new(generator: Arc<dyn Generator>) -> Self {
        Self {
            generator,
            prompts: Prompts::default(),
        }
    }

    /// Set custom prompts (with user-defined variables).
    pub fn with_prompts(mut self, prompts: Prompts) -> Self {
        self.prompts = prompts;
        self
    }

    /// Generate an answer for the question from the retrieved chunks.
    ///
    /// Citations are built from the retrieved chunks in retrieval order,
    /// independent of what the model chose to mention.
    #[instrument(skip(self, question, results))]
    pub async fn compose(&self, question: &str, results: &[RetrievalResult]) -> Result<Answer> {
        let context = format_context(results);

        let mut vars = HashMap::new();
        vars.insert("question".to_string(), question.to_string());
        vars.insert("context".to_string(), context);

        let system_prompt = self
            .prompts
            .render_with_custom(&self.prompts.rag.system, &vars);
        let user_prompt = self.prompts.render_with_custom(&self.prompts.rag.user, &vars);

        let text = self.generator.generate(&system_prompt, &user_prompt).await?;

        let citations = results
            .iter()
            .map(|r| Citation {
                episode_label: r.chunk.episode_label(),
                start_line: r.chunk.start_line,
                end_line: r.chunk.end_line,
                quote: r.chunk.text.clone(),
            })
            .collect();

        debug!("Composed answer with {} citations", results.len());
        Ok(Answer { text, citations })
    }
}

/// Format retrieved chunks as numbered context blocks for the prompt.
fn format_context(results: &[RetrievalResult]) -> String {
    results
        .iter()
        .enumerate()
        .map(|(i, r)| {
            format!(
                "[{}] {} (lines {}-{})\n{}",
                i + 1,
                r.chunk.episode_label(),
                r.chunk.start_line,
                r.chunk.end_line,
                r.chunk.text
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// End-to-end question answering: retrieval plus answer composition.
pub struct RagEngine {
    retriever: Retriever,
    composer: AnswerComposer,
    top_k: usize,
}

impl RagEngine {
    pub fn new(
        store: Arc<dyn VectorStore>,
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn Generator>,
        top_k: usize,
    ) -> Self {
        Self {
            retriever: Retriever::new(store, embedder),
            composer: AnswerComposer::new(generator),
            top_k,
        }
    }

    /// Set custom prompts (with user-defined variables).
    pub fn with_prompts(mut self, prompts: Prompts) -> Self {
        self.composer = self.composer.with_prompts(prompts);
        self
    }

    /// Answer a question from the indexed subtitles.
    #[instrument(skip(self), fields(question = %question))]
    pub async fn ask(&self, question: &str) -> Result<Answer> {
        info!("Processing question: {}", question);

        let results = self.retriever.retrieve(question, self.top_k).await?;
        self.composer.compose(question, &results).await
    }

    /// Retrieve chunks for a question without generating an answer.
    pub async fn search(&self, question: &str, k: usize) -> Result<Vec<RetrievalResult>> {
        self.retriever.retrieve(question, k).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunking::Chunk;
    use crate::error::ReplikkError;
    use crate::vector_store::{ChunkRecord, IndexMeta, MemoryVectorStore};
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct FixedEmbedder;

    #[async_trait]
    impl Embedder for FixedEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![1.0, 0.0])
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect())
        }

        fn dimensions(&self) -> usize {
            2
        }

        fn model_id(&self) -> &str {
            "fixed-embed"
        }
    }

    struct FailingEmbedder;

    #[async_trait]
    impl Embedder for FailingEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Err(ReplikkError::Embedding("backend unavailable".to_string()))
        }

        async fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Err(ReplikkError::Embedding("backend unavailable".to_string()))
        }

        fn dimensions(&self) -> usize {
            2
        }

        fn model_id(&self) -> &str {
            "fixed-embed"
        }
    }

    /// Generator double that records prompts and returns a canned answer.
    struct StubGenerator {
        prompts_seen: Mutex<Vec<(String, String)>>,
        fail: bool,
    }

    impl StubGenerator {
        fn new() -> Self {
            Self {
                prompts_seen: Mutex::new(Vec::new()),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                prompts_seen: Mutex::new(Vec::new()),
                fail: true,
            }
        }
    }

    #[async_trait]
    impl Generator for StubGenerator {
        async fn generate(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
            if self.fail {
                return Err(ReplikkError::Generation("model overloaded".to_string()));
            }
            self.prompts_seen
                .lock()
                .unwrap()
                .push((system_prompt.to_string(), user_prompt.to_string()));
            Ok("Finch built the Machine. [S01E01]".to_string())
        }

        fn model_id(&self) -> &str {
            "stub-gen"
        }
    }

    fn result(episode: u32, start_line: usize, text: &str, score: f32) -> RetrievalResult {
        RetrievalResult {
            chunk: Chunk {
                chunk_id: format!("S01E{:02}:{:04}", episode, start_line),
                season: 1,
                episode,
                start_line,
                end_line: start_line + 2,
                text: text.to_string(),
            },
            score,
        }
    }

    #[tokio::test]
    async fn test_compose_builds_citations_in_retrieval_order() {
        let composer = AnswerComposer::new(Arc::new(StubGenerator::new()));
        let results = vec![
            result(1, 0, "You are being watched.", 0.9),
            result(3, 12, "The Machine found something.", 0.7),
        ];

        let answer = composer.compose("who watches?", &results).await.unwrap();

        assert_eq!(answer.text, "Finch built the Machine. [S01E01]");
        assert_eq!(answer.citations.len(), 2);
        assert_eq!(answer.citations[0].episode_label, "S01E01");
        assert_eq!(answer.citations[0].quote, "You are being watched.");
        assert_eq!(answer.citations[1].episode_label, "S01E03");
        assert_eq!(answer.citations[1].start_line, 12);
        assert_eq!(answer.citations[1].end_line, 14);
    }

    #[tokio::test]
    async fn test_compose_formats_context_into_user_prompt() {
        let generator = Arc::new(StubGenerator::new());
        let composer = AnswerComposer::new(generator.clone());
        let results = vec![
            result(1, 0, "You are being watched.", 0.9),
            result(3, 12, "The Machine found something.", 0.7),
        ];

        composer.compose("who watches?", &results).await.unwrap();

        let seen = generator.prompts_seen.lock().unwrap();
        let (_, user_prompt) = &seen[0];
        assert!(user_prompt.contains("who watches?"));
        assert!(user_prompt.contains("[1] S01E01 (lines 0-2)\nYou are being watched."));
        assert!(user_prompt.contains("[2] S01E03 (lines 12-14)\nThe Machine found something."));
    }

    #[tokio::test]
    async fn test_generation_failure_produces_no_answer() {
        let composer = AnswerComposer::new(Arc::new(StubGenerator::failing()));
        let results = vec![result(1, 0, "You are being watched.", 0.9)];

        let err = composer.compose("who watches?", &results).await.unwrap_err();
        assert!(matches!(err, ReplikkError::Generation(_)));
    }

    #[tokio::test]
    async fn test_engine_ask_end_to_end_with_doubles() {
        let store = Arc::new(MemoryVectorStore::new());
        store
            .upsert_batch(&[
                ChunkRecord::new(
                    result(1, 0, "You are being watched.", 0.0).chunk,
                    vec![1.0, 0.0],
                ),
                ChunkRecord::new(
                    result(2, 4, "The government has a secret system.", 0.0).chunk,
                    vec![0.0, 1.0],
                ),
            ])
            .await
            .unwrap();
        store
            .set_index_meta(&IndexMeta {
                embedding_model: "fixed-embed".to_string(),
                dimensions: 2,
            })
            .await
            .unwrap();

        let engine = RagEngine::new(
            store,
            Arc::new(FixedEmbedder),
            Arc::new(StubGenerator::new()),
            1,
        );

        let answer = engine.ask("who watches?").await.unwrap();
        assert_eq!(answer.citations.len(), 1);
        assert_eq!(answer.citations[0].episode_label, "S01E01");
    }

    #[tokio::test]
    async fn test_engine_ask_propagates_embedding_failure() {
        let store = Arc::new(MemoryVectorStore::new());
        store
            .upsert_batch(&[ChunkRecord::new(
                result(1, 0, "You are being watched.", 0.0).chunk,
                vec![1.0, 0.0],
            )])
            .await
            .unwrap();
        store
            .set_index_meta(&IndexMeta {
                embedding_model: "fixed-embed".to_string(),
                dimensions: 2,
            })
            .await
            .unwrap();

        let generator = Arc::new(StubGenerator::new());
        let engine = RagEngine::new(store, Arc::new(FailingEmbedder), generator.clone(), 1);

        let err = engine.ask("who watches?").await.unwrap_err();
        assert!(matches!(err, ReplikkError::Embedding(_)));
        // The generator was never reached, so no answer was composed.
        assert!(generator.prompts_seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_engine_ask_propagates_empty_index() {
        let engine = RagEngine::new(
            Arc::new(MemoryVectorStore::new()),
            Arc::new(FixedEmbedder),
            Arc::new(StubGenerator::new()),
            5,
        );

        let err = engine.ask("anything").await.unwrap_err();
        assert!(matches!(err, ReplikkError::EmptyIndex));
    }
}
