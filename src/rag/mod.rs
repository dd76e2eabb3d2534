//! RAG (Retrieval-Augmented Generation) for question answering with citations.
//!
//! Retrieves the dialogue chunks most similar to a question and composes an
//! answer from them, citing episode labels and line ranges.

mod answer;
mod retriever;

pub use answer::{AnswerComposer, RagEngine};
pub use retriever::Retriever;

use crate::chunking::Chunk;
use crate::vector_store::SearchResult;
use serde::{Deserialize, Serialize};

/// A retrieved chunk with its similarity score.
#[derive(Debug, Clone)]
pub struct RetrievalResult {
    pub chunk: Chunk,
    /// Cosine similarity against the question embedding.
    pub score: f32,
}

impl From<SearchResult> for RetrievalResult {
    fn from(result: SearchResult) -> Self {
        Self {
            chunk: result.chunk,
            score: result.score,
        }
    }
}

/// A citation pointing back into the subtitle corpus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Citation {
    /// Episode label, e.g. "S01E05".
    pub episode_label: String,
    pub start_line: usize,
    pub end_line: usize,
    /// The chunk text the answer drew on.
    pub quote: String,
}

/// A composed answer with the citations it was grounded in.
#[derive(Debug, Clone)]
pub struct Answer {
    /// The generated answer text.
    pub text: String,
    /// One citation per retrieved chunk, in retrieval order.
    pub citations: Vec<Citation>,
}

impl Answer {
    /// Format the answer with its sources for display.
    pub fn format_for_display(&self) -> String {
        let mut output = self.text.clone();

        if !self.citations.is_empty() {
            output.push_str("\n\n--- Sources ---\n");
            for citation in &self.citations {
                output.push_str(&format!(
                    "\n{} (lines {}-{})",
                    citation.episode_label, citation.start_line, citation.end_line
                ));
            }
        }

        output
    }
}
