//! Line-window chunking of episode transcripts.
//!
//! Dialogue lines are grouped into windows of `window_lines` lines advancing
//! by `window_lines - overlap_lines` each step. Chunks never cross an episode
//! boundary, and the final window may be shorter than the rest (never padded,
//! never dropped). Chunk ids are content-derived, so re-chunking identical
//! input yields identical ids and re-indexing is idempotent.

use crate::error::{ReplikkError, Result};
use crate::subtitles::{DialogueLine, EpisodeId, SubtitleCorpus};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;

/// A bounded span of consecutive dialogue lines treated as one retrievable unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Deterministic content-derived identifier.
    pub chunk_id: String,
    pub season: u32,
    pub episode: u32,
    /// First line index covered (inclusive).
    pub start_line: usize,
    /// Last line index covered (inclusive).
    pub end_line: usize,
    /// The contained lines joined with newlines.
    pub text: String,
}

impl Chunk {
    /// The episode this chunk belongs to.
    pub fn episode_id(&self) -> EpisodeId {
        EpisodeId::new(self.season, self.episode)
    }

    /// Episode label for citations, e.g. "S01E01".
    pub fn episode_label(&self) -> String {
        self.episode_id().label()
    }
}

/// Windowing policy for the chunker.
#[derive(Debug, Clone, Copy)]
pub struct ChunkingConfig {
    /// Maximum lines per chunk (W).
    pub window_lines: usize,
    /// Lines shared between adjacent chunks (O), 0 <= O < W.
    pub overlap_lines: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            window_lines: 12,
            overlap_lines: 2,
        }
    }
}

impl ChunkingConfig {
    /// Validate the windowing parameters.
    pub fn validate(&self) -> Result<()> {
        if self.window_lines == 0 {
            return Err(ReplikkError::Config(
                "chunking.window_lines must be at least 1".to_string(),
            ));
        }
        if self.overlap_lines >= self.window_lines {
            return Err(ReplikkError::Config(format!(
                "chunking.overlap_lines ({}) must be smaller than window_lines ({})",
                self.overlap_lines, self.window_lines
            )));
        }
        Ok(())
    }

    /// Lines the window advances per step.
    pub fn step(&self) -> usize {
        self.window_lines - self.overlap_lines
    }
}

/// Compute the deterministic chunk id for a line range of an episode.
///
/// Format: `<label>:<start>-<end>:<12 hex chars>` where the hash covers the
/// provenance and the chunk text, e.g. `S01E01:0000-0002:9f86d081884c`.
pub fn chunk_id(id: EpisodeId, start_line: usize, end_line: usize, text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(id.label().as_bytes());
    hasher.update(b":");
    hasher.update(start_line.to_le_bytes());
    hasher.update(end_line.to_le_bytes());
    hasher.update(text.as_bytes());
    let digest = hex::encode(hasher.finalize());

    format!(
        "{}:{:04}-{:04}:{}",
        id.label(),
        start_line,
        end_line,
        &digest[..12]
    )
}

/// Chunk one episode's ordered lines under the windowing policy.
pub fn chunk_episode(
    id: EpisodeId,
    lines: &[DialogueLine],
    config: &ChunkingConfig,
) -> Result<Vec<Chunk>> {
    config.validate()?;

    let mut chunks = Vec::new();
    let n = lines.len();
    let mut start = 0;

    while start < n {
        let end = (start + config.window_lines).min(n) - 1;
        let text = lines[start..=end]
            .iter()
            .map(|line| line.text.as_str())
            .collect::<Vec<_>>()
            .join("\n");

        chunks.push(Chunk {
            chunk_id: chunk_id(id, lines[start].line_index, lines[end].line_index, &text),
            season: id.season,
            episode: id.episode,
            start_line: lines[start].line_index,
            end_line: lines[end].line_index,
            text,
        });

        start += config.step();
    }

    debug!("Chunked {} into {} chunks", id, chunks.len());
    Ok(chunks)
}

/// Chunk every episode of a loaded corpus, in (season, episode) order.
pub fn chunk_corpus(corpus: &SubtitleCorpus, config: &ChunkingConfig) -> Result<Vec<Chunk>> {
    let mut chunks = Vec::new();
    for (id, lines) in &corpus.episodes {
        chunks.extend(chunk_episode(*id, lines, config)?);
    }
    Ok(chunks)
}
