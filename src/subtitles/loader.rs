//! Loading subtitle files from disk.
//!
//! One malformed file never blocks the rest of the corpus: non-conforming
//! filenames and empty episodes are skipped with a warning and reported in
//! the load summary.

use super::{DialogueLine, EpisodeId};
use crate::error::{ReplikkError, Result};
use regex::Regex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, info, warn};

/// Filename pattern: `S<2 digits>E<2 digits>.txt`, letters case-insensitive.
fn filename_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[Ss](\d{2})[Ee](\d{2})\.txt$").unwrap())
}

/// Parse season/episode numbers from a subtitle filename.
pub fn parse_episode_filename(filename: &str) -> Result<EpisodeId> {
    let caps = filename_pattern().captures(filename).ok_or_else(|| {
        ReplikkError::InvalidFilename(format!(
            "'{}' does not match the S01E01.txt naming convention",
            filename
        ))
    })?;

    // Two-digit captures always parse.
    let season: u32 = caps[1].parse().unwrap();
    let episode: u32 = caps[2].parse().unwrap();
    Ok(EpisodeId::new(season, episode))
}

/// A file that was skipped during a directory load.
#[derive(Debug, Clone)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

/// Result of loading a subtitle directory.
#[derive(Debug, Default)]
pub struct SubtitleCorpus {
    /// Ordered by (season, episode); lines ordered by line_index.
    pub episodes: BTreeMap<EpisodeId, Vec<DialogueLine>>,
    /// Files that did not yield an episode, with the reason.
    pub skipped: Vec<SkippedFile>,
}

impl SubtitleCorpus {
    /// Total number of dialogue lines across all episodes.
    pub fn line_count(&self) -> usize {
        self.episodes.values().map(|lines| lines.len()).sum()
    }

    /// All lines in (season, episode, line_index) order.
    pub fn all_lines(&self) -> impl Iterator<Item = &DialogueLine> {
        self.episodes.values().flatten()
    }
}

/// Load a single episode file.
///
/// Fails with `InvalidFilename` for non-conforming names and `EmptyEpisode`
/// if the file yields zero usable lines after trimming.
pub fn load_episode(path: &Path) -> Result<(EpisodeId, Vec<DialogueLine>)> {
    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| ReplikkError::InvalidFilename(format!("{}", path.display())))?;

    let id = parse_episode_filename(filename)?;
    let content = std::fs::read_to_string(path)?;

    let lines: Vec<DialogueLine> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .enumerate()
        .map(|(line_index, text)| DialogueLine {
            season: id.season,
            episode: id.episode,
            line_index,
            text: text.to_string(),
        })
        .collect();

    if lines.is_empty() {
        return Err(ReplikkError::EmptyEpisode(format!("{}", path.display())));
    }

    debug!("Loaded {} with {} lines", id, lines.len());
    Ok((id, lines))
}

/// Load every episode file in a directory.
///
/// Files that do not match the naming convention or contain no usable lines
/// are skipped with a warning; they appear in the returned summary rather
/// than aborting the load.
pub fn load_directory(dir: &Path) -> Result<SubtitleCorpus> {
    if !dir.is_dir() {
        return Err(ReplikkError::InvalidInput(format!(
            "Subtitle directory not found: {}",
            dir.display()
        )));
    }

    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .collect();
    paths.sort();

    let mut corpus = SubtitleCorpus::default();

    for path in paths {
        match load_episode(&path) {
            Ok((id, lines)) => {
                corpus.episodes.insert(id, lines);
            }
            Err(e @ (ReplikkError::InvalidFilename(_) | ReplikkError::EmptyEpisode(_))) => {
                warn!("Skipping {}: {}", path.display(), e);
                corpus.skipped.push(SkippedFile {
                    path,
                    reason: e.to_string(),
                });
            }
            Err(e) => return Err(e),
        }
    }

    info!(
        "Loaded {} episodes ({} lines), skipped {} files",
        corpus.episodes.len(),
        corpus.line_count(),
        corpus.skipped.len()
    );

    Ok(corpus)
}
