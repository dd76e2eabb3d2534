//! Subtitle ingestion: episode transcripts as ordered dialogue lines.
//!
//! Episodes are plain-text files named `S01E01.txt`, one dialogue line per
//! line. The loader validates filenames, strips blank lines, and tags every
//! line with its season/episode provenance.

mod loader;

pub use loader::{load_directory, load_episode, parse_episode_filename, SkippedFile, SubtitleCorpus};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies one episode of a season.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EpisodeId {
    pub season: u32,
    pub episode: u32,
}

impl EpisodeId {
    pub fn new(season: u32, episode: u32) -> Self {
        Self { season, episode }
    }

    /// Canonical episode label, e.g. "S01E01".
    pub fn label(&self) -> String {
        format!("S{:02}E{:02}", self.season, self.episode)
    }
}

impl fmt::Display for EpisodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S{:02}E{:02}", self.season, self.episode)
    }
}

/// A single line of dialogue from an episode transcript.
///
/// Immutable once loaded. `line_index` is 0-based in file order and strictly
/// increasing within an episode; `text` is trimmed and never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogueLine {
    pub season: u32,
    pub episode: u32,
    pub line_index: usize,
    pub text: String,
}

impl DialogueLine {
    /// The episode this line belongs to.
    pub fn episode_id(&self) -> EpisodeId {
        EpisodeId::new(self.season, self.episode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_episode_label() {
        assert_eq!(EpisodeId::new(1, 1).label(), "S01E01");
        assert_eq!(EpisodeId::new(2, 13).label(), "S02E13");
        assert_eq!(format!("{}", EpisodeId::new(10, 5)), "S10E05");
    }

    #[test]
    fn test_episode_ordering() {
        let mut ids = vec![
            EpisodeId::new(2, 1),
            EpisodeId::new(1, 3),
            EpisodeId::new(1, 1),
        ];
        ids.sort();
        assert_eq!(
            ids,
            vec![
                EpisodeId::new(1, 1),
                EpisodeId::new(1, 3),
                EpisodeId::new(2, 1),
            ]
        );
    }
}
