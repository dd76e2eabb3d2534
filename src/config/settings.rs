//! Configuration settings for Replikk.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub subtitles: SubtitleSettings,
    pub chunking: ChunkingSettings,
    pub embedding: EmbeddingSettings,
    pub vector_store: VectorStoreSettings,
    pub rag: RagSettings,
    pub prompts: PromptSettings,
}


/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for storing application data.
    pub data_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.replikk".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Subtitle corpus settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SubtitleSettings {
    /// Directory containing SxxEyy.txt subtitle files.
    pub dir: String,
}

impl Default for SubtitleSettings {
    fn default() -> Self {
        Self {
            dir: "~/.replikk/subtitles".to_string(),
        }
    }
}

/// Line-window chunking settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingSettings {
    /// Number of dialogue lines per chunk.
    pub window_lines: usize,
    /// Lines shared between consecutive chunks. Must be smaller than the window.
    pub overlap_lines: usize,
}

impl Default for ChunkingSettings {
    fn default() -> Self {
        Self {
            window_lines: 12,
            overlap_lines: 2,
        }
    }
}

/// Embedding generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Embedding provider (openai).
    pub provider: String,
    /// Embedding model to use.
    pub model: String,
    /// Embedding dimensions.
    pub dimensions: u32,
    /// HTTP timeout for embedding requests.
    pub request_timeout_seconds: u64,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "text-embedding-3-small".to_string(),
            dimensions: 1536,
            request_timeout_seconds: 30,
        }
    }
}

/// Vector store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorStoreSettings {
    /// Vector store provider (sqlite, memory).
    pub provider: String,
    /// Path to SQLite database (for sqlite provider).
    pub sqlite_path: String,
}

impl Default for VectorStoreSettings {
    fn default() -> Self {
        Self {
            provider: "sqlite".to_string(),
            sqlite_path: "~/.replikk/index.db".to_string(),
        }
    }
}

/// RAG (Retrieval-Augmented Generation) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagSettings {
    /// LLM model for answer generation.
    pub model: String,
    /// Number of chunks retrieved per question.
    pub top_k: usize,
    /// Sampling temperature for the answer model.
    pub temperature: f32,
    /// Maximum tokens in a generated answer.
    pub max_tokens: u32,
    /// HTTP timeout for generation requests.
    pub request_timeout_seconds: u64,
}

impl Default for RagSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            top_k: 5,
            temperature: 0.2,
            max_tokens: 1000,
            request_timeout_seconds: 60,
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}


impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            settings.validate()?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to the default configuration file.
    pub fn save(&self) -> crate::error::Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::ReplikkError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject configurations the pipeline cannot run with.
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.chunking.window_lines == 0 {
            return Err(crate::error::ReplikkError::Config(
                "chunking.window_lines must be at least 1".to_string(),
            ));
        }
        if self.chunking.overlap_lines >= self.chunking.window_lines {
            return Err(crate::error::ReplikkError::Config(format!(
                "chunking.overlap_lines ({}) must be smaller than window_lines ({})",
                self.chunking.overlap_lines, self.chunking.window_lines
            )));
        }
        if self.rag.top_k == 0 {
            return Err(crate::error::ReplikkError::Config(
                "rag.top_k must be at least 1".to_string(),
            ));
        }
        match self.vector_store.provider.as_str() {
            "sqlite" | "memory" => {}
            other => {
                return Err(crate::error::ReplikkError::Config(format!(
                    "Unknown vector store provider: {}",
                    other
                )))
            }
        }
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("replikk")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded data directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }

    /// Get the expanded subtitle directory path.
    pub fn subtitle_dir(&self) -> PathBuf {
        Self::expand_path(&self.subtitles.dir)
    }

    /// Get the expanded SQLite database path.
    pub fn sqlite_path(&self) -> PathBuf {
        Self::expand_path(&self.vector_store.sqlite_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.chunking.window_lines, 12);
        assert_eq!(settings.chunking.overlap_lines, 2);
        assert_eq!(settings.rag.top_k, 5);
    }

    #[test]
    fn test_validate_rejects_overlap_ge_window() {
        let mut settings = Settings::default();
        settings.chunking.window_lines = 4;
        settings.chunking.overlap_lines = 4;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_unknown_store() {
        let mut settings = Settings::default();
        settings.vector_store.provider = "pinecone".to_string();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_load_from_partial_toml_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[chunking]\nwindow_lines = 8\n").unwrap();

        let settings = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(settings.chunking.window_lines, 8);
        assert_eq!(settings.chunking.overlap_lines, 2);
        assert_eq!(settings.embedding.model, "text-embedding-3-small");
    }

    #[test]
    fn test_save_and_reload_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut settings = Settings::default();
        settings.rag.top_k = 7;
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(loaded.rag.top_k, 7);
    }
}
