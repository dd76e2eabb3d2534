//! Error types for Replikk.

use thiserror::Error;

/// Library-level error type for Replikk operations.
#[derive(Error, Debug)]
pub enum ReplikkError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid subtitle filename: {0}")]
    InvalidFilename(String),

    #[error("Episode has no usable dialogue lines: {0}")]
    EmptyEpisode(String),

    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("Answer generation failed: {0}")]
    Generation(String),

    #[error("The index is empty. Run 'replikk index' to build it first.")]
    EmptyIndex,

    #[error("Vector store error: {0}")]
    VectorStore(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type alias for Replikk operations.
pub type Result<T> = std::result::Result<T, ReplikkError>;
