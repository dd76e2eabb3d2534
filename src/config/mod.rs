//! Configuration module for Replikk.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{Prompts, RagPrompts};
pub use settings::{
    ChunkingSettings, EmbeddingSettings, GeneralSettings, PromptSettings, RagSettings, Settings,
    SubtitleSettings, VectorStoreSettings,
};
