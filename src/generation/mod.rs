//! Answer generation via an external language model.
//!
//! The generator is a minimal capability interface so the answer composer
//! can be exercised with a deterministic test double.

mod openai;

pub use openai::OpenAIGenerator;

use crate::error::Result;
use async_trait::async_trait;

/// Trait for text generation backends.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Generate a completion for a system + user prompt pair.
    async fn generate(&self, system_prompt: &str, user_prompt: &str) -> Result<String>;

    /// Identifier of the generation model.
    fn model_id(&self) -> &str;
}
