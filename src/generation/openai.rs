//! OpenAI chat completion implementation of the generator.

use super::Generator;
use crate::error::{ReplikkError, Result};
use crate::openai::create_client_with_timeout;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, instrument};

/// OpenAI chat completion generator.
pub struct OpenAIGenerator {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl OpenAIGenerator {
    /// Create a generator with custom model and sampling parameters.
    pub fn with_config(
        model: &str,
        temperature: f32,
        max_tokens: u32,
        timeout: Duration,
    ) -> Self {
        Self {
            client: create_client_with_timeout(timeout),
            model: model.to_string(),
            temperature,
            max_tokens,
        }
    }
}

#[async_trait]
impl Generator for OpenAIGenerator {
    #[instrument(skip(self, system_prompt, user_prompt))]
    async fn generate(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(system_prompt)
                .build()
                .map_err(|e| ReplikkError::Generation(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(user_prompt)
                .build()
                .map_err(|e| ReplikkError::Generation(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(self.temperature)
            .max_tokens(self.max_tokens)
            .build()
            .map_err(|e| ReplikkError::Generation(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| ReplikkError::Generation(format!("Chat API error: {}", e)))?;

        let answer = response
            .choices
            .first()
            .and_then(|c| c.message.content.as_ref())
            .ok_or_else(|| ReplikkError::Generation("Empty response from LLM".to_string()))?
            .clone();

        debug!("Generated {} characters", answer.len());
        Ok(answer)
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}
