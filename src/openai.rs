//! OpenAI client configuration.

use async_openai::{config::OpenAIConfig, Client};
use std::time::Duration;

/// Create an OpenAI client with a custom timeout.
///
/// Every embedding and generation request is bounded by this timeout so a
/// hung backend call cannot stall the pipeline indefinitely.
pub fn create_client_with_timeout(timeout: Duration) -> Client<OpenAIConfig> {
    let http_client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .expect("Failed to create HTTP client");

    Client::with_config(OpenAIConfig::default()).with_http_client(http_client)
}
