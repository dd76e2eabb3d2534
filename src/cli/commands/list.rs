//! List command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the list command.
pub async fn run_list(settings: Settings) -> Result<()> {
    let orchestrator = Orchestrator::new(settings)?;

    match orchestrator.list_episodes().await {
        Ok(episodes) => {
            if episodes.is_empty() {
                Output::info("No episodes indexed yet. Use 'replikk index' to build the index.");
            } else {
                Output::header(&format!("Indexed Episodes ({})", episodes.len()));
                println!();

                for episode in &episodes {
                    Output::episode_info(&episode.label(), episode.chunk_count);
                }

                let total_chunks: u32 = episodes.iter().map(|e| e.chunk_count).sum();
                println!();
                Output::kv("Total episodes", &episodes.len().to_string());
                Output::kv("Total chunks", &total_chunks.to_string());
            }
        }
        Err(e) => {
            Output::error(&format!("Failed to list episodes: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
