//! Search command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the search command.
pub async fn run_search(query: &str, limit: usize, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Search) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let orchestrator = Orchestrator::new(settings)?;

    let spinner = Output::spinner("Searching...");

    match orchestrator.search(query, limit).await {
        Ok(results) => {
            spinner.finish_and_clear();

            if results.is_empty() {
                Output::info("No results found.");
            } else {
                Output::header(&format!("Results for '{}'", query));
                for result in &results {
                    Output::search_result(
                        &result.chunk.episode_label(),
                        result.chunk.start_line,
                        result.chunk.end_line,
                        result.score,
                        &result.chunk.text,
                    );
                }
            }
        }
        Err(e) => {
            spinner.finish_and_clear();
            Output::error(&format!("Search failed: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
