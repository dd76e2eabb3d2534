//! Ask command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the ask command.
pub async fn run_ask(
    question: &str,
    model: Option<String>,
    top_k: Option<usize>,
    mut settings: Settings,
) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Ask) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    if let Some(model) = model {
        settings.rag.model = model;
    }

    let orchestrator = Orchestrator::new(settings)?;

    let spinner = Output::spinner("Searching the season...");

    match orchestrator.ask(question, top_k).await {
        Ok(answer) => {
            spinner.finish_and_clear();

            println!("\n{}\n", answer.text);

            if !answer.citations.is_empty() {
                Output::header("Sources");
                for citation in &answer.citations {
                    Output::citation(
                        &citation.episode_label,
                        citation.start_line,
                        citation.end_line,
                        &citation.quote,
                    );
                }
            }
        }
        Err(e) => {
            spinner.finish_and_clear();
            Output::error(&format!("Failed to generate answer: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
