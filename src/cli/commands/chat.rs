//! Interactive question session.
//!
//! Each question is answered independently against the index; there is no
//! conversation history.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;
use console::style;
use std::io::{self, BufRead, Write};

/// Run the interactive chat command.
pub async fn run_chat(model: Option<String>, mut settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Ask) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    if let Some(model) = model {
        settings.rag.model = model;
    }

    let orchestrator = Orchestrator::new(settings)?;

    println!("\n{}", style("Replikk").bold().cyan());
    println!(
        "{}\n",
        style("Ask questions about the indexed season, or 'exit' to quit.").dim()
    );

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("{} ", style("You:").green().bold());
        stdout.flush()?;

        let mut input = String::new();
        if stdin.lock().read_line(&mut input)? == 0 {
            break;
        }

        let input = input.trim();

        if input.is_empty() {
            continue;
        }

        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            Output::info("Goodbye!");
            break;
        }

        if input.eq_ignore_ascii_case("help") {
            Output::info("Type a question about the season. Commands: 'help', 'exit'.");
            continue;
        }

        let spinner = Output::spinner("Thinking...");
        match orchestrator.ask(input, None).await {
            Ok(answer) => {
                spinner.finish_and_clear();
                println!(
                    "\n{} {}\n",
                    style("Replikk:").cyan().bold(),
                    answer.format_for_display()
                );
            }
            Err(e) => {
                spinner.finish_and_clear();
                Output::error(&format!("Error: {}", e));
            }
        }
    }

    Ok(())
}
