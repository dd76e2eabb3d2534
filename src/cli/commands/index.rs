//! Index command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::indexer::IndexMode;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the index command.
pub async fn run_index(dir: Option<String>, rebuild: bool, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Index) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let subtitle_dir = match dir {
        Some(d) => Settings::expand_path(&d),
        None => settings.subtitle_dir(),
    };

    let orchestrator = Orchestrator::new(settings)?;

    let mode = if rebuild {
        IndexMode::Rebuild
    } else {
        IndexMode::Incremental
    };

    Output::info(&format!("Indexing subtitles from {}", subtitle_dir.display()));
    let spinner = Output::spinner("Embedding and indexing chunks...");

    match orchestrator.build_index(&subtitle_dir, mode).await {
        Ok((report, skipped)) => {
            spinner.finish_and_clear();

            for file in &skipped {
                Output::warning(&format!("Skipped {}: {}", file.path.display(), file.reason));
            }

            Output::success(&format!(
                "Indexed {} chunks ({} already present, {} total)",
                report.chunks_indexed, report.chunks_skipped, report.chunks_total
            ));
        }
        Err(e) => {
            spinner.finish_and_clear();
            Output::error(&format!("Indexing failed: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
