//! CLI output formatting utilities.

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Output helper for CLI formatting.
pub struct Output;

impl Output {
    /// Print an info message.
    pub fn info(msg: &str) {
        println!("{} {}", style(">>").cyan().bold(), msg);
    }

    /// Print a success message.
    pub fn success(msg: &str) {
        println!("{} {}", style(">>").green().bold(), msg);
    }

    /// Print a warning message.
    pub fn warning(msg: &str) {
        eprintln!("{} {}", style(">>").yellow().bold(), msg);
    }

    /// Print an error message.
    pub fn error(msg: &str) {
        eprintln!("{} {}", style(">>").red().bold(), msg);
    }

    /// Print a header.
    pub fn header(msg: &str) {
        println!("\n{}", style(msg).bold().underlined());
    }

    /// Print a key-value pair.
    pub fn kv(key: &str, value: &str) {
        println!("  {}: {}", style(key).dim(), value);
    }

    /// Print an indexed episode line.
    pub fn episode_info(label: &str, chunks: u32) {
        println!(
            "  {} {} ({} chunks)",
            style("*").cyan(),
            style(label).bold(),
            chunks
        );
    }

    /// Print an answer citation.
    pub fn citation(label: &str, start_line: usize, end_line: usize, quote: &str) {
        println!(
            "\n{} {} {}",
            style(">>").green(),
            style(label).bold(),
            style(format!("lines {}-{}", start_line, end_line)).cyan()
        );
        println!("   {}", text_preview(quote, 200));
    }

    /// Print a search result.
    pub fn search_result(label: &str, start_line: usize, end_line: usize, score: f32, text: &str) {
        println!(
            "\n{} {} {} (score: {:.2})",
            style(">>").green(),
            style(label).bold(),
            style(format!("lines {}-{}", start_line, end_line)).cyan(),
            score
        );
        println!("   {}", text_preview(text, 200));
    }

    /// Create a spinner.
    pub fn spinner(msg: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap(),
        );
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }
}

/// Truncate text with ellipsis.
fn text_preview(text: &str, max_len: usize) -> String {
    let text = text.replace('\n', " / ");
    if text.chars().count() <= max_len {
        text
    } else {
        let truncated: String = text.chars().take(max_len).collect();
        format!("{}...", truncated)
    }
}
