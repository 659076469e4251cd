//! CLI output formatting utilities.

use crate::agent::AgentEvent;
use crate::citation::Citation;
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

    /// Print a list item.
    pub fn list_item(msg: &str) {
        println!("  {} {}", style("*").cyan(), msg);
    }

    /// Print a numbered citation.
    pub fn citation(index: usize, citation: &Citation) {
        println!(
            "\n{} \"{}\"",
            style(format!("[{}]", index)).green().bold(),
            citation.text
        );
        println!("    {}", style(&citation.url).dim());
    }

    /// Print an agent progress event.
    pub fn agent_event(event: &AgentEvent) {
        match event {
            AgentEvent::ToolCall {
                agent,
                name,
                arguments,
            } => {
                println!(
                    "{} {} {}({})",
                    style(">>").cyan(),
                    style(agent).bold(),
                    style(name).yellow(),
                    truncate(arguments, 80)
                );
            }
            AgentEvent::ToolResult { agent, name, result } => {
                println!(
                    "   {} {} {} returned {}",
                    style("<-").dim(),
                    style(agent).dim(),
                    style(name).dim(),
                    style(preview(result, 100)).dim()
                );
            }
            AgentEvent::Delegated { from, to, task } => {
                println!(
                    "{} {} -> {}: {}",
                    style(">>").magenta(),
                    style(from).bold(),
                    style(to).bold(),
                    truncate(task, 80)
                );
            }
            // The final answer is printed by the command.
            AgentEvent::Response { .. } => {}
        }
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

/// Truncate on a character boundary with an ellipsis.
pub(crate) fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}

/// Single-line preview of multi-line content.
fn preview(content: &str, max_chars: usize) -> String {
    let flat = content.split_whitespace().collect::<Vec<_>>().join(" ");
    truncate(&flat, max_chars)
}
