//! CLI command implementations.

mod cite;
mod config;
mod news;
mod team;

pub use cite::run_cite;
pub use config::run_config;
pub use news::run_news;
pub use team::run_team;

use crate::agent::{AgentEvent, AgentResponse, EventHandler};
use crate::cli::preflight;
use crate::cli::Output;
use crate::config::{Prompts, Settings};
use crate::openai::{create_client, ChatClient};
use indicatif::ProgressBar;
use std::sync::Arc;

/// Shared setup for commands that talk to the model.
struct CommandContext {
    settings: Settings,
    prompts: Prompts,
    client: ChatClient,
}

impl CommandContext {
    fn new(mut settings: Settings, model: Option<String>) -> anyhow::Result<Self> {
        if let Some(model) = model {
            settings.model.model = model;
        }

        if let Err(e) = settings.validate() {
            Output::error(&format!("{}", e));
            return Err(e.into());
        }

        if let Err(e) = preflight::check(&settings.model) {
            Output::error(&format!("{}", e));
            return Err(e.into());
        }

        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;
        let client = create_client(&settings.model)?;

        Ok(Self {
            settings,
            prompts,
            client,
        })
    }
}

/// Event handler printing tool calls above the spinner, if enabled.
fn tool_call_printer(show: bool, spinner: &ProgressBar) -> Option<EventHandler> {
    if !show {
        return None;
    }
    let spinner = spinner.clone();
    Some(Arc::new(move |event: &AgentEvent| {
        spinner.suspend(|| Output::agent_event(event));
    }))
}

/// Print the final agent answer and a short summary of its work.
fn print_agent_response(response: &AgentResponse) {
    println!("\n{}\n", response.content);

    if !response.tool_calls.is_empty() {
        Output::header(&format!("Tool calls ({})", response.tool_calls.len()));
        for call in &response.tool_calls {
            Output::list_item(&crate::cli::output::truncate(&call.to_string(), 80));
        }
        println!();
    }

    Output::info(&format!("Completed in {} iteration(s)", response.iterations));
}
