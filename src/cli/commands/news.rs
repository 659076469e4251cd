//! News command: single reporter agent with web search.

use super::{print_agent_response, tool_call_printer, CommandContext};
use crate::agent::presets::news_reporter;
use crate::cli::Output;
use crate::config::Settings;
use crate::search::DuckDuckGoSearch;
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;

/// Run the news command.
pub async fn run_news(
    question: &str,
    max_results: Option<usize>,
    model: Option<String>,
    mut settings: Settings,
) -> Result<()> {
    if let Some(n) = max_results {
        settings.search.news_max_results = n;
    }

    let ctx = CommandContext::new(settings, model)?;

    let search = Arc::new(DuckDuckGoSearch::new(
        &ctx.settings.search.region,
        Duration::from_secs(ctx.settings.search.timeout_seconds),
    )?);

    Output::header(question);

    let spinner = Output::spinner("Reporter researching...");
    let mut agent = news_reporter(&ctx.client, &ctx.settings, &ctx.prompts, search);
    if let Some(handler) = tool_call_printer(ctx.settings.agent.show_tool_calls, &spinner) {
        agent = agent.with_event_handler(handler);
    }

    match agent.run(question).await {
        Ok(response) => {
            spinner.finish_and_clear();
            print_agent_response(&response);
        }
        Err(e) => {
            spinner.finish_and_clear();
            Output::error(&format!("Agent failed: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
