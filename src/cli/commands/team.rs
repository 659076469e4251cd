//! Team command: leader delegating to web and finance agents.

use super::{print_agent_response, tool_call_printer, CommandContext};
use crate::agent::presets::finance_team;
use crate::cli::Output;
use crate::config::Settings;
use crate::finance::YahooFinance;
use crate::search::DuckDuckGoSearch;
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;

/// Run the team command.
pub async fn run_team(question: &str, model: Option<String>, settings: Settings) -> Result<()> {
    let ctx = CommandContext::new(settings, model)?;

    let search = Arc::new(DuckDuckGoSearch::new(
        &ctx.settings.search.region,
        Duration::from_secs(ctx.settings.search.timeout_seconds),
    )?);
    let finance = Arc::new(YahooFinance::new(Duration::from_secs(
        ctx.settings.finance.timeout_seconds,
    ))?);

    Output::header(question);

    let spinner = Output::spinner("Team working...");
    let mut team = finance_team(&ctx.client, &ctx.settings, &ctx.prompts, search, finance);
    if let Some(handler) = tool_call_printer(ctx.settings.agent.show_tool_calls, &spinner) {
        team = team.with_event_handler(handler);
    }

    match team.run(question).await {
        Ok(response) => {
            spinner.finish_and_clear();
            print_agent_response(&response);
        }
        Err(e) => {
            spinner.finish_and_clear();
            Output::error(&format!("Team failed: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
