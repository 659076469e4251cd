//! Cite command: retrieve-then-answer with verbatim citations.

use super::CommandContext;
use crate::cli::Output;
use crate::config::Settings;
use crate::graph::{citation_graph, CitationState, Stage};
use crate::search::DuckDuckGoSearch;
use crate::structured::ChatAnswerModel;
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;

/// Run the cite command.
pub async fn run_cite(
    question: &str,
    top_k: Option<usize>,
    model: Option<String>,
    json: bool,
    mut settings: Settings,
) -> Result<()> {
    if let Some(k) = top_k {
        settings.citation.top_k = k;
    }

    let ctx = CommandContext::new(settings, model)?;

    let search = Arc::new(DuckDuckGoSearch::new(
        &ctx.settings.search.region,
        Duration::from_secs(ctx.settings.search.timeout_seconds),
    )?);
    let answer_model = Arc::new(
        ChatAnswerModel::new(ctx.client.clone(), &ctx.settings.model.model)
            .with_temperature(ctx.settings.model.temperature),
    );

    let graph = citation_graph(search, answer_model, ctx.prompts.clone(), &ctx.settings.citation)?;

    let spinner = Output::spinner("Searching the web...");
    let result = graph
        .invoke_with(CitationState::new(question), |_, state| {
            if state.stage() == Stage::Retrieved {
                let found = state.context.as_ref().map(Vec::len).unwrap_or(0);
                spinner.set_message(format!("Answering from {} sources...", found));
            }
        })
        .await;
    spinner.finish_and_clear();

    let state = match result {
        Ok(state) => state,
        Err(e) => {
            Output::error(&format!("Failed to answer: {}", e));
            return Err(e.into());
        }
    };

    let answer = state
        .answer
        .ok_or_else(|| anyhow::anyhow!("Pipeline finished without an answer"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&answer)?);
        return Ok(());
    }

    println!("\n{}\n", answer.answer);

    if answer.citation.is_empty() {
        Output::warning("The model returned no citations.");
    } else {
        Output::header("Citations");
        for (i, citation) in answer.citation.iter().enumerate() {
            Output::citation(i + 1, citation);
        }
        println!();
    }

    if let Some(context) = &state.context {
        Output::header(&format!("Retrieved sources ({})", context.len()));
        for doc in context {
            Output::kv(&doc.title, &doc.link);
        }
    }

    Ok(())
}
