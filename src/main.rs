//! Quill CLI entry point.

use anyhow::Result;
use clap::Parser;
use quill::cli::{commands, logging, Cli, Commands};
use quill::config::Settings;

#[tokio::main]
async fn main() -> Result<()> {
    // API keys may live in a .env file next to the working directory
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => Settings::load_from(Some(&Settings::expand_path(path)))?,
        None => Settings::load()?,
    };

    logging::init(cli.verbose, &settings.general.log_level);

    match &cli.command {
        Commands::News {
            question,
            max_results,
            model,
        } => {
            commands::run_news(question, *max_results, model.clone(), settings).await?;
        }

        Commands::Team { question, model } => {
            commands::run_team(question, model.clone(), settings).await?;
        }

        Commands::Cite {
            question,
            top_k,
            model,
            json,
        } => {
            commands::run_cite(question, *top_k, model.clone(), *json, settings).await?;
        }

        Commands::Config { action } => {
            commands::run_config(action, settings, cli.config.as_deref())?;
        }
    }

    Ok(())
}
