//! CLI module for Quill.

pub mod commands;
pub mod logging;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

pub const DEFAULT_NEWS_QUESTION: &str = "What is the latest status of the Vietnam stock market?";
pub const DEFAULT_TEAM_QUESTION: &str =
    "What's the market outlook and financial performance of AI semiconductor companies?";
pub const DEFAULT_CITE_QUESTION: &str = "How fast are cheetahs?";

/// Quill - web-grounded agents with citations
///
/// Runs LLM agents with web search and market data tools, a web + finance
/// agent team, and a retrieve-then-answer pipeline that quotes its sources.
#[derive(Parser, Debug)]
#[command(name = "quill")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "QUILL_CONFIG")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Ask the financial news reporter agent (web search)
    News {
        /// The question to ask
        #[arg(default_value = DEFAULT_NEWS_QUESTION)]
        question: String,

        /// Maximum search results per tool call
        #[arg(long)]
        max_results: Option<usize>,

        /// Model to use
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Ask the web + finance agent team
    Team {
        /// The question to ask
        #[arg(default_value = DEFAULT_TEAM_QUESTION)]
        question: String,

        /// Model to use
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Answer from web search results with verbatim citations
    Cite {
        /// The question to ask
        #[arg(default_value = DEFAULT_CITE_QUESTION)]
        question: String,

        /// Number of search results used as context
        #[arg(short = 'k', long)]
        top_k: Option<usize>,

        /// Model to use
        #[arg(short, long)]
        model: Option<String>,

        /// Print the structured answer as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Write the current configuration to the config file
    Init,

    /// Show configuration file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cite_defaults() {
        let cli = Cli::parse_from(["quill", "cite"]);
        match cli.command {
            Commands::Cite { question, top_k, json, .. } => {
                assert_eq!(question, DEFAULT_CITE_QUESTION);
                assert!(top_k.is_none());
                assert!(!json);
            }
            _ => panic!("Expected Cite command"),
        }
    }

    #[test]
    fn test_news_overrides() {
        let cli = Cli::parse_from(["quill", "-vv", "news", "Is gold up today?", "--max-results", "3"]);
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::News { question, max_results, model } => {
                assert_eq!(question, "Is gold up today?");
                assert_eq!(max_results, Some(3));
                assert!(model.is_none());
            }
            _ => panic!("Expected News command"),
        }
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
