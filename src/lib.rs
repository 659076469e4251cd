//! Quill - web-grounded agents with citations
//!
//! A CLI and library for running LLM agents backed by live web search and
//! market data, and for answering questions with verbatim quotes from the
//! pages they were drawn from.
//!
//! # Overview
//!
//! Quill provides:
//! - A financial news reporter agent using DuckDuckGo search
//! - A team of a web agent and a finance agent (Yahoo Finance) led by a coordinator
//! - A retrieve-then-answer pipeline producing an answer plus supporting quotes
//!
//! # Architecture
//!
//! - `config` - Settings and prompt templates
//! - `openai` - Chat client construction for OpenAI-compatible providers (Groq by default)
//! - `search` - Web search backends
//! - `finance` - Market data providers
//! - `agent` - Tool-calling agent loop, tools and team delegation
//! - `citation` - Quoted answer schema and source formatting
//! - `structured` - Forced-function-call structured output
//! - `graph` - Sequential state graph and the citation pipeline
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use quill::config::{Prompts, Settings};
//! use quill::graph::{citation_graph, CitationState};
//! use quill::openai::create_client;
//! use quill::search::DuckDuckGoSearch;
//! use quill::structured::ChatAnswerModel;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let client = create_client(&settings.model)?;
//!     let search = Arc::new(DuckDuckGoSearch::new("wt-wt", Duration::from_secs(30))?);
//!     let model = Arc::new(ChatAnswerModel::new(client, &settings.model.model));
//!
//!     let graph = citation_graph(search, model, Prompts::default(), &settings.citation)?;
//!     let state = graph.invoke(CitationState::new("How fast are cheetahs?")).await?;
//!
//!     if let Some(answer) = state.answer {
//!         println!("{}", answer.answer);
//!         for citation in &answer.citation {
//!             println!("  \"{}\" ({})", citation.text, citation.url);
//!         }
//!     }
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod citation;
pub mod cli;
pub mod config;
pub mod error;
pub mod finance;
pub mod graph;
pub mod openai;
pub mod search;
pub mod structured;

pub use error::{QuillError, Result};
