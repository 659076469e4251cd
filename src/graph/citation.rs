//! Retrieve-then-answer graph: `retrieve -> generate_answer`.

use super::{CompiledGraph, Node, StateGraph};
use crate::citation::{format_docs_with_id, QuotedAnswer};
use crate::config::{CitationSettings, Prompts};
use crate::error::{QuillError, Result};
use crate::search::{SearchBackend, SearchResult};
use crate::structured::AnswerModel;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// State threaded through the citation graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CitationState {
    pub question: String,
    pub context: Option<Vec<SearchResult>>,
    pub answer: Option<QuotedAnswer>,
}

/// Where a [`CitationState`] is in the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Start,
    Retrieved,
    Answered,
}

impl CitationState {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            context: None,
            answer: None,
        }
    }

    pub fn stage(&self) -> Stage {
        match (&self.context, &self.answer) {
            (_, Some(_)) => Stage::Answered,
            (Some(_), None) => Stage::Retrieved,
            (None, None) => Stage::Start,
        }
    }
}

/// Runs one web search and stores the hits as context.
pub struct RetrieveNode {
    search: Arc<dyn SearchBackend>,
    top_k: usize,
}

impl RetrieveNode {
    pub fn new(search: Arc<dyn SearchBackend>, top_k: usize) -> Self {
        Self { search, top_k }
    }
}

#[async_trait]
impl Node<CitationState> for RetrieveNode {
    #[instrument(skip(self, state))]
    async fn run(&self, mut state: CitationState) -> Result<CitationState> {
        if state.stage() != Stage::Start {
            return Err(QuillError::Pipeline(
                "retrieve must run on a fresh state".to_string(),
            ));
        }

        let results = self.search.search(&state.question, self.top_k).await?;
        info!(
            "Retrieved {} documents from {} (top_k = {})",
            results.len(),
            self.search.name(),
            self.top_k
        );
        state.context = Some(results);
        Ok(state)
    }
}

/// Formats the context into the prompt and asks the model for a cited answer.
pub struct GenerateAnswerNode {
    model: Arc<dyn AnswerModel>,
    prompts: Prompts,
    verify_quotes: bool,
}

impl GenerateAnswerNode {
    pub fn new(model: Arc<dyn AnswerModel>, prompts: Prompts) -> Self {
        Self {
            model,
            prompts,
            verify_quotes: true,
        }
    }

    pub fn with_verify_quotes(mut self, verify: bool) -> Self {
        self.verify_quotes = verify;
        self
    }
}

#[async_trait]
impl Node<CitationState> for GenerateAnswerNode {
    #[instrument(skip(self, state))]
    async fn run(&self, mut state: CitationState) -> Result<CitationState> {
        if state.stage() != Stage::Retrieved {
            return Err(QuillError::Pipeline(
                "generate_answer requires retrieved context".to_string(),
            ));
        }
        let context = state.context.as_deref().unwrap_or_default();

        let mut vars = HashMap::new();
        vars.insert("question".to_string(), state.question.clone());
        vars.insert("context".to_string(), format_docs_with_id(context));

        let system = self.prompts.render_with_custom(&self.prompts.citation.system, &vars);
        let human = self.prompts.render_with_custom(&self.prompts.citation.human, &vars);

        let answer = self.model.answer(&system, &human).await?;

        if self.verify_quotes {
            for citation in answer.unsupported_citations(context) {
                warn!(url = %citation.url, "Quote not found in retrieved context: {}", citation.text);
            }
        }

        state.answer = Some(answer);
        Ok(state)
    }
}

/// Build the two-node retrieve-then-answer graph.
pub fn citation_graph(
    search: Arc<dyn SearchBackend>,
    model: Arc<dyn AnswerModel>,
    prompts: Prompts,
    settings: &CitationSettings,
) -> Result<CompiledGraph<CitationState>> {
    if settings.top_k == 0 {
        return Err(QuillError::InvalidInput(
            "citation top_k must be at least 1".to_string(),
        ));
    }

    let retrieve: Box<dyn Node<CitationState>> = Box::new(RetrieveNode::new(search, settings.top_k));
    let generate: Box<dyn Node<CitationState>> = Box::new(
        GenerateAnswerNode::new(model, prompts).with_verify_quotes(settings.verify_quotes),
    );

    StateGraph::new()
        .add_sequence([("retrieve", retrieve), ("generate_answer", generate)])
        .compile()
}
