//! Web search backends used as agent tools and as the retrieval stage.

mod duckduckgo;

pub use duckduckgo::DuckDuckGoSearch;

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A single web search hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Page title.
    pub title: String,
    /// Short text excerpt shown by the search engine.
    pub snippet: String,
    /// Source URL.
    pub link: String,
}

impl SearchResult {
    pub fn new(
        title: impl Into<String>,
        snippet: impl Into<String>,
        link: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            snippet: snippet.into(),
            link: link.into(),
        }
    }
}

/// Trait for web search backends.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Search the web, returning at most `max_results` hits in engine order.
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchResult>>;

    /// Backend name for logs and tool listings.
    fn name(&self) -> &str;
}
