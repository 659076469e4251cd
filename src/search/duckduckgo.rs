//! DuckDuckGo HTML search backend.

use super::{SearchBackend, SearchResult};
use crate::error::{QuillError, Result};
use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

const SEARCH_URL: &str = "https://html.duckduckgo.com/html/";
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

/// Searches the DuckDuckGo HTML endpoint.
pub struct DuckDuckGoSearch {
    client: reqwest::Client,
    region: String,
}

impl DuckDuckGoSearch {
    /// Create a backend for the given region (e.g. "wt-wt").
    pub fn new(region: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            region: region.to_string(),
        })
    }
}

#[async_trait]
impl SearchBackend for DuckDuckGoSearch {
    #[instrument(skip(self), fields(backend = "duckduckgo"))]
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchResult>> {
        if query.trim().is_empty() {
            return Err(QuillError::InvalidInput("Search query is empty".to_string()));
        }

        let response = self
            .client
            .get(SEARCH_URL)
            .query(&[("q", query), ("kl", self.region.as_str())])
            .send()
            .await
            .map_err(|e| QuillError::Search(format!("DuckDuckGo request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(QuillError::Search(format!(
                "DuckDuckGo returned HTTP {}",
                status
            )));
        }

        let html = response.text().await?;
        let results = parse_results(&html, max_results)?;
        debug!("DuckDuckGo returned {} results", results.len());
        Ok(results)
    }

    fn name(&self) -> &str {
        "duckduckgo"
    }
}

/// Parse the result list out of a DuckDuckGo HTML page.
pub(crate) fn parse_results(html: &str, max_results: usize) -> Result<Vec<SearchResult>> {
    let document = Html::parse_document(html);
    let result_selector = selector("div.result")?;
    let title_selector = selector("a.result__a")?;
    let snippet_selector = selector(".result__snippet")?;

    let mut results = Vec::new();

    for block in document.select(&result_selector) {
        if results.len() >= max_results {
            break;
        }

        let is_ad = block
            .value()
            .classes()
            .any(|c| c == "result--ad" || c == "result--ad--small");
        if is_ad {
            continue;
        }

        let Some(anchor) = block.select(&title_selector).next() else {
            continue;
        };
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };

        let title = element_text(&anchor);
        let snippet = block
            .select(&snippet_selector)
            .next()
            .map(|s| element_text(&s))
            .unwrap_or_default();

        results.push(SearchResult {
            title,
            snippet,
            link: resolve_link(href),
        });
    }

    Ok(results)
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| QuillError::Search(format!("Bad selector {}: {:?}", css, e)))
}

/// Collapse an element's text nodes into a single spaced line.
fn element_text(element: &ElementRef<'_>) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Unwrap DuckDuckGo's `/l/?uddg=` redirect links to the target URL.
fn resolve_link(href: &str) -> String {
    let absolute = if href.starts_with("//") {
        format!("https:{}", href)
    } else {
        href.to_string()
    };

    if let Ok(url) = Url::parse(&absolute) {
        if url.path().starts_with("/l/") {
            if let Some((_, target)) = url.query_pairs().find(|(k, _)| k == "uddg") {
                return target.into_owned();
            }
        }
    }

    absolute
}
