//! Yahoo Finance backend.

use super::{CompanyInfo, FinanceProvider, RecommendationTrend, StockQuote};
use crate::error::{QuillError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, instrument};

const CHART_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";
const SUMMARY_URL: &str = "https://query2.finance.yahoo.com/v10/finance/quoteSummary";
const COOKIE_URL: &str = "https://fc.yahoo.com";
const CRUMB_URL: &str = "https://query2.finance.yahoo.com/v1/test/getcrumb";
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

const PROFILE_MODULES: &str = "assetProfile,price,summaryDetail,defaultKeyStatistics";

/// Yahoo Finance market data client.
pub struct YahooFinance {
    client: reqwest::Client,
    crumb: OnceCell<String>,
}

impl YahooFinance {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .cookie_store(true)
            .build()?;

        Ok(Self {
            client,
            crumb: OnceCell::new(),
        })
    }

    /// quoteSummary needs a session cookie plus a crumb token; fetched once.
    async fn crumb(&self) -> Result<&str> {
        let crumb = self
            .crumb
            .get_or_try_init(|| async {
                // fc.yahoo.com answers 404 but sets the session cookie.
                let _ = self.client.get(COOKIE_URL).send().await?;

                let response = self.client.get(CRUMB_URL).send().await?;
                if !response.status().is_success() {
                    return Err(QuillError::Finance(format!(
                        "Failed to obtain Yahoo crumb: HTTP {}",
                        response.status()
                    )));
                }
                let crumb = response.text().await?.trim().to_string();
                if crumb.is_empty() {
                    return Err(QuillError::Finance("Yahoo returned an empty crumb".to_string()));
                }
                debug!("Obtained Yahoo crumb");
                Ok::<_, QuillError>(crumb)
            })
            .await?;
        Ok(crumb.as_str())
    }

    async fn quote_summary(&self, symbol: &str, modules: &str) -> Result<SummaryResult> {
        let crumb = self.crumb().await?;
        let response = self
            .client
            .get(format!("{}/{}", SUMMARY_URL, symbol))
            .query(&[("modules", modules), ("crumb", crumb)])
            .send()
            .await
            .map_err(|e| QuillError::Finance(format!("Yahoo request failed: {}", e)))?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(http_error(symbol, status, &body));
        }
        parse_summary(symbol, &body)
    }
}

#[async_trait]
impl FinanceProvider for YahooFinance {
    #[instrument(skip(self))]
    async fn stock_price(&self, symbol: &str) -> Result<StockQuote> {
        let symbol = normalize_symbol(symbol)?;
        let response = self
            .client
            .get(format!("{}/{}", CHART_URL, symbol))
            .query(&[("range", "1d"), ("interval", "1d")])
            .send()
            .await
            .map_err(|e| QuillError::Finance(format!("Yahoo request failed: {}", e)))?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(http_error(&symbol, status, &body));
        }
        parse_chart(&symbol, &body)
    }

    #[instrument(skip(self))]
    async fn analyst_recommendations(&self, symbol: &str) -> Result<Vec<RecommendationTrend>> {
        let symbol = normalize_symbol(symbol)?;
        let summary = self.quote_summary(&symbol, "recommendationTrend").await?;
        recommendations_from(&symbol, summary)
    }

    #[instrument(skip(self))]
    async fn company_info(&self, symbol: &str) -> Result<CompanyInfo> {
        let symbol = normalize_symbol(symbol)?;
        let summary = self.quote_summary(&symbol, PROFILE_MODULES).await?;
        Ok(company_info_from(&symbol, summary))
    }
}

fn normalize_symbol(symbol: &str) -> Result<String> {
    let symbol = symbol.trim().to_uppercase();
    if symbol.is_empty() || symbol.contains(char::is_whitespace) || symbol.contains('/') {
        return Err(QuillError::InvalidInput(format!(
            "Invalid ticker symbol: '{}'",
            symbol
        )));
    }
    Ok(symbol)
}

// Response shapes. Yahoo wraps most numbers as {"raw": 1.0, "fmt": "1.00"}.

#[derive(Debug, Deserialize)]
struct YahooError {
    code: Option<String>,
    description: Option<String>,
}

impl YahooError {
    fn message(&self) -> String {
        match (&self.code, &self.description) {
            (Some(code), Some(desc)) => format!("{}: {}", code, desc),
            (None, Some(desc)) => desc.clone(),
            (Some(code), None) => code.clone(),
            (None, None) => "unknown error".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    result: Option<Vec<ChartResult>>,
    error: Option<YahooError>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    symbol: Option<String>,
    currency: Option<String>,
    regular_market_price: Option<f64>,
    chart_previous_close: Option<f64>,
    regular_market_time: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryEnvelope {
    quote_summary: SummaryBody,
}

#[derive(Debug, Deserialize)]
struct SummaryBody {
    result: Option<Vec<SummaryResult>>,
    error: Option<YahooError>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct SummaryResult {
    recommendation_trend: Option<TrendModule>,
    asset_profile: Option<AssetProfile>,
    price: Option<PriceModule>,
    summary_detail: Option<SummaryDetail>,
    default_key_statistics: Option<KeyStatistics>,
}

#[derive(Debug, Deserialize)]
struct TrendModule {
    #[serde(default)]
    trend: Vec<TrendRow>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TrendRow {
    period: String,
    #[serde(default)]
    strong_buy: u32,
    #[serde(default)]
    buy: u32,
    #[serde(default)]
    hold: u32,
    #[serde(default)]
    sell: u32,
    #[serde(default)]
    strong_sell: u32,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct AssetProfile {
    sector: Option<String>,
    industry: Option<String>,
    country: Option<String>,
    website: Option<String>,
    full_time_employees: Option<u64>,
    long_business_summary: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct PriceModule {
    long_name: Option<String>,
    short_name: Option<String>,
    currency: Option<String>,
    regular_market_price: Option<Raw>,
    market_cap: Option<Raw>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct SummaryDetail {
    #[serde(rename = "trailingPE")]
    trailing_pe: Option<Raw>,
    #[serde(rename = "forwardPE")]
    forward_pe: Option<Raw>,
    fifty_two_week_low: Option<Raw>,
    fifty_two_week_high: Option<Raw>,
    dividend_yield: Option<Raw>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct KeyStatistics {
    #[serde(rename = "forwardPE")]
    forward_pe: Option<Raw>,
}

#[derive(Debug, Default, Deserialize)]
struct Raw {
    raw: Option<f64>,
}

fn raw(value: &Option<Raw>) -> Option<f64> {
    value.as_ref().and_then(|v| v.raw)
}

/// Error for a non-2xx response, preferring Yahoo's own error description.
///
/// Rejected crumbs come back as `{"finance":{"error":..}}`; unknown symbols
/// use the endpoint's envelope (`chart` or `quoteSummary`).
fn http_error(symbol: &str, status: reqwest::StatusCode, body: &str) -> QuillError {
    let detail = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            ["finance", "chart", "quoteSummary"]
                .iter()
                .find_map(|key| value.get(*key)?.get("error").cloned())
        })
        .and_then(|error| serde_json::from_value::<YahooError>(error).ok());

    match detail {
        Some(err) => QuillError::Finance(format!("{}: {} (HTTP {})", symbol, err.message(), status)),
        None => QuillError::Finance(format!("Yahoo returned HTTP {} for {}", status, symbol)),
    }
}

fn parse_chart(symbol: &str, body: &str) -> Result<StockQuote> {
    let envelope: ChartEnvelope = serde_json::from_str(body)
        .map_err(|e| QuillError::Finance(format!("Unexpected chart response for {}: {}", symbol, e)))?;

    if let Some(err) = envelope.chart.error {
        return Err(QuillError::Finance(format!("{}: {}", symbol, err.message())));
    }

    let meta = envelope
        .chart
        .result
        .and_then(|r| r.into_iter().next())
        .map(|r| r.meta)
        .ok_or_else(|| QuillError::Finance(format!("No price data for {}", symbol)))?;

    let price = meta
        .regular_market_price
        .ok_or_else(|| QuillError::Finance(format!("No market price for {}", symbol)))?;

    Ok(StockQuote {
        symbol: meta.symbol.unwrap_or_else(|| symbol.to_string()),
        price,
        currency: meta.currency,
        previous_close: meta.chart_previous_close,
        as_of: meta
            .regular_market_time
            .and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0)),
    })
}

fn parse_summary(symbol: &str, body: &str) -> Result<SummaryResult> {
    let envelope: SummaryEnvelope = serde_json::from_str(body).map_err(|e| {
        QuillError::Finance(format!("Unexpected quoteSummary response for {}: {}", symbol, e))
    })?;

    if let Some(err) = envelope.quote_summary.error {
        return Err(QuillError::Finance(format!("{}: {}", symbol, err.message())));
    }

    envelope
        .quote_summary
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| QuillError::Finance(format!("No summary data for {}", symbol)))
}

fn recommendations_from(symbol: &str, summary: SummaryResult) -> Result<Vec<RecommendationTrend>> {
    let trend = summary
        .recommendation_trend
        .map(|m| m.trend)
        .unwrap_or_default();

    if trend.is_empty() {
        return Err(QuillError::Finance(format!(
            "No analyst recommendations for {}",
            symbol
        )));
    }

    Ok(trend
        .into_iter()
        .map(|row| RecommendationTrend {
            period: row.period,
            strong_buy: row.strong_buy,
            buy: row.buy,
            hold: row.hold,
            sell: row.sell,
            strong_sell: row.strong_sell,
        })
        .collect())
}

fn company_info_from(symbol: &str, summary: SummaryResult) -> CompanyInfo {
    let profile = summary.asset_profile.unwrap_or_default();
    let price = summary.price.unwrap_or_default();
    let detail = summary.summary_detail.unwrap_or_default();
    let stats = summary.default_key_statistics.unwrap_or_default();

    CompanyInfo {
        symbol: symbol.to_string(),
        name: price.long_name.or(price.short_name),
        sector: profile.sector,
        industry: profile.industry,
        country: profile.country,
        website: profile.website,
        employees: profile.full_time_employees,
        summary: profile.long_business_summary,
        currency: price.currency,
        current_price: raw(&price.regular_market_price),
        market_cap: raw(&price.market_cap),
        trailing_pe: raw(&detail.trailing_pe),
        forward_pe: raw(&detail.forward_pe).or(raw(&stats.forward_pe)),
        fifty_two_week_low: raw(&detail.fifty_two_week_low),
        fifty_two_week_high: raw(&detail.fifty_two_week_high),
        dividend_yield: raw(&detail.dividend_yield),
    }
}
