//! Financial market data used by the finance agent's tools.

mod yahoo;

pub use yahoo::YahooFinance;

use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Latest traded price for a ticker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockQuote {
    pub symbol: String,
    pub price: f64,
    pub currency: Option<String>,
    pub previous_close: Option<f64>,
    /// Time of the last regular-market trade.
    pub as_of: Option<DateTime<Utc>>,
}

impl StockQuote {
    /// Percentage move against the previous close.
    pub fn change_percent(&self) -> Option<f64> {
        self.previous_close
            .filter(|prev| *prev != 0.0)
            .map(|prev| (self.price - prev) / prev * 100.0)
    }
}

/// Analyst rating counts for one period ("0m" is the current month, "-1m" the previous).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendationTrend {
    pub period: String,
    pub strong_buy: u32,
    pub buy: u32,
    pub hold: u32,
    pub sell: u32,
    pub strong_sell: u32,
}

impl RecommendationTrend {
    pub fn total(&self) -> u32 {
        self.strong_buy + self.buy + self.hold + self.sell + self.strong_sell
    }
}

/// Company profile and headline valuation figures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CompanyInfo {
    pub symbol: String,
    pub name: Option<String>,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub country: Option<String>,
    pub website: Option<String>,
    pub employees: Option<u64>,
    pub summary: Option<String>,
    pub currency: Option<String>,
    pub current_price: Option<f64>,
    pub market_cap: Option<f64>,
    pub trailing_pe: Option<f64>,
    pub forward_pe: Option<f64>,
    pub fifty_two_week_low: Option<f64>,
    pub fifty_two_week_high: Option<f64>,
    pub dividend_yield: Option<f64>,
}

/// Trait for market data providers.
#[async_trait]
pub trait FinanceProvider: Send + Sync {
    /// Current price for a ticker symbol.
    async fn stock_price(&self, symbol: &str) -> Result<StockQuote>;

    /// Analyst recommendation trend, most recent period first.
    async fn analyst_recommendations(&self, symbol: &str) -> Result<Vec<RecommendationTrend>>;

    /// Company profile.
    async fn company_info(&self, symbol: &str) -> Result<CompanyInfo>;
}
