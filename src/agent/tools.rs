//! Tool definitions and implementations for the agent system.

use crate::config::FinanceSettings;
use crate::error::{QuillError, Result};
use crate::finance::FinanceProvider;
use crate::search::SearchBackend;
use async_openai::types::{ChatCompletionTool, ChatCompletionToolType, FunctionObject};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const WEB_SEARCH: &str = "web_search";
pub const STOCK_PRICE: &str = "get_current_stock_price";
pub const ANALYST_RECOMMENDATIONS: &str = "get_analyst_recommendations";
pub const COMPANY_INFO: &str = "get_company_info";
pub const TRANSFER_TASK: &str = "transfer_task_to_member";

/// A parsed tool invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "snake_case")]
pub enum ToolCall {
    /// Search the web.
    WebSearch {
        query: String,
        max_results: Option<usize>,
    },

    /// Latest price for a ticker.
    StockPrice { symbol: String },

    /// Analyst rating trend for a ticker.
    AnalystRecommendations { symbol: String },

    /// Company profile for a ticker.
    CompanyInfo { symbol: String },

    /// Hand a task to a team member.
    TransferTask {
        member: String,
        task: String,
        expected_output: Option<String>,
    },
}

struct WebSearchTool {
    backend: Arc<dyn SearchBackend>,
    fixed_max_results: usize,
}

struct FinanceTools {
    provider: Arc<dyn FinanceProvider>,
    stock_price: bool,
    analyst_recommendations: bool,
    company_info: bool,
}

/// The tools an agent may call, with their backends.
#[derive(Clone, Default)]
pub struct ToolContext {
    search: Option<Arc<WebSearchTool>>,
    finance: Option<Arc<FinanceTools>>,
}

impl ToolContext {
    /// An empty tool set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable `web_search`, never returning more than `fixed_max_results` hits.
    pub fn with_web_search(mut self, backend: Arc<dyn SearchBackend>, fixed_max_results: usize) -> Self {
        self.search = Some(Arc::new(WebSearchTool {
            backend,
            fixed_max_results,
        }));
        self
    }

    /// Enable the finance tools switched on in `settings`.
    pub fn with_finance(mut self, provider: Arc<dyn FinanceProvider>, settings: &FinanceSettings) -> Self {
        self.finance = Some(Arc::new(FinanceTools {
            provider,
            stock_price: settings.stock_price,
            analyst_recommendations: settings.analyst_recommendations,
            company_info: settings.company_info,
        }));
        self
    }

    /// Names of the enabled tools.
    pub fn tool_names(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.search.is_some() {
            names.push(WEB_SEARCH);
        }
        if let Some(finance) = &self.finance {
            if finance.stock_price {
                names.push(STOCK_PRICE);
            }
            if finance.analyst_recommendations {
                names.push(ANALYST_RECOMMENDATIONS);
            }
            if finance.company_info {
                names.push(COMPANY_INFO);
            }
        }
        names
    }

    pub fn is_empty(&self) -> bool {
        self.tool_names().is_empty()
    }

    /// Function definitions for the enabled tools.
    pub fn definitions(&self) -> Vec<ChatCompletionTool> {
        self.tool_names()
            .into_iter()
            .filter_map(tool_definition)
            .collect()
    }

    /// Execute a tool call and return the result as a string.
    pub async fn execute(&self, tool: &ToolCall) -> Result<String> {
        match tool {
            ToolCall::WebSearch { query, max_results } => {
                self.execute_web_search(query, *max_results).await
            }
            ToolCall::StockPrice { symbol } => {
                let finance = self.finance_tool(STOCK_PRICE, |f| f.stock_price)?;
                let quote = finance.provider.stock_price(symbol).await?;
                let change = serde_json::json!(quote.change_percent());
                Ok(serde_json::to_string_pretty(&with_field(&quote, "change_percent", change)?)?)
            }
            ToolCall::AnalystRecommendations { symbol } => {
                let finance =
                    self.finance_tool(ANALYST_RECOMMENDATIONS, |f| f.analyst_recommendations)?;
                let trend = finance.provider.analyst_recommendations(symbol).await?;
                let rows = trend
                    .iter()
                    .map(|row| with_field(row, "total", serde_json::json!(row.total())))
                    .collect::<Result<Vec<_>>>()?;
                Ok(serde_json::to_string_pretty(&rows)?)
            }
            ToolCall::CompanyInfo { symbol } => {
                let finance = self.finance_tool(COMPANY_INFO, |f| f.company_info)?;
                let info = finance.provider.company_info(symbol).await?;
                Ok(serde_json::to_string_pretty(&info)?)
            }
            ToolCall::TransferTask { .. } => Err(QuillError::Agent(
                "transfer_task_to_member is only available to team leaders".to_string(),
            )),
        }
    }

    async fn execute_web_search(&self, query: &str, max_results: Option<usize>) -> Result<String> {
        let tool = self
            .search
            .as_ref()
            .ok_or_else(|| QuillError::Agent(format!("Tool not enabled: {}", WEB_SEARCH)))?;

        if tool.fixed_max_results == 0 {
            return Err(QuillError::InvalidInput(format!(
                "{} is configured with max_results = 0",
                WEB_SEARCH
            )));
        }

        let limit = max_results
            .unwrap_or(tool.fixed_max_results)
            .clamp(1, tool.fixed_max_results);
        let results = tool.backend.search(query, limit).await?;

        if results.is_empty() {
            return Ok("No results found.".to_string());
        }

        Ok(serde_json::to_string_pretty(&results)?)
    }

    fn finance_tool(&self, name: &str, enabled: impl Fn(&FinanceTools) -> bool) -> Result<&FinanceTools> {
        self.finance
            .as_deref()
            .filter(|f| enabled(*f))
            .ok_or_else(|| QuillError::Agent(format!("Tool not enabled: {}", name)))
    }
}

/// Serialize `item` and add one derived field to the object.
fn with_field<T: Serialize>(item: &T, key: &str, value: serde_json::Value) -> Result<serde_json::Value> {
    let mut object = serde_json::to_value(item)?;
    if let Some(map) = object.as_object_mut() {
        map.insert(key.to_string(), value);
    }
    Ok(object)
}

fn function_tool(name: &str, description: &str, parameters: serde_json::Value) -> ChatCompletionTool {
    ChatCompletionTool {
        r#type: ChatCompletionToolType::Function,
        function: FunctionObject {
            name: name.to_string(),
            description: Some(description.to_string()),
            parameters: Some(parameters),
            strict: None,
        },
    }
}

fn symbol_parameters() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "symbol": {
                "type": "string",
                "description": "The stock ticker symbol, e.g. NVDA"
            }
        },
        "required": ["symbol"]
    })
}

/// Definition of a single built-in tool by name.
pub fn tool_definition(name: &str) -> Option<ChatCompletionTool> {
    let tool = match name {
        WEB_SEARCH => function_tool(
            WEB_SEARCH,
            "Search the web for up-to-date information. \
            Returns a JSON list of results with title, snippet and link.",
            serde_json::json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "The search query"
                    },
                    "max_results": {
                        "type": "integer",
                        "description": "Maximum number of results"
                    }
                },
                "required": ["query"]
            }),
        ),
        STOCK_PRICE => function_tool(
            STOCK_PRICE,
            "Get the current stock price for a given ticker symbol.",
            symbol_parameters(),
        ),
        ANALYST_RECOMMENDATIONS => function_tool(
            ANALYST_RECOMMENDATIONS,
            "Get analyst recommendations (strong buy to strong sell counts) for a given ticker symbol.",
            symbol_parameters(),
        ),
        COMPANY_INFO => function_tool(
            COMPANY_INFO,
            "Get company profile and key figures (sector, market cap, P/E, 52-week range) for a ticker symbol.",
            symbol_parameters(),
        ),
        _ => return None,
    };
    Some(tool)
}

/// Definition of the delegation tool, restricted to the given member names.
pub fn transfer_definition(members: &[&str]) -> ChatCompletionTool {
    function_tool(
        TRANSFER_TASK,
        "Transfer a task to a member of your team. \
        The member runs the task with their own tools and returns their answer.",
        serde_json::json!({
            "type": "object",
            "properties": {
                "member": {
                    "type": "string",
                    "enum": members,
                    "description": "Name of the team member"
                },
                "task": {
                    "type": "string",
                    "description": "A clear description of the task"
                },
                "expected_output": {
                    "type": "string",
                    "description": "What the member's answer should contain"
                }
            },
            "required": ["member", "task"]
        }),
    )
}

/// Parse a tool call from the function-calling response format.
pub fn parse_tool_call(name: &str, arguments: &str) -> Result<ToolCall> {
    let args: serde_json::Value = if arguments.trim().is_empty() {
        serde_json::json!({})
    } else {
        serde_json::from_str(arguments)
            .map_err(|e| QuillError::Agent(format!("Invalid tool arguments: {}", e)))?
    };

    let string_arg = |key: &str| -> Result<String> {
        args[key]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| QuillError::Agent(format!("Missing '{}' argument", key)))
    };

    match name {
        WEB_SEARCH => Ok(ToolCall::WebSearch {
            query: string_arg("query")?,
            max_results: args["max_results"].as_u64().map(|n| n as usize),
        }),
        STOCK_PRICE => Ok(ToolCall::StockPrice {
            symbol: string_arg("symbol")?,
        }),
        ANALYST_RECOMMENDATIONS => Ok(ToolCall::AnalystRecommendations {
            symbol: string_arg("symbol")?,
        }),
        COMPANY_INFO => Ok(ToolCall::CompanyInfo {
            symbol: string_arg("symbol")?,
        }),
        TRANSFER_TASK => Ok(ToolCall::TransferTask {
            member: string_arg("member")?,
            task: string_arg("task")?,
            expected_output: args["expected_output"].as_str().map(|s| s.to_string()),
        }),
        _ => Err(QuillError::Agent(format!("Unknown tool: {}", name))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finance::{CompanyInfo, RecommendationTrend, StockQuote};
    use crate::search::SearchResult;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct FakeSearch {
        limits: Mutex<Vec<usize>>,
    }

    #[async_trait]
    impl SearchBackend for FakeSearch {
        async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchResult>> {
            self.limits.lock().unwrap().push(max_results);
            Ok((0..max_results)
                .map(|i| SearchResult::new(format!("{} {}", query, i), "snippet", format!("https://{}.example", i)))
                .collect())
        }

        fn name(&self) -> &str {
            "fake"
        }
    }

    struct FakeFinance;

    #[async_trait]
    impl FinanceProvider for FakeFinance {
        async fn stock_price(&self, symbol: &str) -> Result<StockQuote> {
            Ok(StockQuote {
                symbol: symbol.to_string(),
                price: 42.5,
                currency: Some("USD".to_string()),
                previous_close: Some(40.0),
                as_of: None,
            })
        }

        async fn analyst_recommendations(&self, _symbol: &str) -> Result<Vec<RecommendationTrend>> {
            Ok(vec![RecommendationTrend {
                period: "0m".to_string(),
                strong_buy: 10,
                buy: 20,
                hold: 5,
                sell: 1,
                strong_sell: 0,
            }])
        }

        async fn company_info(&self, symbol: &str) -> Result<CompanyInfo> {
            Ok(CompanyInfo {
                symbol: symbol.to_string(),
                ..Default::default()
            })
        }
    }

    #[test]
    fn test_parse_web_search_tool() {
        let tool = parse_tool_call(WEB_SEARCH, r#"{"query": "Vietnam stock market", "max_results": 2}"#).unwrap();
        assert_eq!(
            tool,
            ToolCall::WebSearch {
                query: "Vietnam stock market".to_string(),
                max_results: Some(2),
            }
        );
    }

    #[test]
    fn test_parse_transfer_tool() {
        let tool = parse_tool_call(
            TRANSFER_TASK,
            r#"{"member": "Finance Agent", "task": "Get NVDA price"}"#,
        )
        .unwrap();
        match tool {
            ToolCall::TransferTask { member, task, expected_output } => {
                assert_eq!(member, "Finance Agent");
                assert_eq!(task, "Get NVDA price");
                assert!(expected_output.is_none());
            }
            _ => panic!("Expected TransferTask tool"),
        }
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_tool_call(STOCK_PRICE, r#"{}"#).is_err());
        assert!(parse_tool_call("launch_rockets", r#"{}"#).is_err());
        assert!(parse_tool_call(WEB_SEARCH, "not json").is_err());
    }

    #[test]
    fn test_definitions_follow_enabled_tools() {
        let settings = FinanceSettings {
            analyst_recommendations: false,
            ..FinanceSettings::default()
        };
        let tools = ToolContext::new().with_finance(Arc::new(FakeFinance), &settings);
        assert_eq!(tools.tool_names(), vec![STOCK_PRICE, COMPANY_INFO]);

        let names: Vec<String> = tools
            .definitions()
            .into_iter()
            .map(|d| d.function.name)
            .collect();
        assert_eq!(names, vec![STOCK_PRICE.to_string(), COMPANY_INFO.to_string()]);
        assert!(ToolContext::new().is_empty());
    }

    #[tokio::test]
    async fn test_web_search_is_capped() {
        let backend = Arc::new(FakeSearch {
            limits: Mutex::new(Vec::new()),
        });
        let tools = ToolContext::new().with_web_search(backend.clone(), 1);

        let output = tools
            .execute(&ToolCall::WebSearch {
                query: "rates".to_string(),
                max_results: Some(10),
            })
            .await
            .unwrap();

        let parsed: Vec<SearchResult> = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(*backend.limits.lock().unwrap(), vec![1]);
    }

    #[tokio::test]
    async fn test_zero_result_cap_is_rejected() {
        let backend = Arc::new(FakeSearch {
            limits: Mutex::new(Vec::new()),
        });
        let tools = ToolContext::new().with_web_search(backend.clone(), 0);

        let err = tools
            .execute(&ToolCall::WebSearch {
                query: "rates".to_string(),
                max_results: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, QuillError::InvalidInput(_)));
        assert!(backend.limits.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_disabled_tool_errors() {
        let settings = FinanceSettings {
            stock_price: false,
            ..FinanceSettings::default()
        };
        let tools = ToolContext::new().with_finance(Arc::new(FakeFinance), &settings);

        let err = tools
            .execute(&ToolCall::StockPrice {
                symbol: "NVDA".to_string(),
            })
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Tool not enabled"));

        let info = tools
            .execute(&ToolCall::CompanyInfo {
                symbol: "NVDA".to_string(),
            })
            .await
            .unwrap();
        assert!(info.contains("\"symbol\": \"NVDA\""));
    }

    #[test]
    fn test_transfer_definition_lists_members() {
        let def = transfer_definition(&["Web Agent", "Finance Agent"]);
        let params = def.function.parameters.unwrap();
        assert_eq!(
            params["properties"]["member"]["enum"],
            serde_json::json!(["Web Agent", "Finance Agent"])
        );
    }

    #[tokio::test]
    async fn test_finance_output_includes_derived_figures() {
        let tools = ToolContext::new().with_finance(Arc::new(FakeFinance), &FinanceSettings::default());

        let price = tools
            .execute(&ToolCall::StockPrice {
                symbol: "NVDA".to_string(),
            })
            .await
            .unwrap();
        let price: serde_json::Value = serde_json::from_str(&price).unwrap();
        assert_eq!(price["price"], 42.5);
        assert_eq!(price["change_percent"], 6.25);

        let trend = tools
            .execute(&ToolCall::AnalystRecommendations {
                symbol: "NVDA".to_string(),
            })
            .await
            .unwrap();
        let trend: serde_json::Value = serde_json::from_str(&trend).unwrap();
        assert_eq!(trend[0]["period"], "0m");
        assert_eq!(trend[0]["total"], 36);
    }
}
