//! Ready-made agents: the news reporter and the web + finance team.

use super::{Agent, ToolContext};
use crate::config::{Prompts, Settings};
use crate::finance::FinanceProvider;
use crate::openai::ChatClient;
use crate::search::SearchBackend;
use std::sync::Arc;

/// Name of the web research member.
pub const WEB_AGENT: &str = "Web Agent";
/// Name of the market data member.
pub const FINANCE_AGENT: &str = "Finance Agent";
/// Name of the team leader.
pub const TEAM_LEADER: &str = "Team Leader";

fn base_agent(client: &ChatClient, name: &str, settings: &Settings) -> Agent {
    Agent::new(client.clone(), name, &settings.model.model)
        .with_temperature(settings.model.temperature)
        .with_markdown(settings.agent.markdown)
        .with_max_iterations(settings.agent.max_iterations)
}

/// Financial news reporter with a web search tool.
pub fn news_reporter(
    client: &ChatClient,
    settings: &Settings,
    prompts: &Prompts,
    search: Arc<dyn SearchBackend>,
) -> Agent {
    base_agent(client, "News Reporter", settings)
        .with_description(&prompts.news.description)
        .with_tools(ToolContext::new().with_web_search(search, settings.search.news_max_results))
}

/// Agent that searches the web and always cites sources.
pub fn web_agent(
    client: &ChatClient,
    settings: &Settings,
    prompts: &Prompts,
    search: Arc<dyn SearchBackend>,
) -> Agent {
    base_agent(client, WEB_AGENT, settings)
        .with_role(&prompts.team.web_role)
        .with_instructions(prompts.team.web_instructions.iter().cloned())
        .with_tools(ToolContext::new().with_web_search(search, settings.search.max_results))
}

/// Agent with stock price, analyst recommendation and company info tools.
pub fn finance_agent(
    client: &ChatClient,
    settings: &Settings,
    prompts: &Prompts,
    finance: Arc<dyn FinanceProvider>,
) -> Agent {
    base_agent(client, FINANCE_AGENT, settings)
        .with_role(&prompts.team.finance_role)
        .with_instructions(prompts.team.finance_instructions.iter().cloned())
        .with_tools(ToolContext::new().with_finance(finance, &settings.finance))
}

/// Leader coordinating the web and finance agents.
pub fn finance_team(
    client: &ChatClient,
    settings: &Settings,
    prompts: &Prompts,
    search: Arc<dyn SearchBackend>,
    finance: Arc<dyn FinanceProvider>,
) -> Agent {
    base_agent(client, TEAM_LEADER, settings)
        .with_instructions(prompts.team.leader_instructions.iter().cloned())
        .with_member(web_agent(client, settings, prompts, search))
        .with_member(finance_agent(client, settings, prompts, finance))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::finance::{CompanyInfo, RecommendationTrend, StockQuote};
    use crate::openai::create_client_with;
    use crate::search::SearchResult;
    use async_trait::async_trait;
    use std::time::Duration;

    struct NoSearch;

    #[async_trait]
    impl SearchBackend for NoSearch {
        async fn search(&self, _query: &str, _max_results: usize) -> Result<Vec<SearchResult>> {
            Ok(Vec::new())
        }

        fn name(&self) -> &str {
            "none"
        }
    }

    struct NoFinance;

    #[async_trait]
    impl FinanceProvider for NoFinance {
        async fn stock_price(&self, symbol: &str) -> Result<StockQuote> {
            Err(crate::error::QuillError::Finance(symbol.to_string()))
        }

        async fn analyst_recommendations(&self, symbol: &str) -> Result<Vec<RecommendationTrend>> {
            Err(crate::error::QuillError::Finance(symbol.to_string()))
        }

        async fn company_info(&self, symbol: &str) -> Result<CompanyInfo> {
            Err(crate::error::QuillError::Finance(symbol.to_string()))
        }
    }

    fn client() -> ChatClient {
        create_client_with("http://localhost:9/v1", "test-key", Duration::from_secs(1)).unwrap()
    }

    #[test]
    fn test_news_reporter() {
        let agent = news_reporter(&client(), &Settings::default(), &Prompts::default(), Arc::new(NoSearch));
        assert_eq!(agent.tool_names(), vec!["web_search"]);
        assert!(agent
            .system_prompt()
            .starts_with("You are a professional financial news reporter"));
    }

    #[test]
    fn test_finance_team_layout() {
        let team = finance_team(
            &client(),
            &Settings::default(),
            &Prompts::default(),
            Arc::new(NoSearch),
            Arc::new(NoFinance),
        );

        let members: Vec<&str> = team.members().iter().map(|m| m.name()).collect();
        assert_eq!(members, vec![WEB_AGENT, FINANCE_AGENT]);
        assert_eq!(
            team.members()[1].tool_names(),
            vec!["get_current_stock_price", "get_analyst_recommendations", "get_company_info"]
        );

        let prompt = team.system_prompt();
        assert!(prompt.contains("- Always include sources\n- Use tables to display data"));
        assert!(prompt.contains("- Finance Agent: Get financial data"));
    }
}
