//! Agent system for tool-calling LLM agents.
//!
//! An agent pairs a hosted chat model with instructions and a set of tools
//! (web search, market data). A team leader is an agent whose extra tool
//! hands tasks to its member agents.

pub mod presets;
mod runner;
mod tools;

pub use runner::{Agent, AgentEvent, AgentResponse, EventHandler, ToolCallRecord};
pub use tools::{
    parse_tool_call, tool_definition, transfer_definition, ToolCall, ToolContext,
    ANALYST_RECOMMENDATIONS, COMPANY_INFO, STOCK_PRICE, TRANSFER_TASK, WEB_SEARCH,
};
