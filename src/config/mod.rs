//! Configuration module for Quill.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{CitationPrompts, NewsPrompts, Prompts, TeamPrompts};
pub use settings::{
    AgentSettings, CitationSettings, FinanceSettings, GeneralSettings, ModelProvider,
    ModelSettings, PromptSettings, SearchSettings, Settings,
};
