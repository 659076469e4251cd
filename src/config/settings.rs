//! Configuration settings for Quill.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub model: ModelSettings,
    pub search: SearchSettings,
    pub finance: FinanceSettings,
    pub agent: AgentSettings,
    pub citation: CitationSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Log level (trace, debug, info, warn, error) used when no `-v` flag is given.
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
        }
    }
}

/// Hosted model provider. Both speak the OpenAI chat-completions protocol.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ModelProvider {
    #[default]
    Groq,
    OpenAI,
}

impl ModelProvider {
    /// Base URL used when `model.api_base` is left empty.
    pub fn default_api_base(&self) -> &'static str {
        match self {
            ModelProvider::Groq => "https://api.groq.com/openai/v1",
            ModelProvider::OpenAI => "https://api.openai.com/v1",
        }
    }

    /// Environment variable holding the API key.
    pub fn api_key_env(&self) -> &'static str {
        match self {
            ModelProvider::Groq => "GROQ_API_KEY",
            ModelProvider::OpenAI => "OPENAI_API_KEY",
        }
    }
}

impl std::str::FromStr for ModelProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "groq" => Ok(ModelProvider::Groq),
            "openai" => Ok(ModelProvider::OpenAI),
            _ => Err(format!("Unknown model provider: {}", s)),
        }
    }
}

impl std::fmt::Display for ModelProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelProvider::Groq => write!(f, "groq"),
            ModelProvider::OpenAI => write!(f, "openai"),
        }
    }
}

/// Chat model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    pub provider: ModelProvider,
    /// Model identifier sent with every request.
    pub model: String,
    /// Override for the provider base URL. Empty means provider default.
    pub api_base: String,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
    /// Sampling temperature.
    pub temperature: f32,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            provider: ModelProvider::Groq,
            model: "llama-3.3-70b-versatile".to_string(),
            api_base: String::new(),
            timeout_seconds: 300,
            temperature: 0.0,
        }
    }
}

impl ModelSettings {
    /// Effective base URL for the configured provider.
    pub fn api_base(&self) -> String {
        if self.api_base.trim().is_empty() {
            self.provider.default_api_base().to_string()
        } else {
            self.api_base.trim_end_matches('/').to_string()
        }
    }
}

/// Web search settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// DuckDuckGo region code (e.g. "wt-wt", "us-en").
    pub region: String,
    /// Results per search for the team web agent.
    pub max_results: usize,
    /// Results per search for the news reporter agent.
    pub news_max_results: usize,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            region: "wt-wt".to_string(),
            max_results: 3,
            news_max_results: 1,
            timeout_seconds: 30,
        }
    }
}

/// Financial data tool settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FinanceSettings {
    pub stock_price: bool,
    pub analyst_recommendations: bool,
    pub company_info: bool,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
}

impl Default for FinanceSettings {
    fn default() -> Self {
        Self {
            stock_price: true,
            analyst_recommendations: true,
            company_info: true,
            timeout_seconds: 30,
        }
    }
}

/// Agent loop settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentSettings {
    /// Maximum model calls per agent run.
    pub max_iterations: usize,
    /// Ask agents to format answers as markdown.
    pub markdown: bool,
    /// Print tool calls while agents work.
    pub show_tool_calls: bool,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            max_iterations: 15,
            markdown: true,
            show_tool_calls: true,
        }
    }
}

/// Retrieve-then-answer settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CitationSettings {
    /// Number of search results retrieved as context.
    pub top_k: usize,
    /// Log citations whose quote cannot be found in the context.
    pub verify_quotes: bool,
}

impl Default for CitationSettings {
    fn default() -> Self {
        Self {
            top_k: 3,
            verify_quotes: true,
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::QuillError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject counts of zero: a search for zero results or a zero-step agent loop.
    pub fn validate(&self) -> crate::error::Result<()> {
        let counts = [
            ("search.max_results", self.search.max_results),
            ("search.news_max_results", self.search.news_max_results),
            ("citation.top_k", self.citation.top_k),
            ("agent.max_iterations", self.agent.max_iterations),
        ];

        for (key, value) in counts {
            if value == 0 {
                return Err(crate::error::QuillError::InvalidInput(format!(
                    "{} must be at least 1",
                    key
                )));
            }
        }
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("quill")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }
}
