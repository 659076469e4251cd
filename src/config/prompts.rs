//! Prompt templates for Quill.
//!
//! Prompts can be customized by placing TOML files in the custom prompts directory.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Prompts {
    pub citation: CitationPrompts,
    pub news: NewsPrompts,
    pub team: TeamPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: std::collections::HashMap<String, String>,
}

/// Prompts for the retrieve-then-answer pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CitationPrompts {
    /// System prompt; `{{context}}` receives the formatted search results.
    pub system: String,
    /// Human turn; `{{question}}` receives the user question.
    pub human: String,
}

impl Default for CitationPrompts {
    fn default() -> Self {
        Self {
            system: "You're a helpful AI assistant. Given a user question \
                and some website snippets, answer the user \
                question. If none of the websites answer the question, \
                just say you don't know.\
                \n\nHere are the website searched: \
                {{context}}"
                .to_string(),
            human: "{{question}}".to_string(),
        }
    }
}

/// Prompts for the single web-search news agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NewsPrompts {
    pub description: String,
}

impl Default for NewsPrompts {
    fn default() -> Self {
        Self {
            description: "You are a professional financial news reporter \
                with expertise in analyzing and summarizing financial news articles. \
                Your task is to search for the latest financial news, \
                analyze the content, and provide a concise summary of the key points."
                .to_string(),
        }
    }
}

/// Prompts for the web + finance agent team.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TeamPrompts {
    pub web_role: String,
    pub web_instructions: Vec<String>,
    pub finance_role: String,
    pub finance_instructions: Vec<String>,
    pub leader_instructions: Vec<String>,
}

impl Default for TeamPrompts {
    fn default() -> Self {
        Self {
            web_role: "Search the web for information".to_string(),
            web_instructions: vec!["Always include sources".to_string()],
            finance_role: "Get financial data".to_string(),
            finance_instructions: vec!["Use tables to display data".to_string()],
            leader_instructions: vec![
                "Always include sources".to_string(),
                "Use tables to display data".to_string(),
            ],
        }
    }
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&std::collections::HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let citation_path = custom_path.join("citation.toml");
            if citation_path.exists() {
                let content = std::fs::read_to_string(&citation_path)?;
                prompts.citation = toml::from_str(&content)?;
            }

            let news_path = custom_path.join("news.toml");
            if news_path.exists() {
                let content = std::fs::read_to_string(&news_path)?;
                prompts.news = toml::from_str(&content)?;
            }

            let team_path = custom_path.join("team.toml");
            if team_path.exists() {
                let content = std::fs::read_to_string(&team_path)?;
                prompts.team = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    pub fn render(template: &str, vars: &std::collections::HashMap<String, String>) -> String {
        let mut result = template.to_string();
        for (key, value) in vars {
            result = result.replace(&format!("{{{{{}}}}}", key), value);
        }
        result
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(
        &self,
        template: &str,
        vars: &std::collections::HashMap<String, String>,
    ) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_prompts() {
        let prompts = Prompts::default();
        assert!(prompts.citation.system.contains("{{context}}"));
        assert_eq!(prompts.citation.human, "{{question}}");
        assert!(prompts.news.description.starts_with("You are a professional financial news reporter"));
        assert_eq!(prompts.team.leader_instructions.len(), 2);
    }

    #[test]
    fn test_render_template() {
        let template = "Hello {{name}}, you have {{count}} messages.";
        let mut vars = HashMap::new();
        vars.insert("name".to_string(), "Alice".to_string());
        vars.insert("count".to_string(), "5".to_string());

        let result = Prompts::render(template, &vars);
        assert_eq!(result, "Hello Alice, you have 5 messages.");
    }

    #[test]
    fn test_provided_vars_override_custom() {
        let mut custom = HashMap::new();
        custom.insert("question".to_string(), "ignored".to_string());
        custom.insert("audience".to_string(), "analysts".to_string());
        let prompts = Prompts::load(None, Some(&custom)).unwrap();

        let mut vars = HashMap::new();
        vars.insert("question".to_string(), "How fast are cheetahs?".to_string());

        let rendered = prompts.render_with_custom("{{question}} for {{audience}}", &vars);
        assert_eq!(rendered, "How fast are cheetahs? for analysts");
    }

    #[test]
    fn test_load_custom_dir_overrides_only_present_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("news.toml"),
            "description = \"You cover commodities.\"\n",
        )
        .unwrap();

        let prompts = Prompts::load(dir.path().to_str(), None).unwrap();
        assert_eq!(prompts.news.description, "You cover commodities.");
        assert!(prompts.citation.system.contains("website snippets"));
    }
}
