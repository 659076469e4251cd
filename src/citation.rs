//! Cited answers: the structured output of the retrieve-then-answer pipeline.

use crate::search::SearchResult;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// A verbatim quote and the URL it was taken from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    /// The VERBATIM quote from the specified source that justifies the answer.
    pub text: String,
    /// The URL of the source.
    pub url: String,
}

/// Answer the user question based only on the given sources, and cite the sources used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotedAnswer {
    /// The answer to the question, which is based only on the given sources.
    pub answer: String,
    /// The citations that justify the answer.
    pub citation: Vec<Citation>,
}

impl QuotedAnswer {
    /// Name of the function the model is forced to call.
    pub const FUNCTION_NAME: &'static str = "QuotedAnswer";

    /// Description sent alongside the schema.
    pub const DESCRIPTION: &'static str =
        "Answer the user question based only on the given sources, and cite the sources used.";

    /// JSON schema for the function parameters.
    pub fn json_schema() -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "answer": {
                    "type": "string",
                    "description": "The answer to the question, which is based only on the given sources."
                },
                "citation": {
                    "type": "array",
                    "description": "The citation that justifies the answer.",
                    "items": {
                        "type": "object",
                        "properties": {
                            "text": {
                                "type": "string",
                                "description": "The VERBATIM quote from the specified source that justifies the answer."
                            },
                            "url": {
                                "type": "string",
                                "description": "The URL of the source"
                            }
                        },
                        "required": ["text", "url"]
                    }
                }
            },
            "required": ["answer", "citation"]
        })
    }

    /// Citations whose quote does not appear in any context block.
    ///
    /// Matching ignores case, surrounding quotes and whitespace differences.
    pub fn unsupported_citations<'a>(&'a self, context: &[SearchResult]) -> Vec<&'a Citation> {
        let haystacks: Vec<String> = context
            .iter()
            .map(|doc| normalize(&format!("{}\n{}", doc.title, doc.snippet)))
            .collect();

        self.citation
            .iter()
            .filter(|c| {
                let needle = normalize(c.text.trim_matches(|ch| ch == '"' || ch == '\''));
                needle.is_empty() || !haystacks.iter().any(|h| h.contains(&needle))
            })
            .collect()
    }
}

fn whitespace() -> &'static Regex {
    static WS: OnceLock<Regex> = OnceLock::new();
    WS.get_or_init(|| Regex::new(r"\s+").expect("valid regex"))
}

fn normalize(text: &str) -> String {
    whitespace().replace_all(text.trim(), " ").to_lowercase()
}

/// Render retrieved documents as numbered source blocks for the prompt.
pub fn format_docs_with_id(docs: &[SearchResult]) -> String {
    let formatted: Vec<String> = docs
        .iter()
        .enumerate()
        .map(|(i, doc)| {
            format!(
                "Source ID: {}\nArticle Title: {}\nArticle Snippet: {}\nURL: {}",
                i, doc.title, doc.snippet, doc.link
            )
        })
        .collect();

    format!("\n\n{}", formatted.join("\n\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn docs() -> Vec<SearchResult> {
        vec![
            SearchResult::new(
                "Cheetah - Wikipedia",
                "The cheetah is capable of running at 93 to 104 km/h (58 to 65 mph).",
                "https://en.wikipedia.org/wiki/Cheetah",
            ),
            SearchResult::new(
                "How fast is a cheetah?",
                "Cheetahs accelerate from 0 to 60 mph in just three seconds.",
                "https://example.com/cheetah",
            ),
        ]
    }

    #[test]
    fn test_format_docs_with_id() {
        let formatted = format_docs_with_id(&docs());
        let expected = "\n\nSource ID: 0\nArticle Title: Cheetah - Wikipedia\n\
            Article Snippet: The cheetah is capable of running at 93 to 104 km/h (58 to 65 mph).\n\
            URL: https://en.wikipedia.org/wiki/Cheetah\n\n\
            Source ID: 1\nArticle Title: How fast is a cheetah?\n\
            Article Snippet: Cheetahs accelerate from 0 to 60 mph in just three seconds.\n\
            URL: https://example.com/cheetah";
        assert_eq!(formatted, expected);
    }

    #[test]
    fn test_format_docs_empty() {
        assert_eq!(format_docs_with_id(&[]), "\n\n");
    }

    #[test]
    fn test_deserialize_structured_output() {
        let args = r#"{"answer":"Cheetahs run up to 104 km/h.",
            "citation":[{"text":"running at 93 to 104 km/h","url":"https://en.wikipedia.org/wiki/Cheetah"}]}"#;
        let answer: QuotedAnswer = serde_json::from_str(args).unwrap();
        assert_eq!(answer.citation.len(), 1);
        assert_eq!(answer.citation[0].url, "https://en.wikipedia.org/wiki/Cheetah");
    }

    #[test]
    fn test_unsupported_citations() {
        let answer = QuotedAnswer {
            answer: "Fast.".to_string(),
            citation: vec![
                Citation {
                    text: "\"Cheetahs  accelerate from 0 to 60 MPH\"".to_string(),
                    url: "https://example.com/cheetah".to_string(),
                },
                Citation {
                    text: "Cheetahs can fly".to_string(),
                    url: "https://example.com/cheetah".to_string(),
                },
            ],
        };

        let unsupported = answer.unsupported_citations(&docs());
        assert_eq!(unsupported.len(), 1);
        assert_eq!(unsupported[0].text, "Cheetahs can fly");
    }

    #[test]
    fn test_schema_requires_citations() {
        let schema = QuotedAnswer::json_schema();
        assert_eq!(schema["required"], serde_json::json!(["answer", "citation"]));
        assert_eq!(
            schema["properties"]["citation"]["items"]["required"],
            serde_json::json!(["text", "url"])
        );
    }
}
