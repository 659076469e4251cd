//! Error types for Quill.

use thiserror::Error;

/// Library-level error type for Quill operations.
#[derive(Error, Debug)]
pub enum QuillError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Search failed: {0}")]
    Search(String),

    #[error("Finance data error: {0}")]
    Finance(String),

    #[error("Model API error: {0}")]
    Model(String),

    #[error("Structured output error: {0}")]
    StructuredOutput(String),

    #[error("Pipeline error: {0}")]
    Pipeline(String),

    #[error("Agent error: {0}")]
    Agent(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type alias for Quill operations.
pub type Result<T> = std::result::Result<T, QuillError>;
