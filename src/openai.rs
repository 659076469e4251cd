//! Chat client configuration for OpenAI-compatible providers.

use crate::config::ModelSettings;
use crate::error::{QuillError, Result};
use async_openai::types::{CreateChatCompletionRequest, CreateChatCompletionResponse};
use async_openai::{config::OpenAIConfig, Client};
use async_trait::async_trait;
use std::time::Duration;

/// Chat client type shared by agents and the answer model.
pub type ChatClient = Client<OpenAIConfig>;

/// A chat-completions endpoint.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn create(&self, request: CreateChatCompletionRequest) -> Result<CreateChatCompletionResponse>;
}

#[async_trait]
impl ChatModel for ChatClient {
    async fn create(&self, request: CreateChatCompletionRequest) -> Result<CreateChatCompletionResponse> {
        self.chat()
            .create(request)
            .await
            .map_err(|e| QuillError::Model(format!("Chat completion failed: {}", e)))
    }
}

/// Create a client for the configured provider.
///
/// Reads the provider's API key from the environment.
pub fn create_client(settings: &ModelSettings) -> Result<ChatClient> {
    let key_env = settings.provider.api_key_env();
    let api_key = std::env::var(key_env)
        .map_err(|_| QuillError::Config(format!("{} not set", key_env)))?;

    create_client_with(
        &settings.api_base(),
        &api_key,
        Duration::from_secs(settings.timeout_seconds),
    )
}

/// Create a client against an explicit base URL and key.
pub fn create_client_with(api_base: &str, api_key: &str, timeout: Duration) -> Result<ChatClient> {
    let http_client = reqwest::Client::builder().timeout(timeout).build()?;

    let config = OpenAIConfig::new()
        .with_api_base(api_base)
        .with_api_key(api_key);

    Ok(Client::with_config(config).with_http_client(http_client))
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_client_with_explicit_key() {
        let client = create_client_with(
            "http://localhost:9/v1",
            "test-key",
            Duration::from_secs(5),
        );
        assert!(client.is_ok());
    }
}
