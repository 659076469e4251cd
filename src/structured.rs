//! Structured-output calls against the chat model.
//!
//! The model is offered a single function whose parameters are the answer
//! schema and is forced to call it; the call arguments are the answer.

use crate::citation::QuotedAnswer;
use crate::error::{QuillError, Result};
use crate::openai::{ChatClient, ChatModel};
use async_openai::types::{
    ChatCompletionNamedToolChoice, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    ChatCompletionTool, ChatCompletionToolChoiceOption, ChatCompletionToolType,
    CreateChatCompletionRequestArgs, FunctionName, FunctionObject,
};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, instrument};

/// A model that answers with a [`QuotedAnswer`].
#[async_trait]
pub trait AnswerModel: Send + Sync {
    /// Run one system + human exchange and return the structured answer.
    async fn answer(&self, system: &str, human: &str) -> Result<QuotedAnswer>;
}

/// [`AnswerModel`] backed by an OpenAI-compatible chat completions API.
pub struct ChatAnswerModel {
    chat: Arc<dyn ChatModel>,
    model: String,
    temperature: f32,
}

impl ChatAnswerModel {
    pub fn new(client: ChatClient, model: &str) -> Self {
        Self::with_chat_model(Arc::new(client), model)
    }

    pub fn with_chat_model(chat: Arc<dyn ChatModel>, model: &str) -> Self {
        Self {
            chat,
            model: model.to_string(),
            temperature: 0.0,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

/// Function definition carrying the answer schema.
pub fn answer_tool() -> ChatCompletionTool {
    ChatCompletionTool {
        r#type: ChatCompletionToolType::Function,
        function: FunctionObject {
            name: QuotedAnswer::FUNCTION_NAME.to_string(),
            description: Some(QuotedAnswer::DESCRIPTION.to_string()),
            parameters: Some(QuotedAnswer::json_schema()),
            strict: None,
        },
    }
}

#[async_trait]
impl AnswerModel for ChatAnswerModel {
    #[instrument(skip(self, system, human))]
    async fn answer(&self, system: &str, human: &str) -> Result<QuotedAnswer> {
        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(system.to_string())
                .build()
                .map_err(|e| QuillError::Model(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(human.to_string())
                .build()
                .map_err(|e| QuillError::Model(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(self.temperature)
            .tools(vec![answer_tool()])
            .tool_choice(ChatCompletionToolChoiceOption::Named(
                ChatCompletionNamedToolChoice {
                    r#type: ChatCompletionToolType::Function,
                    function: FunctionName {
                        name: QuotedAnswer::FUNCTION_NAME.to_string(),
                    },
                },
            ))
            .build()
            .map_err(|e| QuillError::Model(e.to_string()))?;

        let response = self.chat.create(request).await?;

        let message = response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message)
            .ok_or_else(|| QuillError::Model("Empty response from model".to_string()))?;

        let call = message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .find(|c| c.function.name == QuotedAnswer::FUNCTION_NAME)
            .ok_or_else(|| {
                QuillError::StructuredOutput(format!(
                    "Model did not call {}",
                    QuotedAnswer::FUNCTION_NAME
                ))
            })?;

        debug!(
            "{} structured output arguments: {}",
            self.model, call.function.arguments
        );
        parse_answer(&call.function.arguments)
    }
}

/// Decode function-call arguments into an answer.
pub fn parse_answer(arguments: &str) -> Result<QuotedAnswer> {
    serde_json::from_str(arguments)
        .map_err(|e| QuillError::StructuredOutput(format!("Malformed {}: {}", QuotedAnswer::FUNCTION_NAME, e)))
}
