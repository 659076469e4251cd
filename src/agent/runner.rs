//! Agent runner with tool calling loop and team delegation.

use super::tools::{parse_tool_call, transfer_definition, ToolCall, ToolContext};
use crate::error::{QuillError, Result};
use crate::openai::{ChatClient, ChatModel};
use async_openai::types::{
    ChatCompletionMessageToolCall, ChatCompletionRequestAssistantMessageArgs,
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestToolMessageArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs,
};
use futures::future::BoxFuture;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Callback receiving progress events from an agent and its team members.
pub type EventHandler = Arc<dyn Fn(&AgentEvent) + Send + Sync>;

/// Progress reported while an agent runs.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentEvent {
    /// The model asked for a tool.
    ToolCall {
        agent: String,
        name: String,
        arguments: String,
    },
    /// A tool finished (successfully or not).
    ToolResult {
        agent: String,
        name: String,
        result: String,
    },
    /// A team leader handed a task to a member.
    Delegated {
        from: String,
        to: String,
        task: String,
    },
    /// An agent produced its final answer.
    Response { agent: String, content: String },
}

/// An LLM with instructions, tools and optionally a team it can delegate to.
pub struct Agent {
    chat: Arc<dyn ChatModel>,
    name: String,
    model: String,
    role: Option<String>,
    description: Option<String>,
    instructions: Vec<String>,
    tools: ToolContext,
    team: Vec<Agent>,
    markdown: bool,
    temperature: Option<f32>,
    max_iterations: usize,
    on_event: Option<EventHandler>,
}

impl Agent {
    /// Create an agent with no tools and no instructions.
    pub fn new(client: ChatClient, name: &str, model: &str) -> Self {
        Self::with_chat_model(Arc::new(client), name, model)
    }

    /// Create an agent on top of any chat-completions endpoint.
    pub fn with_chat_model(chat: Arc<dyn ChatModel>, name: &str, model: &str) -> Self {
        Self {
            chat,
            name: name.to_string(),
            model: model.to_string(),
            role: None,
            description: None,
            instructions: Vec::new(),
            tools: ToolContext::new(),
            team: Vec::new(),
            markdown: false,
            temperature: None,
            max_iterations: 15,
            on_event: None,
        }
    }

    /// One-line role, shown to a team leader when this agent is a member.
    pub fn with_role(mut self, role: &str) -> Self {
        self.role = Some(role.to_string());
        self
    }

    /// Opening paragraph of the system prompt.
    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn with_instructions<I, S>(mut self, instructions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.instructions.extend(instructions.into_iter().map(Into::into));
        self
    }

    pub fn with_tools(mut self, tools: ToolContext) -> Self {
        self.tools = tools;
        self
    }

    /// Add a team member this agent can delegate to.
    pub fn with_member(mut self, member: Agent) -> Self {
        self.team.push(member);
        self
    }

    pub fn with_markdown(mut self, markdown: bool) -> Self {
        self.markdown = markdown;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set maximum iterations for the agent loop.
    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    /// Receive events from this agent and every team member.
    pub fn with_event_handler(mut self, handler: EventHandler) -> Self {
        self.on_event = Some(handler);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn members(&self) -> &[Agent] {
        &self.team
    }

    /// Names of the tools offered to the model, delegation included.
    pub fn tool_names(&self) -> Vec<&'static str> {
        let mut names = self.tools.tool_names();
        if !self.team.is_empty() {
            names.push(super::tools::TRANSFER_TASK);
        }
        names
    }

    /// Assemble the system prompt.
    pub fn system_prompt(&self) -> String {
        let mut sections = Vec::new();

        if let Some(description) = &self.description {
            sections.push(description.clone());
        }

        if let Some(role) = &self.role {
            sections.push(format!("Your role: {}", role));
        }

        let mut instructions = self.instructions.clone();
        if self.markdown {
            instructions.push("Use markdown to format your answers.".to_string());
        }
        if !instructions.is_empty() {
            let list = instructions
                .iter()
                .map(|i| format!("- {}", i))
                .collect::<Vec<_>>()
                .join("\n");
            sections.push(format!("## Instructions\n{}", list));
        }

        if !self.team.is_empty() {
            let members = self
                .team
                .iter()
                .map(|m| {
                    let role = m.role.as_deref().unwrap_or("General assistant");
                    let tools = m.tool_names().join(", ");
                    if tools.is_empty() {
                        format!("- {}: {}", m.name, role)
                    } else {
                        format!("- {}: {} (tools: {})", m.name, role, tools)
                    }
                })
                .collect::<Vec<_>>()
                .join("\n");

            sections.push(format!(
                "## Team\n\
                You lead a team of agents. Use '{}' to hand a task to the member best suited for it, \
                then combine their answers into your final response.\n\n{}",
                super::tools::TRANSFER_TASK,
                members
            ));
        }

        sections.join("\n\n")
    }

    /// Run the agent with a user task.
    pub async fn run(&self, task: &str) -> Result<AgentResponse> {
        self.run_with(task.to_string(), self.on_event.clone()).await
    }

    fn run_with(&self, task: String, events: Option<EventHandler>) -> BoxFuture<'_, Result<AgentResponse>> {
        Box::pin(async move { self.run_loop(&task, events.as_ref()).await })
    }

    #[instrument(skip(self, task, events), fields(agent = %self.name, model = %self.model))]
    async fn run_loop(&self, task: &str, events: Option<&EventHandler>) -> Result<AgentResponse> {
        let mut messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(self.system_prompt())
                .build()
                .map_err(|e| QuillError::Agent(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(task.to_string())
                .build()
                .map_err(|e| QuillError::Agent(e.to_string()))?
                .into(),
        ];

        let mut definitions = self.tools.definitions();
        if !self.team.is_empty() {
            let names: Vec<&str> = self.team.iter().map(|m| m.name.as_str()).collect();
            definitions.push(transfer_definition(&names));
        }

        let mut iterations = 0;
        let mut tool_calls_made = Vec::new();

        loop {
            iterations += 1;
            if iterations > self.max_iterations {
                return Err(QuillError::Agent(format!(
                    "{} exceeded maximum iterations ({})",
                    self.name, self.max_iterations
                )));
            }

            debug!("Agent iteration {}", iterations);

            let mut request = CreateChatCompletionRequestArgs::default();
            request.model(&self.model).messages(messages.clone());
            if !definitions.is_empty() {
                request.tools(definitions.clone());
            }
            if let Some(temperature) = self.temperature {
                request.temperature(temperature);
            }
            let request = request
                .build()
                .map_err(|e| QuillError::Agent(e.to_string()))?;

            let response = self.chat.create(request).await?;

            let choice = response
                .choices
                .into_iter()
                .next()
                .ok_or_else(|| QuillError::Agent("No response from model".to_string()))?;

            let tool_calls = choice.message.tool_calls.unwrap_or_default();
            if tool_calls.is_empty() {
                let content = choice.message.content.unwrap_or_default();
                emit(
                    events,
                    AgentEvent::Response {
                        agent: self.name.clone(),
                        content: content.clone(),
                    },
                );
                return Ok(AgentResponse {
                    content,
                    tool_calls: tool_calls_made,
                    iterations,
                });
            }

            let assistant_msg = ChatCompletionRequestAssistantMessageArgs::default()
                .tool_calls(tool_calls.clone())
                .build()
                .map_err(|e| QuillError::Agent(e.to_string()))?;
            messages.push(assistant_msg.into());

            for tool_call in &tool_calls {
                let record = self.execute_tool_call(tool_call, events).await;

                let tool_msg = ChatCompletionRequestToolMessageArgs::default()
                    .tool_call_id(&tool_call.id)
                    .content(record.result.clone())
                    .build()
                    .map_err(|e| QuillError::Agent(e.to_string()))?;
                messages.push(tool_msg.into());

                tool_calls_made.push(record);
            }
        }
    }

    /// Execute a single tool call and return a record of it.
    ///
    /// Failures are reported back to the model as the tool result.
    async fn execute_tool_call(
        &self,
        tool_call: &ChatCompletionMessageToolCall,
        events: Option<&EventHandler>,
    ) -> ToolCallRecord {
        let name = &tool_call.function.name;
        let arguments = &tool_call.function.arguments;

        info!("{} calling tool: {} with args: {}", self.name, name, arguments);
        emit(
            events,
            AgentEvent::ToolCall {
                agent: self.name.clone(),
                name: name.clone(),
                arguments: arguments.clone(),
            },
        );

        let result = match parse_tool_call(name, arguments) {
            Ok(ToolCall::TransferTask {
                member,
                task,
                expected_output,
            }) => match self.delegate(&member, &task, expected_output.as_deref(), events).await {
                Ok(output) => output,
                Err(e) => format!("Tool error: {}", e),
            },
            Ok(tool) => match self.tools.execute(&tool).await {
                Ok(output) => output,
                Err(e) => format!("Tool error: {}", e),
            },
            Err(e) => format!("Failed to parse tool call: {}", e),
        };

        emit(
            events,
            AgentEvent::ToolResult {
                agent: self.name.clone(),
                name: name.clone(),
                result: result.clone(),
            },
        );

        ToolCallRecord {
            agent: self.name.clone(),
            name: name.clone(),
            arguments: arguments.clone(),
            result,
        }
    }

    async fn delegate(
        &self,
        member: &str,
        task: &str,
        expected_output: Option<&str>,
        events: Option<&EventHandler>,
    ) -> Result<String> {
        let agent = self.find_member(member)?;

        emit(
            events,
            AgentEvent::Delegated {
                from: self.name.clone(),
                to: agent.name.clone(),
                task: task.to_string(),
            },
        );

        let member_task = match expected_output {
            Some(expected) => format!("{}\n\nExpected output: {}", task, expected),
            None => task.to_string(),
        };

        let response = agent.run_with(member_task, events.cloned()).await?;
        Ok(response.content)
    }

    fn find_member(&self, member: &str) -> Result<&Agent> {
        self.team
            .iter()
            .find(|m| m.name.eq_ignore_ascii_case(member.trim()))
            .ok_or_else(|| QuillError::Agent(format!("No team member named '{}'", member)))
    }
}

fn emit(events: Option<&EventHandler>, event: AgentEvent) {
    if let Some(handler) = events {
        handler(&event);
    }
}

/// Response from an agent run.
#[derive(Debug)]
pub struct AgentResponse {
    /// The final response content from the agent.
    pub content: String,
    /// Record of all tool calls made by this agent (not its members).
    pub tool_calls: Vec<ToolCallRecord>,
    /// Number of iterations (LLM calls) used.
    pub iterations: usize,
}

/// Record of a tool call made by an agent.
#[derive(Debug, Clone)]
pub struct ToolCallRecord {
    /// Agent that made the call.
    pub agent: String,
    /// Name of the tool called.
    pub name: String,
    /// JSON arguments passed to the tool.
    pub arguments: String,
    /// Result returned by the tool.
    pub result: String,
}

impl std::fmt::Display for ToolCallRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.name, self.arguments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::openai::create_client_with;
    use crate::openai::scripted::{text_reply, tool_reply, ScriptedChat};
    use crate::search::{SearchBackend, SearchResult};
    use async_trait::async_trait;
    use std::sync::Mutex;
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

    struct FailingSearch;

    #[async_trait]
    impl SearchBackend for FailingSearch {
        async fn search(&self, _query: &str, _max_results: usize) -> Result<Vec<SearchResult>> {
            Err(QuillError::Search("rate limited".to_string()))
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    fn client() -> ChatClient {
        create_client_with("http://localhost:9/v1", "test-key", Duration::from_secs(1)).unwrap()
    }

    #[test]
    fn test_tool_call_record_display() {
        let record = ToolCallRecord {
            agent: "Web Agent".to_string(),
            name: "web_search".to_string(),
            arguments: r#"{"query": "test"}"#.to_string(),
            result: "[]".to_string(),
        };
        assert_eq!(format!("{}", record), r#"web_search({"query": "test"})"#);
    }

    #[test]
    fn test_system_prompt_sections() {
        let agent = Agent::new(client(), "Reporter", "llama-3.3-70b-versatile")
            .with_description("You are a reporter.")
            .with_instructions(["Always include sources"])
            .with_markdown(true);

        let prompt = agent.system_prompt();
        assert!(prompt.starts_with("You are a reporter.\n\n## Instructions\n"));
        assert!(prompt.contains("- Always include sources\n- Use markdown to format your answers."));
        assert!(!prompt.contains("## Team"));
    }

    #[test]
    fn test_leader_prompt_lists_members() {
        let web = Agent::new(client(), "Web Agent", "m")
            .with_role("Search the web for information")
            .with_tools(ToolContext::new().with_web_search(Arc::new(NoSearch), 3));
        let leader = Agent::new(client(), "Team Leader", "m").with_member(web);

        let prompt = leader.system_prompt();
        assert!(prompt.contains("## Team"));
        assert!(prompt.contains("- Web Agent: Search the web for information (tools: web_search)"));
        assert_eq!(leader.tool_names(), vec!["transfer_task_to_member"]);
    }

    #[tokio::test]
    async fn test_delegate_to_unknown_member() {
        let leader = Agent::new(client(), "Team Leader", "m")
            .with_member(Agent::new(client(), "Web Agent", "m"));

        let err = leader.delegate("Chef Agent", "cook", None, None).await.unwrap_err();
        assert!(err.to_string().contains("No team member named 'Chef Agent'"));
        assert_eq!(leader.find_member(" web agent ").unwrap().name(), "Web Agent");
    }

    #[test]
    fn test_emit_calls_handler() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let handler: EventHandler = Arc::new(move |e: &AgentEvent| sink.lock().unwrap().push(e.clone()));

        emit(
            Some(&handler),
            AgentEvent::Response {
                agent: "a".to_string(),
                content: "done".to_string(),
            },
        );
        emit(None, AgentEvent::Response {
            agent: "b".to_string(),
            content: "ignored".to_string(),
        });

        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_iteration_cap_is_an_agent_error() {
        let chat = Arc::new(ScriptedChat::new(vec![
            tool_reply(&[("call_1", "web_search", r#"{"query":"VN-Index"}"#)]),
            tool_reply(&[("call_2", "web_search", r#"{"query":"VN-Index today"}"#)]),
            text_reply("never reached"),
        ]));
        let agent = Agent::with_chat_model(chat.clone(), "Reporter", "m")
            .with_tools(ToolContext::new().with_web_search(Arc::new(NoSearch), 1))
            .with_max_iterations(2);

        let err = agent.run("What is the VN-Index?").await.unwrap_err();
        match err {
            QuillError::Agent(msg) => assert!(msg.contains("exceeded maximum iterations (2)")),
            other => panic!("Expected agent error, got {:?}", other),
        }
        assert_eq!(chat.requests.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_tool_failures_are_returned_to_the_model() {
        let chat = Arc::new(ScriptedChat::new(vec![
            tool_reply(&[
                ("call_1", "web_search", r#"{"query":"gold price"}"#),
                ("call_2", "launch_rockets", "{}"),
            ]),
            text_reply("Search is unavailable right now."),
        ]));
        let agent = Agent::with_chat_model(chat.clone(), "Reporter", "m")
            .with_tools(ToolContext::new().with_web_search(Arc::new(FailingSearch), 3));

        let response = agent.run("Is gold up today?").await.unwrap();
        assert_eq!(response.content, "Search is unavailable right now.");
        assert_eq!(response.iterations, 2);
        assert_eq!(response.tool_calls.len(), 2);
        assert_eq!(response.tool_calls[0].result, "Tool error: Search failed: rate limited");
        assert!(response.tool_calls[1]
            .result
            .starts_with("Failed to parse tool call: "));

        let requests = chat.requests.lock().unwrap();
        let followup = serde_json::to_string(&requests[1]).unwrap();
        assert!(followup.contains("Tool error: Search failed: rate limited"));
        assert!(followup.contains("call_2"));
    }

    #[tokio::test]
    async fn test_member_answer_becomes_leader_tool_result() {
        let member_chat = Arc::new(ScriptedChat::new(vec![text_reply("NVDA trades at 121.50 USD.")]));
        let leader_chat = Arc::new(ScriptedChat::new(vec![
            tool_reply(&[(
                "call_1",
                "transfer_task_to_member",
                r#"{"member":"Finance Agent","task":"Get the NVDA price","expected_output":"A price"}"#,
            )]),
            text_reply("| NVDA | 121.50 USD |"),
        ]));

        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        let handler: EventHandler = Arc::new(move |e: &AgentEvent| sink.lock().unwrap().push(e.clone()));

        let leader = Agent::with_chat_model(leader_chat.clone(), "Team Leader", "m")
            .with_member(Agent::with_chat_model(member_chat.clone(), "Finance Agent", "m"))
            .with_event_handler(handler);

        let response = leader.run("How is NVDA doing?").await.unwrap();
        assert_eq!(response.content, "| NVDA | 121.50 USD |");
        assert_eq!(response.tool_calls[0].result, "NVDA trades at 121.50 USD.");

        let member_request = serde_json::to_string(&member_chat.requests.lock().unwrap()[0]).unwrap();
        assert!(member_request.contains("Get the NVDA price\\n\\nExpected output: A price"));

        let leader_followup = serde_json::to_string(&leader_chat.requests.lock().unwrap()[1]).unwrap();
        assert!(leader_followup.contains("NVDA trades at 121.50 USD."));

        let seen: Vec<String> = events
            .lock()
            .unwrap()
            .iter()
            .map(|e| match e {
                AgentEvent::ToolCall { agent, name, .. } => format!("call {} {}", agent, name),
                AgentEvent::Delegated { from, to, .. } => format!("delegate {} -> {}", from, to),
                AgentEvent::ToolResult { agent, name, .. } => format!("result {} {}", agent, name),
                AgentEvent::Response { agent, .. } => format!("response {}", agent),
            })
            .collect();
        assert_eq!(
            seen,
            vec![
                "call Team Leader transfer_task_to_member",
                "delegate Team Leader -> Finance Agent",
                "response Finance Agent",
                "result Team Leader transfer_task_to_member",
                "response Team Leader",
            ]
        );
    }
}
