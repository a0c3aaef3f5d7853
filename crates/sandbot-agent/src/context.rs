//! Context builder — the system prompt and the per-run conversation history.

use sandbot_core::types::{Message, ToolCall};

use crate::tools::registry::ToolRegistry;

// ─────────────────────────────────────────────
// Context builder
// ─────────────────────────────────────────────

/// Builds the system instruction from the registered tools.
pub struct ContextBuilder {
    /// `(name, description)` pairs, sorted by name.
    tools: Vec<(String, String)>,
}

impl ContextBuilder {
    pub fn new(registry: &ToolRegistry) -> Self {
        let tools = registry
            .definitions()
            .into_iter()
            .map(|d| (d.function.name, d.function.description))
            .collect();
        Self { tools }
    }

    /// Build the full system prompt.
    pub fn build_system_prompt(&self) -> String {
        let operations: String = self
            .tools
            .iter()
            .map(|(name, description)| format!("- `{name}`: {description}\n"))
            .collect();

        format!(
            "You are a helpful AI coding agent.\n\n\
             When a user asks a question or makes a request, make a function call plan. \
             You can perform the following operations:\n\n\
             {operations}\n\
             All paths you provide should be relative to the working directory. \
             You do not need to specify the working directory in your function calls \
             as it is automatically injected for security reasons.\n\n\
             Keep calling functions until you have what you need, \
             then reply with a final answer and no function calls."
        )
    }
}

// ─────────────────────────────────────────────
// Conversation
// ─────────────────────────────────────────────

/// Append-only message history for one run.
#[derive(Debug, Default)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    /// Start a history with the system instruction and the user's prompt.
    pub fn seeded(system_prompt: impl Into<String>, user_prompt: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::system(system_prompt), Message::user(user_prompt)],
        }
    }

    /// Record a model turn that requested function calls.
    pub fn push_tool_calls(&mut self, content: Option<String>, tool_calls: Vec<ToolCall>) {
        self.messages.push(Message::assistant_tool_calls(content, tool_calls));
    }

    /// Record the result of one function call, matched by call id.
    pub fn push_tool_result(&mut self, tool_call_id: &str, result: impl Into<String>) {
        self.messages.push(Message::tool_result(tool_call_id, result));
    }

    /// Record the model's final answer.
    pub fn push_answer(&mut self, content: impl Into<String>) {
        self.messages.push(Message::assistant(content));
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
