//! `LlmProvider` — what the agent loop needs from a model backend.
//!
//! One method does the work: send the conversation plus the advertised tools
//! and get back either text or tool calls. Transport and API failures are
//! folded into the response (see [`LlmResponse::is_error`]) so callers have a
//! single value to inspect.

use async_trait::async_trait;
use sandbot_core::config::schema::AgentConfig;
use sandbot_core::types::{LlmResponse, Message, ToolDefinition};

/// Sampling limits sent with every completion call.
#[derive(Clone, Debug, PartialEq)]
pub struct LlmRequestConfig {
    pub max_tokens: u32,
    pub temperature: f64,
}

impl Default for LlmRequestConfig {
    fn default() -> Self {
        Self {
            max_tokens: 4096,
            temperature: 0.7,
        }
    }
}

impl From<&AgentConfig> for LlmRequestConfig {
    fn from(agent: &AgentConfig) -> Self {
        Self {
            max_tokens: agent.max_tokens,
            temperature: agent.temperature,
        }
    }
}

#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Run one completion over `messages`.
    ///
    /// `tools` is `None` when the model should answer in text only. Never
    /// fails: errors arrive as `LlmResponse::error(..)`.
    async fn chat(
        &self,
        messages: &[Message],
        tools: Option<&[ToolDefinition]>,
        model: &str,
        config: &LlmRequestConfig,
    ) -> LlmResponse;

    /// Model used when the caller doesn't name one.
    fn default_model(&self) -> &str;

    fn display_name(&self) -> &str;
}
