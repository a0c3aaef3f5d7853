//! Agent loop — the LLM ↔ tool-calling main loop.
//!
//! Seeds the history with the system instruction and the user's prompt, calls
//! the LLM, dispatches any function calls in order, feeds the results back,
//! and stops at a final answer or the iteration cap.

use std::sync::Arc;

use anyhow::{bail, Result};
use tracing::{debug, info, warn};

use sandbot_core::types::UsageInfo;
use sandbot_providers::traits::{LlmProvider, LlmRequestConfig};

use crate::context::{ContextBuilder, Conversation};
use crate::tools::dispatch::Dispatcher;
use crate::tools::registry::ToolRegistry;

/// Default maximum LLM ↔ tool iterations per run.
pub const DEFAULT_MAX_ITERATIONS: usize = 20;

// ─────────────────────────────────────────────
// RunOutcome
// ─────────────────────────────────────────────

/// How a run ended.
#[derive(Clone, Debug, PartialEq)]
pub enum RunOutcome {
    /// The model answered without requesting more calls.
    Completed {
        answer: String,
        iterations: usize,
        usage: UsageInfo,
    },
    /// The iteration cap was hit while the model still wanted to call functions.
    Unresolved { iterations: usize, usage: UsageInfo },
}

impl RunOutcome {
    pub fn answer(&self) -> Option<&str> {
        match self {
            RunOutcome::Completed { answer, .. } => Some(answer),
            RunOutcome::Unresolved { .. } => None,
        }
    }

    pub fn iterations(&self) -> usize {
        match self {
            RunOutcome::Completed { iterations, .. } | RunOutcome::Unresolved { iterations, .. } => {
                *iterations
            }
        }
    }

    /// Token totals over every LLM call in the run.
    pub fn usage(&self) -> &UsageInfo {
        match self {
            RunOutcome::Completed { usage, .. } | RunOutcome::Unresolved { usage, .. } => usage,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, RunOutcome::Completed { .. })
    }
}

// ─────────────────────────────────────────────
// AgentLoop
// ─────────────────────────────────────────────

pub struct AgentLoop {
    /// LLM provider.
    provider: Arc<dyn LlmProvider>,
    /// Executes function calls inside the working root.
    dispatcher: Dispatcher,
    /// System prompt source.
    context: ContextBuilder,
    /// Model to use (overrides provider default if set).
    model: String,
    /// Max LLM ↔ tool iterations per run.
    max_iterations: usize,
    /// LLM request config (temperature, max_tokens).
    request_config: LlmRequestConfig,
}

impl AgentLoop {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        dispatcher: Dispatcher,
        model: Option<String>,
        max_iterations: Option<usize>,
        request_config: Option<LlmRequestConfig>,
    ) -> Self {
        let model = model.unwrap_or_else(|| provider.default_model().to_string());
        let max_iterations = max_iterations.unwrap_or(DEFAULT_MAX_ITERATIONS).max(1);
        let context = ContextBuilder::new(dispatcher.registry());

        info!(
            provider = provider.display_name(),
            model = %model,
            tools = dispatcher.registry().len(),
            max_iterations = max_iterations,
            root = %dispatcher.root().display(),
            "agent loop initialized"
        );

        Self {
            provider,
            dispatcher,
            context,
            model,
            max_iterations,
            request_config: request_config.unwrap_or_default(),
        }
    }

    /// Drive one prompt to completion.
    ///
    /// Tool failures are fed back to the model; only a provider failure is an `Err`.
    pub async fn run(&self, prompt: &str) -> Result<RunOutcome> {
        let mut conversation = Conversation::seeded(self.context.build_system_prompt(), prompt);
        let tool_defs = self.dispatcher.registry().definitions();
        let mut usage = UsageInfo::default();

        for iteration in 1..=self.max_iterations {
            debug!(iteration = iteration, messages = conversation.len(), "LLM call");

            let response = self
                .provider
                .chat(
                    conversation.messages(),
                    Some(&tool_defs),
                    &self.model,
                    &self.request_config,
                )
                .await;

            if let Some(u) = &response.usage {
                usage.accumulate(u);
            }

            if response.is_error() {
                bail!(
                    "{} request failed: {}",
                    self.provider.display_name(),
                    response.content.as_deref().unwrap_or("unknown error")
                );
            }

            if !response.has_tool_calls() {
                let answer = response.content.unwrap_or_default();
                conversation.push_answer(answer.as_str());
                info!(iterations = iteration, "final answer received");
                return Ok(RunOutcome::Completed {
                    answer,
                    iterations: iteration,
                    usage,
                });
            }

            let tool_calls = response.tool_calls;
            conversation.push_tool_calls(response.content, tool_calls.clone());

            for call in &tool_calls {
                let result = self.dispatcher.dispatch(call).await;
                conversation.push_tool_result(&call.id, result.render());
            }
        }

        warn!(
            max_iterations = self.max_iterations,
            "iteration cap reached without a final answer"
        );
        Ok(RunOutcome::Unresolved {
            iterations: self.max_iterations,
            usage,
        })
    }

    pub fn tools(&self) -> &ToolRegistry {
        self.dispatcher.registry()
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
