//! Sandbot Agent — sandboxed tools and the conversation loop.
//!
//! This crate contains:
//! - **tools**: path guard, the four sandboxed tools, registry, and dispatcher
//! - **context**: system prompt and append-only conversation history
//! - **agent_loop**: the LLM ↔ tool-calling main loop

pub mod agent_loop;
pub mod context;
pub mod tools;

pub use agent_loop::{AgentLoop, RunOutcome};
pub use context::{ContextBuilder, Conversation};
pub use tools::{Dispatcher, Tool, ToolError, ToolRegistry, ToolResult};
