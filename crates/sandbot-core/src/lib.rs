//! Sandbot core — wire types, configuration, and small path utilities shared
//! by the provider, agent, and CLI crates.

pub mod config;
pub mod types;
pub mod utils;

pub use config::{load_config, Config};
pub use types::{LlmResponse, Message, ToolCall, ToolDefinition, UsageInfo};
