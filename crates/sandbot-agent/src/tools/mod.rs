//! Sandboxed tools for the Sandbot agent.

pub mod base;
pub mod dispatch;
pub mod filesystem;
pub mod guard;
pub mod registry;
pub mod script;

pub use base::{optional_string, require_string, Tool, ToolError, ToolResult};
pub use dispatch::Dispatcher;
pub use registry::ToolRegistry;
