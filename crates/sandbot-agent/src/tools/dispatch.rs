//! Dispatcher — turns a model's function call into a [`ToolResult`].
//!
//! Owns the working root and injects it into every tool. Unknown names,
//! undecodable arguments, validation failures and panics all come back as
//! `ToolResult::Error`; nothing here is fatal to the conversation.

use std::any::Any;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{info, warn};

use sandbot_core::types::ToolCall;

use super::base::ToolResult;
use super::registry::ToolRegistry;

pub struct Dispatcher {
    registry: ToolRegistry,
    root: PathBuf,
    verbose: bool,
}

impl Dispatcher {
    /// `root` is the canonical working root; it never changes afterwards.
    pub fn new(registry: ToolRegistry, root: PathBuf) -> Self {
        Self {
            registry,
            root,
            verbose: false,
        }
    }

    /// Log raw arguments and rendered results of each call.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Execute one call. Always yields a result.
    pub async fn dispatch(&self, call: &ToolCall) -> ToolResult {
        let name = call.name();
        if self.verbose {
            info!(function = name, arguments = %call.function.arguments, "calling function");
        } else {
            info!(function = name, "calling function");
        }

        let result = self.invoke(name, &call.function.arguments).await;

        if self.verbose {
            info!(function = name, result = %result, "function result");
        }
        result
    }

    async fn invoke(&self, name: &str, raw_args: &str) -> ToolResult {
        let Some(tool) = self.registry.get(name) else {
            warn!(function = name, "unknown function");
            return ToolResult::error(format!("Unknown function: {name}"));
        };

        let params = match parse_arguments(raw_args) {
            Ok(p) => p,
            Err(reason) => {
                return ToolResult::error(format!("Invalid arguments for {name}: {reason}"))
            }
        };
        if let Err(e) = tool.validate(&params) {
            return ToolResult::error(e.to_string());
        }

        // Run on its own task so a panicking tool surfaces as a JoinError.
        let tool = tool.clone();
        let root = self.root.clone();
        let handle = tokio::spawn(async move { tool.execute(&root, params).await });

        match handle.await {
            Ok(outcome) => outcome.into(),
            Err(e) => {
                let reason = if e.is_panic() {
                    panic_message(e.into_panic())
                } else {
                    e.to_string()
                };
                warn!(function = name, reason = %reason, "function failed");
                ToolResult::error(format!("Function {name} failed: {reason}"))
            }
        }
    }
}

/// Decode the JSON-encoded arguments string into a parameter map.
///
/// An empty string or `null` is an empty map; anything but an object is rejected.
fn parse_arguments(raw: &str) -> Result<HashMap<String, Value>, String> {
    if raw.trim().is_empty() {
        return Ok(HashMap::new());
    }
    match serde_json::from_str::<Value>(raw).map_err(|e| e.to_string())? {
        Value::Object(map) => Ok(map.into_iter().collect()),
        Value::Null => Ok(HashMap::new()),
        other => Err(format!("expected a JSON object, got {other}")),
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panicked".to_string()
    }
}
