//! Tool trait — the interface every sandboxed tool implements.
//!
//! Also defines the uniform result envelope ([`ToolResult`]), the typed failure
//! set ([`ToolError`]) and the parameter helpers shared by the tools.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use sandbot_core::types::ToolDefinition;

// ─────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────

/// Everything a tool can fail with. The `Display` text is what the model reads.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Cannot {action} \"{path}\" as it is outside the permitted working directory")]
    OutsideSandbox { action: &'static str, path: String },

    #[error("\"{0}\" is not a directory")]
    NotADirectory(String),

    #[error("File not found or is not a regular file: \"{0}\"")]
    NotAFile(String),

    #[error("File \"{0}\" not found.")]
    ScriptNotFound(String),

    #[error("\"{0}\" is not a Python file.")]
    NotAPythonFile(String),

    #[error("executing Python file: {0}")]
    Execution(String),

    #[error("Missing required parameter: {0}")]
    MissingParameter(String),

    #[error("Parameter '{0}' must be a string")]
    InvalidParameter(String),

    #[error("Unexpected parameter: {0}")]
    UnexpectedParameter(String),

    #[error("{0}")]
    Io(#[from] std::io::Error),
}

// ─────────────────────────────────────────────
// Result envelope
// ─────────────────────────────────────────────

/// Outcome of one function call, always a string payload for the model.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ToolResult {
    Ok(String),
    Error(String),
}

impl ToolResult {
    pub fn error(msg: impl Into<String>) -> Self {
        ToolResult::Error(msg.into())
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ToolResult::Error(_))
    }

    /// Text appended to the conversation as the `tool` turn.
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ToolResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolResult::Ok(text) => f.write_str(text),
            ToolResult::Error(msg) => write!(f, "Error: {msg}"),
        }
    }
}

impl From<Result<String, ToolError>> for ToolResult {
    fn from(result: Result<String, ToolError>) -> Self {
        match result {
            Ok(text) => ToolResult::Ok(text),
            Err(e) => ToolResult::Error(e.to_string()),
        }
    }
}

// ─────────────────────────────────────────────
// Tool trait
// ─────────────────────────────────────────────

/// Every sandboxed tool implements this trait.
///
/// The conversation loop advertises tools via `to_definition()`; the dispatcher
/// validates arguments with `validate()` and then calls `execute()` with the
/// working root it owns.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique name used by the LLM to call this tool (e.g. `"get_file_content"`).
    fn name(&self) -> &str;

    /// Human-readable description shown to the LLM.
    fn description(&self) -> &str;

    /// JSON Schema describing the parameters.
    ///
    /// Must be `{"type": "object", "properties": {...}, "required": [...]}`.
    fn parameters(&self) -> Value;

    /// Run the tool inside `root`. The model never supplies the root.
    async fn execute(
        &self,
        root: &Path,
        params: HashMap<String, Value>,
    ) -> Result<String, ToolError>;

    /// Check `params` against the declared schema: no undeclared keys,
    /// required keys present, string-typed properties given as strings.
    fn validate(&self, params: &HashMap<String, Value>) -> Result<(), ToolError> {
        let schema = self.parameters();
        let properties = schema.get("properties").and_then(Value::as_object);
        let required: Vec<&str> = schema
            .get("required")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(Value::as_str)
            .collect();

        let mut keys: Vec<&String> = params.keys().collect();
        keys.sort();
        for key in keys {
            let Some(prop) = properties.and_then(|p| p.get(key.as_str())) else {
                return Err(ToolError::UnexpectedParameter(key.clone()));
            };
            let value = &params[key];
            // null stands for "omitted" on optional params
            if value.is_null() && !required.contains(&key.as_str()) {
                continue;
            }
            if prop.get("type").and_then(Value::as_str) == Some("string") && !value.is_string() {
                return Err(ToolError::InvalidParameter(key.clone()));
            }
        }

        for key in required {
            if !params.contains_key(key) {
                return Err(ToolError::MissingParameter(key.to_string()));
            }
        }
        Ok(())
    }

    /// Build the `ToolDefinition` sent to the LLM.
    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition::new(self.name(), self.description(), self.parameters())
    }
}

// ─────────────────────────────────────────────
// Param helpers
// ─────────────────────────────────────────────

/// Extract a required `String` param.
pub fn require_string(params: &HashMap<String, Value>, key: &str) -> Result<String, ToolError> {
    match params.get(key) {
        None => Err(ToolError::MissingParameter(key.to_string())),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(ToolError::InvalidParameter(key.to_string())),
    }
}

/// Extract an optional `String` param. Present but non-string is an error.
pub fn optional_string(
    params: &HashMap<String, Value>,
    key: &str,
) -> Result<Option<String>, ToolError> {
    match params.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(ToolError::InvalidParameter(key.to_string())),
    }
}

/// Schema for a single string property.
pub fn string_property(description: &str) -> Value {
    serde_json::json!({ "type": "string", "description": description })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }
        fn description(&self) -> &str {
            "Echoes back the input"
        }
        fn parameters(&self) -> Value {
            json!({
                "type": "object",
                "properties": {
                    "text": string_property("Text to echo"),
                    "prefix": string_property("Optional prefix")
                },
                "required": ["text"]
            })
        }
        async fn execute(
            &self,
            _root: &Path,
            params: HashMap<String, Value>,
        ) -> Result<String, ToolError> {
            let text = require_string(&params, "text")?;
            let prefix = optional_string(&params, "prefix")?.unwrap_or_default();
            Ok(format!("{prefix}{text}"))
        }
    }

    fn params(value: Value) -> HashMap<String, Value> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_require_string() {
        assert_eq!(require_string(&params(json!({"path": "a.txt"})), "path").unwrap(), "a.txt");
        assert!(matches!(
            require_string(&HashMap::new(), "path"),
            Err(ToolError::MissingParameter(k)) if k == "path"
        ));
        assert!(matches!(
            require_string(&params(json!({"path": 42})), "path"),
            Err(ToolError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_optional_string() {
        assert_eq!(optional_string(&HashMap::new(), "dir").unwrap(), None);
        assert_eq!(optional_string(&params(json!({"dir": null})), "dir").unwrap(), None);
        assert_eq!(
            optional_string(&params(json!({"dir": "pkg"})), "dir").unwrap(),
            Some("pkg".into())
        );
        assert!(optional_string(&params(json!({"dir": ["pkg"]})), "dir").is_err());
    }

    #[test]
    fn test_validate_accepts_declared() {
        assert!(EchoTool.validate(&params(json!({"text": "hi"}))).is_ok());
        assert!(EchoTool.validate(&params(json!({"text": "hi", "prefix": ">"}))).is_ok());
    }

    #[test]
    fn test_validate_messages() {
        let missing = EchoTool.validate(&HashMap::new()).unwrap_err();
        assert_eq!(missing.to_string(), "Missing required parameter: text");

        let wrong_type = EchoTool.validate(&params(json!({"text": 7}))).unwrap_err();
        assert_eq!(wrong_type.to_string(), "Parameter 'text' must be a string");

        let extra = EchoTool
            .validate(&params(json!({"text": "hi", "working_directory": "/"})))
            .unwrap_err();
        assert_eq!(extra.to_string(), "Unexpected parameter: working_directory");
    }

    #[test]
    fn test_validate_null_only_for_optional() {
        assert!(EchoTool.validate(&params(json!({"text": "hi", "prefix": null}))).is_ok());

        let err = EchoTool.validate(&params(json!({"text": null}))).unwrap_err();
        assert_eq!(err.to_string(), "Parameter 'text' must be a string");
    }

    #[test]
    fn test_tool_result_rendering() {
        assert_eq!(ToolResult::Ok("done".into()).render(), "done");
        assert_eq!(ToolResult::error("boom").render(), "Error: boom");
        assert!(ToolResult::error("boom").is_error());

        let from_err: ToolResult = Err::<String, _>(ToolError::NotADirectory("x".into())).into();
        assert_eq!(from_err.render(), "Error: \"x\" is not a directory");
    }

    #[test]
    fn test_outside_sandbox_phrasing() {
        let err = ToolError::OutsideSandbox {
            action: "write to",
            path: "../x".into(),
        };
        assert_eq!(
            err.to_string(),
            "Cannot write to \"../x\" as it is outside the permitted working directory"
        );
    }

    #[tokio::test]
    async fn test_execute_and_definition() {
        let out = EchoTool
            .execute(Path::new("."), params(json!({"text": "hi", "prefix": "> "})))
            .await
            .unwrap();
        assert_eq!(out, "> hi");

        let def = EchoTool.to_definition();
        assert_eq!(def.function.name, "echo");
        assert_eq!(def.tool_type, "function");
    }
}
