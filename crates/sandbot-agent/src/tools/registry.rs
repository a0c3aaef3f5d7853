//! Tool Registry — immutable name → tool table.
//!
//! Built once at startup. The dispatcher looks tools up here; the conversation
//! loop sends `definitions()` to the LLM.

use std::collections::HashMap;
use std::sync::Arc;

use sandbot_core::config::schema::ScriptConfig;
use sandbot_core::types::ToolDefinition;
use tracing::{debug, warn};

use super::base::Tool;
use super::filesystem::{GetFileContentTool, GetFilesInfoTool, WriteFileTool};
use super::script::{RunPythonFileTool, ScriptRunner};

// ─────────────────────────────────────────────
// Registry
// ─────────────────────────────────────────────

/// Stores tools keyed by name. No mutation after construction.
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Build a registry from a fixed set of tools. A later duplicate name wins.
    pub fn new(tools: impl IntoIterator<Item = Arc<dyn Tool>>) -> Self {
        let mut map: HashMap<String, Arc<dyn Tool>> = HashMap::new();
        for tool in tools {
            let name = tool.name().to_string();
            debug!(tool = %name, "registered tool");
            if map.insert(name.clone(), tool).is_some() {
                warn!(tool = %name, "duplicate tool name, keeping the last one");
            }
        }
        Self { tools: map }
    }

    /// The four built-in sandboxed tools.
    pub fn builtin(script: &ScriptConfig) -> Self {
        Self::new([
            Arc::new(GetFilesInfoTool) as Arc<dyn Tool>,
            Arc::new(GetFileContentTool),
            Arc::new(RunPythonFileTool::new(ScriptRunner::from_config(script))),
            Arc::new(WriteFileTool),
        ])
    }

    /// Look up a tool by name.
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.get(name)
    }

    pub fn has(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Names of all registered tools, sorted for determinism.
    pub fn tool_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.keys().cloned().collect();
        names.sort();
        names
    }

    /// LLM-facing definitions for all tools, sorted by name.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        let mut defs: Vec<ToolDefinition> = self.tools.values().map(|t| t.to_definition()).collect();
        defs.sort_by(|a, b| a.function.name.cmp(&b.function.name));
        defs
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_tools() {
        let reg = ToolRegistry::builtin(&ScriptConfig::default());
        assert_eq!(reg.len(), 4);
        assert_eq!(
            reg.tool_names(),
            vec!["get_file_content", "get_files_info", "run_python_file", "write_file"]
        );
        assert!(reg.has("write_file"));
        assert!(!reg.has("exec"));
        assert!(reg.get("run_python_file").is_some());
    }

    #[test]
    fn test_definitions_sorted_and_typed() {
        let reg = ToolRegistry::builtin(&ScriptConfig::default());
        let defs = reg.definitions();
        let names: Vec<&str> = defs.iter().map(|d| d.function.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["get_file_content", "get_files_info", "run_python_file", "write_file"]
        );
        for def in &defs {
            assert_eq!(def.tool_type, "function");
            assert_eq!(def.function.parameters["type"], "object");
        }
    }

    #[test]
    fn test_empty_and_duplicates() {
        assert!(ToolRegistry::new(Vec::<Arc<dyn Tool>>::new()).is_empty());

        let reg = ToolRegistry::new([
            Arc::new(WriteFileTool) as Arc<dyn Tool>,
            Arc::new(WriteFileTool),
        ]);
        assert_eq!(reg.len(), 1);
    }
}
