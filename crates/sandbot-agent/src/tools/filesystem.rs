//! Filesystem tools — list directory, read file, write file.
//!
//! Each operation is a plain async function taking the working root, wrapped
//! by a zero-sized `Tool` struct for the registry.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use sandbot_core::utils::truncate_chars;

use super::base::{optional_string, require_string, string_property, Tool, ToolError};
use super::guard;

/// Maximum characters returned by `get_file_content`.
pub const MAX_FILE_CHARS: usize = 10_000;

/// Guard `path`, reporting a violation with the verb of the calling tool.
fn guarded(root: &Path, path: &str, action: &'static str) -> Result<PathBuf, ToolError> {
    guard::resolve(root, path).map_err(|_| ToolError::OutsideSandbox {
        action,
        path: path.to_string(),
    })
}

// ─────────────────────────────────────────────
// Operations
// ─────────────────────────────────────────────

/// List the immediate entries of `directory` (the root when omitted).
///
/// One line per entry, sorted by name:
/// `- <name>: file_size=<bytes> bytes, is_dir=<bool>`.
pub async fn get_files_info(root: &Path, directory: Option<&str>) -> Result<String, ToolError> {
    let shown = directory.unwrap_or(".");
    let dir = guarded(root, shown, "list")?;

    let is_dir = tokio::fs::metadata(&dir).await.map(|m| m.is_dir()).unwrap_or(false);
    if !is_dir {
        return Err(ToolError::NotADirectory(shown.to_string()));
    }

    let mut entries = Vec::new();
    let mut reader = tokio::fs::read_dir(&dir).await?;
    while let Some(entry) = reader.next_entry().await? {
        // symlink_metadata: report the entry itself, never its target
        let meta = tokio::fs::symlink_metadata(entry.path()).await?;
        entries.push((
            entry.file_name().to_string_lossy().into_owned(),
            meta.len(),
            meta.is_dir(),
        ));
    }
    entries.sort_by(|a, b| a.0.cmp(&b.0));

    debug!(directory = shown, entries = entries.len(), "listed directory");

    Ok(entries
        .iter()
        .map(|(name, size, is_dir)| format!("- {name}: file_size={size} bytes, is_dir={is_dir}"))
        .collect::<Vec<_>>()
        .join("\n"))
}

/// Read a text file, keeping at most [`MAX_FILE_CHARS`] characters.
pub async fn get_file_content(root: &Path, file_path: &str) -> Result<String, ToolError> {
    let path = guarded(root, file_path, "read")?;

    if !tokio::fs::metadata(&path).await.map(|m| m.is_file()).unwrap_or(false) {
        return Err(ToolError::NotAFile(file_path.to_string()));
    }

    let content = tokio::fs::read_to_string(&path).await?;
    match truncate_chars(&content, MAX_FILE_CHARS) {
        (kept, true) => {
            debug!(file = file_path, "truncated file content");
            Ok(format!(
                "{kept}[...File \"{file_path}\" truncated at {MAX_FILE_CHARS} characters]"
            ))
        }
        (_, false) => Ok(content),
    }
}

/// Overwrite (or create) a file with `content`. Parent directories must exist.
pub async fn write_file(root: &Path, file_path: &str, content: &str) -> Result<String, ToolError> {
    let path = guarded(root, file_path, "write to")?;

    tokio::fs::write(&path, content).await?;

    let written = content.chars().count();
    debug!(file = file_path, chars = written, "wrote file");
    Ok(format!(
        "Successfully wrote to \"{file_path}\" ({written} characters written)"
    ))
}

// ─────────────────────────────────────────────
// GetFilesInfoTool
// ─────────────────────────────────────────────

pub struct GetFilesInfoTool;

#[async_trait]
impl Tool for GetFilesInfoTool {
    fn name(&self) -> &str {
        "get_files_info"
    }

    fn description(&self) -> &str {
        "Lists files in the specified directory along with their sizes, \
         constrained to the working directory."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "directory": string_property(
                    "The directory to list files from, relative to the working directory. \
                     If not provided, lists files in the working directory itself."
                )
            },
            "required": []
        })
    }

    async fn execute(&self, root: &Path, params: HashMap<String, Value>) -> Result<String, ToolError> {
        let directory = optional_string(&params, "directory")?;
        get_files_info(root, directory.as_deref()).await
    }
}

// ─────────────────────────────────────────────
// GetFileContentTool
// ─────────────────────────────────────────────

pub struct GetFileContentTool;

#[async_trait]
impl Tool for GetFileContentTool {
    fn name(&self) -> &str {
        "get_file_content"
    }

    fn description(&self) -> &str {
        "Reads the contents of the specified file (first 10000 characters), \
         constrained to the working directory."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "file_path": string_property("The file to read, relative to the working directory.")
            },
            "required": ["file_path"]
        })
    }

    async fn execute(&self, root: &Path, params: HashMap<String, Value>) -> Result<String, ToolError> {
        let file_path = require_string(&params, "file_path")?;
        get_file_content(root, &file_path).await
    }
}

// ─────────────────────────────────────────────
// WriteFileTool
// ─────────────────────────────────────────────

pub struct WriteFileTool;

#[async_trait]
impl Tool for WriteFileTool {
    fn name(&self) -> &str {
        "write_file"
    }

    fn description(&self) -> &str {
        "Writes content to the specified file, replacing it if it exists. \
         Constrained to the working directory; parent directories must already exist."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "file_path": string_property("The file to write, relative to the working directory."),
                "content": string_property("The content to write to the file.")
            },
            "required": ["file_path", "content"]
        })
    }

    async fn execute(&self, root: &Path, params: HashMap<String, Value>) -> Result<String, ToolError> {
        let file_path = require_string(&params, "file_path")?;
        let content = require_string(&params, "content")?;
        write_file(root, &file_path, &content).await
    }
}
