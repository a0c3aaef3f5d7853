//! Script tool — run a Python file from the working root in a subprocess.
//!
//! The child gets a closed stdin, piped stdout/stderr, the root as its cwd and a
//! hard wall-clock timeout. It is killed if the timeout fires.

use std::collections::HashMap;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::process::Command;
use tracing::{debug, warn};

use sandbot_core::config::schema::ScriptConfig;

use super::base::{require_string, string_property, Tool, ToolError};
use super::guard;

// ─────────────────────────────────────────────
// ScriptRunner
// ─────────────────────────────────────────────

/// Runs `<interpreter> <absolute script path>` with a timeout.
#[derive(Clone, Debug)]
pub struct ScriptRunner {
    interpreter: String,
    timeout: Duration,
}

impl ScriptRunner {
    pub fn new(interpreter: impl Into<String>, timeout: Duration) -> Self {
        Self {
            interpreter: interpreter.into(),
            timeout,
        }
    }

    pub fn from_config(config: &ScriptConfig) -> Self {
        Self::new(&config.interpreter, Duration::from_secs(config.timeout))
    }

    /// Execute `file_path` (relative to `root`) and describe what happened.
    pub async fn run(&self, root: &Path, file_path: &str) -> Result<String, ToolError> {
        let script = guard::resolve(root, file_path).map_err(|_| ToolError::OutsideSandbox {
            action: "execute",
            path: file_path.to_string(),
        })?;

        if !tokio::fs::metadata(&script).await.map(|m| m.is_file()).unwrap_or(false) {
            return Err(ToolError::ScriptNotFound(file_path.to_string()));
        }
        // Judge the name the caller gave; `script` may be a resolved symlink target.
        if !file_path.ends_with(".py") {
            return Err(ToolError::NotAPythonFile(file_path.to_string()));
        }

        debug!(
            interpreter = %self.interpreter,
            script = %script.display(),
            timeout_secs = self.timeout.as_secs_f64(),
            "spawning script"
        );

        let child = Command::new(&self.interpreter)
            .arg(&script)
            .current_dir(root)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ToolError::Execution(e.to_string()))?;

        // Dropping the wait future on timeout drops the child, which kills it.
        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => return Err(ToolError::Execution(e.to_string())),
            Err(_) => {
                warn!(script = file_path, "script timed out, killed");
                return Err(ToolError::Execution(format!(
                    "timed out after {} seconds",
                    self.timeout.as_secs_f64()
                )));
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        // Signal termination has no exit code
        let code = output.status.code().unwrap_or(-1);

        Ok(format_output(stdout.trim(), stderr.trim(), code))
    }
}

/// Render trimmed process output the way the model expects it.
fn format_output(stdout: &str, stderr: &str, code: i32) -> String {
    let mut parts = Vec::new();
    if stdout.is_empty() && stderr.is_empty() {
        parts.push("No output produced.".to_string());
    }
    if !stdout.is_empty() {
        parts.push(format!("STDOUT:{stdout}"));
    }
    if !stderr.is_empty() {
        parts.push(format!("STDERR:{stderr}"));
    }
    if code != 0 {
        parts.push(format!("Process exited with code {code}"));
    }
    parts.join("\n")
}

// ─────────────────────────────────────────────
// RunPythonFileTool
// ─────────────────────────────────────────────

pub struct RunPythonFileTool {
    runner: ScriptRunner,
}

impl RunPythonFileTool {
    pub fn new(runner: ScriptRunner) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl Tool for RunPythonFileTool {
    fn name(&self) -> &str {
        "run_python_file"
    }

    fn description(&self) -> &str {
        "Executes the specified Python file and returns its output, \
         constrained to the working directory."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "file_path": string_property(
                    "The Python file to execute, relative to the working directory."
                )
            },
            "required": ["file_path"]
        })
    }

    async fn execute(&self, root: &Path, params: HashMap<String, Value>) -> Result<String, ToolError> {
        let file_path = require_string(&params, "file_path")?;
        self.runner.run(root, &file_path).await
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    /// `sh` stands in for the interpreter so tests don't need Python.
    fn sh_runner(timeout: Duration) -> ScriptRunner {
        ScriptRunner::new("sh", timeout)
    }

    fn sandbox(scripts: &[(&str, &str)]) -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let root = dir.path().canonicalize().unwrap();
        for (name, body) in scripts {
            std::fs::write(root.join(name), body).unwrap();
        }
        (dir, root)
    }

    #[test]
    fn test_format_output() {
        assert_eq!(format_output("", "", 0), "No output produced.");
        assert_eq!(format_output("hello", "", 0), "STDOUT:hello");
        assert_eq!(format_output("a", "b", 2), "STDOUT:a\nSTDERR:b\nProcess exited with code 2");
        assert_eq!(
            format_output("", "", 1),
            "No output produced.\nProcess exited with code 1"
        );
    }

    #[tokio::test]
    async fn test_run_prints_stdout() {
        let (_dir, root) = sandbox(&[("hello.py", "echo hello\n")]);
        let out = sh_runner(Duration::from_secs(5)).run(&root, "hello.py").await.unwrap();
        assert_eq!(out, "STDOUT:hello");
    }

    #[tokio::test]
    async fn test_run_nonzero_exit_without_output() {
        let (_dir, root) = sandbox(&[("fail.py", "exit 1\n")]);
        let out = sh_runner(Duration::from_secs(5)).run(&root, "fail.py").await.unwrap();
        assert!(out.contains("Process exited with code 1"));
        assert!(!out.contains("STDOUT:"));
        assert!(!out.contains("STDERR:"));
    }

    #[tokio::test]
    async fn test_run_stderr_and_cwd() {
        let (_dir, root) = sandbox(&[("where.py", "pwd\necho oops >&2\n")]);
        let out = sh_runner(Duration::from_secs(5)).run(&root, "where.py").await.unwrap();
        assert_eq!(out, format!("STDOUT:{}\nSTDERR:oops", root.display()));
    }

    #[tokio::test]
    async fn test_run_wrong_extension_never_spawns() {
        let (_dir, root) = sandbox(&[("notes.txt", "touch spawned\n")]);
        let err = sh_runner(Duration::from_secs(5)).run(&root, "notes.txt").await.unwrap_err();
        assert_eq!(err.to_string(), "\"notes.txt\" is not a Python file.");
        assert!(!root.join("spawned").exists());
    }

    #[tokio::test]
    async fn test_run_symlink_named_txt_never_spawns() {
        let (_dir, root) = sandbox(&[("real.py", "touch spawned\necho hi\n")]);
        std::os::unix::fs::symlink(root.join("real.py"), root.join("alias.txt")).unwrap();

        let err = sh_runner(Duration::from_secs(5)).run(&root, "alias.txt").await.unwrap_err();
        assert_eq!(err.to_string(), "\"alias.txt\" is not a Python file.");
        assert!(!root.join("spawned").exists());
    }

    #[tokio::test]
    async fn test_run_symlink_named_py_runs_target() {
        let (_dir, root) = sandbox(&[("body.txt", "echo hi\n")]);
        std::os::unix::fs::symlink(root.join("body.txt"), root.join("run.py")).unwrap();

        let out = sh_runner(Duration::from_secs(5)).run(&root, "run.py").await.unwrap();
        assert_eq!(out, "STDOUT:hi");
    }

    #[tokio::test]
    async fn test_run_dotfile_named_py() {
        let (_dir, root) = sandbox(&[(".py", "echo dot\n")]);
        let out = sh_runner(Duration::from_secs(5)).run(&root, ".py").await.unwrap();
        assert_eq!(out, "STDOUT:dot");
    }

    #[tokio::test]
    async fn test_run_missing_file() {
        let (_dir, root) = sandbox(&[]);
        let err = sh_runner(Duration::from_secs(5)).run(&root, "nope.py").await.unwrap_err();
        assert_eq!(err.to_string(), "File \"nope.py\" not found.");
    }

    #[tokio::test]
    async fn test_run_outside() {
        let (_dir, root) = sandbox(&[]);
        let err = sh_runner(Duration::from_secs(5)).run(&root, "../evil.py").await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Cannot execute \"../evil.py\" as it is outside the permitted working directory"
        );
    }

    #[tokio::test]
    async fn test_run_timeout() {
        let (_dir, root) = sandbox(&[("slow.py", "sleep 5\n")]);
        let err = sh_runner(Duration::from_millis(200)).run(&root, "slow.py").await.unwrap_err();
        assert!(err.to_string().starts_with("executing Python file: timed out"));
    }

    #[tokio::test]
    async fn test_run_missing_interpreter() {
        let (_dir, root) = sandbox(&[("hello.py", "echo hello\n")]);
        let runner = ScriptRunner::new("sandbot-no-such-interpreter", Duration::from_secs(5));
        let err = runner.run(&root, "hello.py").await.unwrap_err();
        assert!(matches!(err, ToolError::Execution(_)));
    }

    #[tokio::test]
    async fn test_tool_execute() {
        let (_dir, root) = sandbox(&[("hello.py", "echo hi\n")]);
        let tool = RunPythonFileTool::new(sh_runner(Duration::from_secs(5)));
        let mut params = HashMap::new();
        params.insert("file_path".to_string(), json!("hello.py"));
        assert_eq!(tool.execute(&root, params).await.unwrap(), "STDOUT:hi");
    }

    #[test]
    fn test_runner_from_config() {
        let runner = ScriptRunner::from_config(&ScriptConfig {
            interpreter: "python3.12".into(),
            timeout: 10,
        });
        assert_eq!(runner.interpreter, "python3.12");
        assert_eq!(runner.timeout, Duration::from_secs(10));
    }
}
