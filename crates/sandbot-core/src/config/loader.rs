//! Config loader — reads `~/.sandbot/config.json` and merges env vars.
//!
//! The file holds API keys, so it is never looked up in the current
//! directory, which is also the default working root the agent can read.
//!
//! # Loading precedence
//! 1. Defaults (from `Config::default()`)
//! 2. JSON file: `~/.sandbot/config.json`
//! 3. Environment variables `SANDBOT_<SECTION>__<FIELD>` (override JSON)
//! 4. Conventional provider key variables (`GEMINI_API_KEY`, ...) for any
//!    provider still without a key

use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::schema::{Config, ProviderConfig, PROVIDER_KEY_VARS};

/// Default config file path: `~/.sandbot/config.json`.
pub fn get_config_path() -> PathBuf {
    crate::utils::get_data_path().join("config.json")
}

/// Load configuration from the given path (or the default one) + env vars.
///
/// Falls back to `Config::default()` if the file doesn't exist or can't be parsed.
pub fn load_config(path: Option<&Path>) -> Config {
    let config_path = path.map(PathBuf::from).unwrap_or_else(get_config_path);
    apply_env_overrides(load_config_from_path(&config_path))
}

/// Load config from a specific file path, without env overrides.
fn load_config_from_path(path: &Path) -> Config {
    if !path.exists() {
        info!("No config file found at {}, using defaults", path.display());
        return Config::default();
    }

    debug!("Loading config from {}", path.display());

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to read config file {}: {}", path.display(), e);
            return Config::default();
        }
    };

    match serde_json::from_str(&content) {
        Ok(config) => config,
        Err(e) => {
            warn!("Failed to parse config {}: {}", path.display(), e);
            Config::default()
        }
    }
}

/// Apply overrides from the process environment.
fn apply_env_overrides(config: Config) -> Config {
    apply_overrides_from(config, |key| std::env::var(key).ok())
}

/// Apply environment-style overrides using `lookup` as the variable source.
///
/// Supported overrides:
/// - `SANDBOT_AGENT__MODEL` → `agent.model`
/// - `SANDBOT_AGENT__WORKING_DIR` → `agent.working_dir`
/// - `SANDBOT_AGENT__MAX_ITERATIONS` → `agent.max_iterations`
/// - `SANDBOT_AGENT__MAX_TOKENS` → `agent.max_tokens`
/// - `SANDBOT_AGENT__TEMPERATURE` → `agent.temperature`
/// - `SANDBOT_PROVIDERS__<NAME>__API_KEY` → `providers.<name>.api_key`
/// - `SANDBOT_PROVIDERS__<NAME>__API_BASE` → `providers.<name>.api_base`
/// - `SANDBOT_TOOLS__SCRIPT__INTERPRETER` → `tools.script.interpreter`
/// - `SANDBOT_TOOLS__SCRIPT__TIMEOUT` → `tools.script.timeout`
fn apply_overrides_from<F>(mut config: Config, lookup: F) -> Config
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(val) = lookup("SANDBOT_AGENT__MODEL") {
        config.agent.model = val;
    }
    if let Some(val) = lookup("SANDBOT_AGENT__WORKING_DIR") {
        config.agent.working_dir = val;
    }
    if let Some(n) = lookup("SANDBOT_AGENT__MAX_ITERATIONS").and_then(|v| v.parse().ok()) {
        config.agent.max_iterations = n;
    }
    if let Some(n) = lookup("SANDBOT_AGENT__MAX_TOKENS").and_then(|v| v.parse().ok()) {
        config.agent.max_tokens = n;
    }
    if let Some(t) = lookup("SANDBOT_AGENT__TEMPERATURE").and_then(|v| v.parse().ok()) {
        config.agent.temperature = t;
    }

    for (name, conventional_key) in PROVIDER_KEY_VARS {
        if let Some(provider) = config.providers.get_mut(name) {
            apply_provider_env(provider, &name.to_uppercase(), conventional_key, &lookup);
        }
    }

    if let Some(val) = lookup("SANDBOT_TOOLS__SCRIPT__INTERPRETER") {
        config.tools.script.interpreter = val;
    }
    if let Some(n) = lookup("SANDBOT_TOOLS__SCRIPT__TIMEOUT").and_then(|v| v.parse().ok()) {
        config.tools.script.timeout = n;
    }

    config
}

/// Apply env var overrides for a single provider.
fn apply_provider_env<F>(provider: &mut ProviderConfig, name: &str, conventional_key: &str, lookup: &F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(val) = lookup(&format!("SANDBOT_PROVIDERS__{name}__API_KEY")) {
        provider.api_key = val;
    }
    if let Some(val) = lookup(&format!("SANDBOT_PROVIDERS__{name}__API_BASE")) {
        provider.api_base = Some(val);
    }
    if !provider.is_configured() {
        if let Some(val) = lookup(conventional_key).filter(|v| !v.is_empty()) {
            debug!(provider = name, var = conventional_key, "using API key from environment");
            provider.api_key = val;
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_temp_json(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_load_missing_file() {
        let config = load_config_from_path(Path::new("/nonexistent/path/config.json"));
        assert_eq!(config.agent.max_tokens, 8192);
        assert_eq!(config.agent.max_iterations, 20);
    }

    #[test]
    fn test_load_valid_json() {
        let file = write_temp_json(
            r#"{
            "agent": {
                "model": "gpt-4o",
                "workingDir": "~/projects/calculator",
                "maxIterations": 8
            },
            "providers": {
                "openai": { "apiKey": "sk-test" }
            }
        }"#,
        );

        let config = load_config_from_path(file.path());
        assert_eq!(config.agent.model, "gpt-4o");
        assert_eq!(config.agent.working_dir, "~/projects/calculator");
        assert_eq!(config.agent.max_iterations, 8);
        assert!(config.providers.openai.is_configured());
        // Default preserved
        assert_eq!(config.agent.temperature, 0.7);
    }

    #[test]
    fn test_load_invalid_json_returns_defaults() {
        let file = write_temp_json("not valid json {{{");
        let config = load_config_from_path(file.path());
        assert_eq!(config.agent.model, "gemini-2.0-flash-001");
    }

    #[test]
    fn test_load_empty_json() {
        let file = write_temp_json("{}");
        let config = load_config_from_path(file.path());
        assert_eq!(config.tools.script.interpreter, "python3");
    }

    #[test]
    fn test_env_override_agent_fields() {
        let config = apply_overrides_from(
            Config::default(),
            env(&[
                ("SANDBOT_AGENT__MODEL", "test-model"),
                ("SANDBOT_AGENT__WORKING_DIR", "/srv/sandbox"),
                ("SANDBOT_AGENT__MAX_ITERATIONS", "3"),
                ("SANDBOT_AGENT__TEMPERATURE", "not-a-number"),
            ]),
        );
        assert_eq!(config.agent.model, "test-model");
        assert_eq!(config.agent.working_dir, "/srv/sandbox");
        assert_eq!(config.agent.max_iterations, 3);
        // Unparseable values are ignored
        assert_eq!(config.agent.temperature, 0.7);
    }

    #[test]
    fn test_env_override_script_fields() {
        let config = apply_overrides_from(
            Config::default(),
            env(&[
                ("SANDBOT_TOOLS__SCRIPT__INTERPRETER", "python3.12"),
                ("SANDBOT_TOOLS__SCRIPT__TIMEOUT", "10"),
            ]),
        );
        assert_eq!(config.tools.script.interpreter, "python3.12");
        assert_eq!(config.tools.script.timeout, 10);
    }

    #[test]
    fn test_conventional_key_fallback() {
        let config = apply_overrides_from(Config::default(), env(&[("GEMINI_API_KEY", "g-env")]));
        assert_eq!(config.providers.gemini.api_key, "g-env");
    }

    #[test]
    fn test_conventional_key_fallback_every_provider() {
        let config = apply_overrides_from(
            Config::default(),
            env(&[
                ("OPENROUTER_API_KEY", "or-env"),
                ("HOSTED_VLLM_API_KEY", "vllm-env"),
                ("GROQ_API_KEY", ""),
            ]),
        );
        assert_eq!(config.providers.openrouter.api_key, "or-env");
        assert_eq!(config.providers.vllm.api_key, "vllm-env");
        // Empty variables don't count as a key
        assert!(!config.providers.groq.is_configured());
    }

    #[test]
    fn test_config_path_outside_current_dir() {
        let path = get_config_path();
        assert!(path.ends_with(".sandbot/config.json"));
    }

    #[test]
    fn test_prefixed_key_beats_conventional_key() {
        let config = apply_overrides_from(
            Config::default(),
            env(&[
                ("GEMINI_API_KEY", "g-env"),
                ("SANDBOT_PROVIDERS__GEMINI__API_KEY", "g-sandbot"),
            ]),
        );
        assert_eq!(config.providers.gemini.api_key, "g-sandbot");
    }

    #[test]
    fn test_file_key_beats_conventional_key() {
        let file = write_temp_json(r#"{ "providers": { "gemini": { "apiKey": "g-file" } } }"#);
        let config = apply_overrides_from(
            load_config_from_path(file.path()),
            env(&[("GEMINI_API_KEY", "g-env")]),
        );
        assert_eq!(config.providers.gemini.api_key, "g-file");
    }

    #[test]
    fn test_env_override_api_base() {
        let config = apply_overrides_from(
            Config::default(),
            env(&[("SANDBOT_PROVIDERS__VLLM__API_BASE", "http://localhost:8000/v1")]),
        );
        assert_eq!(
            config.providers.vllm.api_base.as_deref(),
            Some("http://localhost:8000/v1")
        );
    }
}
