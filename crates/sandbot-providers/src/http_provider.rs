//! Chat-completions client shared by every supported backend.
//!
//! Gemini is reached through Google's OpenAI-compatible surface, so a single
//! client type covers every entry in [`PROVIDERS`](crate::registry::PROVIDERS).
//! Failures never escape as `Err`: they come back as [`LlmResponse::error`].

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::StatusCode;
use tracing::{debug, error, warn};

use sandbot_core::config::schema::provider_key_var;
use sandbot_core::types::{
    ChatCompletionRequest, ChatCompletionResponse, LlmResponse, Message, ToolDefinition,
};

use crate::registry::{find_by_model, match_provider, resolve_model_name, ProviderConfig, ProviderSpec};
use crate::traits::{LlmProvider, LlmRequestConfig};

/// Wall-clock limit for one completion call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Used when neither the config nor the spec names an API base.
const FALLBACK_API_BASE: &str = "https://api.openai.com/v1";

// ─────────────────────────────────────────────
// Call errors
// ─────────────────────────────────────────────

/// Why a completion call produced no usable response.
#[derive(Debug, thiserror::Error)]
enum CallError {
    #[error("Error calling LLM: {0}")]
    Transport(reqwest::Error),
    #[error("Error calling LLM: {0} ({1})")]
    Status(StatusCode, String),
    #[error("Error parsing LLM response: {0}")]
    Decode(reqwest::Error),
}

// ─────────────────────────────────────────────
// HttpProvider
// ─────────────────────────────────────────────

/// Client for one OpenAI-compatible `/chat/completions` endpoint.
pub struct HttpProvider {
    client: reqwest::Client,
    /// Full completions URL, resolved once at construction.
    endpoint: String,
    /// `None` for unauthenticated (typically local) endpoints.
    api_key: Option<String>,
    default_model: String,
    extra_headers: HeaderMap,
    spec: &'static ProviderSpec,
}

impl std::fmt::Debug for HttpProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpProvider")
            .field("endpoint", &self.endpoint)
            .field("default_model", &self.default_model)
            .field("provider", &self.spec.display_name)
            .field("authenticated", &self.api_key.is_some())
            .finish()
    }
}

impl HttpProvider {
    /// Build a client for `spec` using the user's `config`.
    ///
    /// The API base comes from the config, then the spec, then the OpenAI default.
    pub fn new(config: &ProviderConfig, spec: &'static ProviderSpec, model: &str) -> Self {
        let api_base = config
            .api_base
            .as_deref()
            .or(spec.default_api_base)
            .unwrap_or(FALLBACK_API_BASE);

        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to build HTTP client");

        HttpProvider {
            client,
            endpoint: format!("{}/chat/completions", api_base.trim_end_matches('/')),
            api_key: Some(config.api_key.clone()).filter(|k| !k.is_empty()),
            default_model: model.to_string(),
            extra_headers: header_map(spec, config.extra_headers.as_ref()),
            spec,
        }
    }

    /// Assemble the request body. `tool_choice` is only sent alongside tools.
    fn request_body(
        &self,
        messages: &[Message],
        tools: Option<&[ToolDefinition]>,
        model: &str,
        config: &LlmRequestConfig,
    ) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: resolve_model_name(model, self.spec),
            messages: messages.to_vec(),
            tools: tools.map(<[ToolDefinition]>::to_vec),
            tool_choice: tools.map(|_| "auto".to_string()),
            max_tokens: Some(config.max_tokens),
            temperature: Some(config.temperature),
        }
    }

    /// POST `body` and decode the reply.
    async fn complete(&self, body: &ChatCompletionRequest) -> Result<ChatCompletionResponse, CallError> {
        let mut request = self
            .client
            .post(&self.endpoint)
            .headers(self.extra_headers.clone())
            .json(body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(CallError::Transport)?;
        let status = response.status();
        if !status.is_success() {
            let detail = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            return Err(CallError::Status(status, detail));
        }
        response.json().await.map_err(CallError::Decode)
    }
}

/// Convert configured extra headers, dropping the ones HTTP can't carry.
fn header_map(spec: &ProviderSpec, headers: Option<&HashMap<String, String>>) -> HeaderMap {
    let mut map = HeaderMap::new();
    for (key, value) in headers.into_iter().flatten() {
        match (HeaderName::from_bytes(key.as_bytes()), HeaderValue::from_str(value)) {
            (Ok(name), Ok(val)) => {
                map.insert(name, val);
            }
            _ => warn!(provider = spec.display_name, header = %key, "Ignoring invalid header"),
        }
    }
    map
}

#[async_trait]
impl LlmProvider for HttpProvider {
    async fn chat(
        &self,
        messages: &[Message],
        tools: Option<&[ToolDefinition]>,
        model: &str,
        config: &LlmRequestConfig,
    ) -> LlmResponse {
        let body = self.request_body(messages, tools, model, config);
        debug!(
            provider = self.spec.display_name,
            model = %body.model,
            messages = body.messages.len(),
            tools = body.tools.as_ref().map_or(0, Vec::len),
            "Calling LLM"
        );

        match self.complete(&body).await {
            Ok(reply) => {
                let response = LlmResponse::from(reply);
                debug!(
                    provider = self.spec.display_name,
                    tool_calls = response.tool_calls.len(),
                    finish_reason = response.finish_reason.as_deref().unwrap_or("?"),
                    "LLM response received"
                );
                response
            }
            Err(e) => {
                error!(provider = self.spec.display_name, error = %e, "LLM call failed");
                LlmResponse::error(e.to_string())
            }
        }
    }

    fn default_model(&self) -> &str {
        &self.default_model
    }

    fn display_name(&self) -> &str {
        self.spec.display_name
    }
}

// ─────────────────────────────────────────────
// Builder (convenience)
// ─────────────────────────────────────────────

/// Pick the configured provider for `model` and build its client.
///
/// The error names the key variable that would have made the model usable.
pub fn create_provider(
    model: &str,
    providers: &HashMap<String, ProviderConfig>,
) -> Result<HttpProvider, String> {
    let Some((config, spec)) = match_provider(model, providers) else {
        let hint = find_by_model(model)
            .and_then(|spec| provider_key_var(spec.name))
            .unwrap_or("an API key for one of the supported providers");
        return Err(format!(
            "No configured provider found for model '{model}'. Set {hint} or add it to the config file."
        ));
    };

    debug!(provider = spec.display_name, model, "Creating LLM provider");
    Ok(HttpProvider::new(config, spec, model))
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
