//! Provider registry — static specs for the supported LLM providers.
//!
//! Each `ProviderSpec` describes how to reach one OpenAI-compatible endpoint:
//! keywords for model matching, the API base, and routing prefixes to strip
//! from model names. Conventional key variables live with the config schema.

use std::collections::HashMap;

// ─────────────────────────────────────────────
// ProviderSpec — static metadata for one provider
// ─────────────────────────────────────────────

/// Static specification describing one LLM provider.
///
/// Used by the matching logic to figure out which provider to use for a given model.
#[derive(Clone, Debug)]
pub struct ProviderSpec {
    /// Internal name (e.g. `"gemini"`), also the key in `ProvidersConfig`.
    pub name: &'static str,
    /// Keywords to match in model names (lowercase). E.g. `&["gemini"]`.
    pub keywords: &'static [&'static str],
    /// Human-readable name for logs. E.g. `"Gemini"`.
    pub display_name: &'static str,
    /// Routing prefixes removed from model names before the request,
    /// e.g. `"gemini/gemini-2.0-flash"` → `"gemini-2.0-flash"`.
    pub strip_prefixes: &'static [&'static str],
    /// Whether this is a gateway/aggregator (OpenRouter).
    /// Gateways are used as fallback when no direct match is found.
    pub is_gateway: bool,
    /// Whether this is a local/self-hosted provider (vLLM). Needs an explicit API base.
    pub is_local: bool,
    /// Default API base URL.
    pub default_api_base: Option<&'static str>,
}

// ─────────────────────────────────────────────
// Supported providers (in priority order)
// ─────────────────────────────────────────────

/// Complete list of supported provider specifications, in matching priority order.
pub static PROVIDERS: &[ProviderSpec] = &[
    // Gemini through its OpenAI-compatible endpoint
    ProviderSpec {
        name: "gemini",
        keywords: &["gemini", "gemma"],
        display_name: "Gemini",
        strip_prefixes: &["gemini/"],
        is_gateway: false,
        is_local: false,
        default_api_base: Some("https://generativelanguage.googleapis.com/v1beta/openai"),
    },
    ProviderSpec {
        name: "openai",
        keywords: &["openai", "gpt", "o1", "o3", "o4"],
        display_name: "OpenAI",
        strip_prefixes: &["openai/"],
        is_gateway: false,
        is_local: false,
        default_api_base: Some("https://api.openai.com/v1"),
    },
    ProviderSpec {
        name: "groq",
        keywords: &["groq"],
        display_name: "Groq",
        strip_prefixes: &["groq/"],
        is_gateway: false,
        is_local: false,
        default_api_base: Some("https://api.groq.com/openai/v1"),
    },
    // OpenRouter gateway: takes vendor-qualified model names as-is
    ProviderSpec {
        name: "openrouter",
        keywords: &["openrouter"],
        display_name: "OpenRouter",
        strip_prefixes: &["openrouter/"],
        is_gateway: true,
        is_local: false,
        default_api_base: Some("https://openrouter.ai/api/v1"),
    },
    // vLLM (self-hosted)
    ProviderSpec {
        name: "vllm",
        keywords: &["vllm"],
        display_name: "vLLM",
        strip_prefixes: &["vllm/", "hosted_vllm/"],
        is_gateway: false,
        is_local: true,
        default_api_base: None,
    },
];

// ─────────────────────────────────────────────
// Matching functions
// ─────────────────────────────────────────────

/// Find a provider spec by matching keywords against a model name.
///
/// Skips gateways and local providers; those are fallback only.
/// Returns the first match in priority order.
pub fn find_by_model(model: &str) -> Option<&'static ProviderSpec> {
    let model_lower = model.to_lowercase();
    PROVIDERS.iter().find(|spec| {
        !spec.is_gateway
            && !spec.is_local
            && spec.keywords.iter().any(|kw| model_lower.contains(kw))
    })
}

/// Find a provider spec by exact name.
pub fn find_by_name(name: &str) -> Option<&'static ProviderSpec> {
    PROVIDERS.iter().find(|spec| spec.name == name)
}

/// Resolve the model name for API calls by dropping a routing prefix.
///
/// Only the provider's own prefixes are stripped; vendor-qualified names
/// meant for gateways (e.g. `"google/gemini-2.0-flash"`) pass through.
pub fn resolve_model_name(model: &str, spec: &ProviderSpec) -> String {
    spec.strip_prefixes
        .iter()
        .find_map(|prefix| model.strip_prefix(prefix))
        .unwrap_or(model)
        .to_string()
}

/// Provider config lives in core.
pub use sandbot_core::config::schema::ProviderConfig;

/// Match a model name to a configured provider.
///
/// 1. Find by keyword match, only if that provider has an API key.
/// 2. Fallback to the first configured gateway.
/// 3. Fallback to a local provider that has an explicit API base.
pub fn match_provider<'a>(
    model: &str,
    providers: &'a HashMap<String, ProviderConfig>,
) -> Option<(&'a ProviderConfig, &'static ProviderSpec)> {
    // 1. Direct keyword match
    if let Some(spec) = find_by_model(model) {
        if let Some(config) = providers.get(spec.name) {
            if config.is_configured() {
                return Some((config, spec));
            }
        }
    }

    // 2. Fallback to first configured gateway
    let gateway = PROVIDERS.iter().filter(|s| s.is_gateway).find_map(|spec| {
        providers
            .get(spec.name)
            .filter(|c| c.is_configured())
            .map(|c| (c, spec))
    });
    if gateway.is_some() {
        return gateway;
    }

    // 3. Local endpoint
    PROVIDERS.iter().filter(|s| s.is_local).find_map(|spec| {
        providers
            .get(spec.name)
            .filter(|c| c.api_base.is_some())
            .map(|c| (c, spec))
    })
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn configured(api_key: &str, api_base: Option<&str>) -> ProviderConfig {
        ProviderConfig {
            api_key: api_key.to_string(),
            api_base: api_base.map(String::from),
            extra_headers: None,
        }
    }

    #[test]
    fn test_find_by_model_gemini() {
        let spec = find_by_model("gemini-2.0-flash-001").unwrap();
        assert_eq!(spec.name, "gemini");
    }

    #[test]
    fn test_find_by_model_gpt() {
        let spec = find_by_model("gpt-4o-mini").unwrap();
        assert_eq!(spec.name, "openai");
    }

    #[test]
    fn test_find_by_model_groq() {
        let spec = find_by_model("groq/llama-3.3-70b").unwrap();
        assert_eq!(spec.name, "groq");
    }

    #[test]
    fn test_find_by_model_skips_gateway() {
        // the gateway keyword never matches directly
        let spec = find_by_model("openrouter/google/gemini-2.0-flash");
        assert_eq!(spec.unwrap().name, "gemini");
    }

    #[test]
    fn test_find_by_model_unknown() {
        assert!(find_by_model("some-random-model-xyz").is_none());
    }

    #[test]
    fn test_find_by_name() {
        let spec = find_by_name("gemini").unwrap();
        assert_eq!(spec.display_name, "Gemini");
        assert!(find_by_name("anthropic").is_none());
    }

    #[test]
    fn test_resolve_model_strips_own_prefix() {
        let spec = find_by_name("gemini").unwrap();
        assert_eq!(resolve_model_name("gemini/gemini-2.0-flash", spec), "gemini-2.0-flash");
    }

    #[test]
    fn test_resolve_model_plain_name_untouched() {
        let spec = find_by_name("gemini").unwrap();
        assert_eq!(resolve_model_name("gemini-2.0-flash-001", spec), "gemini-2.0-flash-001");
    }

    #[test]
    fn test_resolve_model_gateway_keeps_vendor() {
        let spec = find_by_name("openrouter").unwrap();
        assert_eq!(
            resolve_model_name("openrouter/google/gemini-2.0-flash", spec),
            "google/gemini-2.0-flash"
        );
        assert_eq!(resolve_model_name("google/gemini-2.0-flash", spec), "google/gemini-2.0-flash");
    }

    #[test]
    fn test_match_provider_direct() {
        let mut providers = HashMap::new();
        providers.insert("gemini".to_string(), configured("g-key", None));
        let (config, spec) = match_provider("gemini-2.0-flash-001", &providers).unwrap();
        assert_eq!(spec.name, "gemini");
        assert_eq!(config.api_key, "g-key");
    }

    #[test]
    fn test_match_provider_gateway_fallback() {
        let mut providers = HashMap::new();
        providers.insert("gemini".to_string(), configured("", None));
        providers.insert("openrouter".to_string(), configured("sk-or-abc", None));
        let (_, spec) = match_provider("gemini-2.0-flash-001", &providers).unwrap();
        assert_eq!(spec.name, "openrouter");
    }

    #[test]
    fn test_match_provider_local_fallback() {
        let mut providers = HashMap::new();
        providers.insert("vllm".to_string(), configured("", Some("http://localhost:8000/v1")));
        let (_, spec) = match_provider("my-local-model", &providers).unwrap();
        assert_eq!(spec.name, "vllm");
    }

    #[test]
    fn test_match_provider_none() {
        let providers = HashMap::new();
        assert!(match_provider("gemini-2.0-flash-001", &providers).is_none());
    }
}
