//! Completion client factory.

use crate::client::LlmClient;
use crate::providers::ollama::DEFAULT_OLLAMA_URL;
use crate::providers::openai_compat::{OPENAI_BASE_URL, OPENROUTER_BASE_URL};
use crate::providers::{OllamaClient, OpenAiCompatibleClient};
use crate::types::ProviderType;
use cropwise_core::{AppError, AppResult};
use std::sync::Arc;

/// Create a completion client for a provider.
///
/// # Arguments
/// * `provider` - Provider identifier ("openrouter", "openai", "ollama")
/// * `endpoint` - Optional base URL override
/// * `api_key` - API key, required by hosted providers
/// * `timeout_secs` - Per-request transport timeout
///
/// # Errors
/// Returns `AppError::Config` if the provider is unknown or a required API
/// key is missing.
pub fn create_client(
    provider: &str,
    endpoint: Option<&str>,
    api_key: Option<&str>,
    timeout_secs: u64,
) -> AppResult<Arc<dyn LlmClient>> {
    let provider_type = ProviderType::parse(provider)
        .ok_or_else(|| AppError::Config(format!("Unknown provider: {}", provider)))?;

    let api_key = api_key.filter(|k| !k.is_empty());
    if provider_type.requires_api_key() && api_key.is_none() {
        return Err(AppError::Config(format!(
            "{} provider requires API key",
            provider_type.as_str()
        )));
    }

    tracing::debug!(
        "Creating completion client: provider={}, endpoint={:?}, timeout={}s",
        provider_type.as_str(),
        endpoint,
        timeout_secs
    );

    match provider_type {
        ProviderType::Ollama => {
            let base_url = endpoint.unwrap_or(DEFAULT_OLLAMA_URL);
            Ok(Arc::new(OllamaClient::new(base_url, timeout_secs)?))
        }
        ProviderType::OpenRouter | ProviderType::OpenAI => {
            let default_url = if provider_type == ProviderType::OpenRouter {
                OPENROUTER_BASE_URL
            } else {
                OPENAI_BASE_URL
            };
            let client = OpenAiCompatibleClient::new(
                provider_type.as_str(),
                endpoint.unwrap_or(default_url),
                api_key.unwrap_or_default(),
                timeout_secs,
            )?;
            Ok(Arc::new(client))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_ollama_client() {
        let client = create_client("ollama", None, None, 30).unwrap();
        assert_eq!(client.provider_name(), "ollama");
    }

    #[test]
    fn test_create_ollama_with_custom_endpoint() {
        let client = create_client("ollama", Some("http://localhost:8080"), None, 30);
        assert!(client.is_ok());
    }

    #[test]
    fn test_create_openrouter_client() {
        let client = create_client("openrouter", None, Some("sk-or-test"), 30).unwrap();
        assert_eq!(client.provider_name(), "openrouter");
    }

    #[test]
    fn test_openrouter_requires_api_key() {
        match create_client("openrouter", None, None, 30) {
            Err(err) => assert!(err.to_string().contains("requires API key")),
            Ok(_) => panic!("Expected error for OpenRouter without API key"),
        }
    }

    #[test]
    fn test_empty_api_key_rejected() {
        assert!(create_client("openai", None, Some(""), 30).is_err());
    }

    #[test]
    fn test_unknown_provider() {
        match create_client("unknown", None, None, 30) {
            Err(err) => assert!(err.to_string().contains("Unknown provider")),
            Ok(_) => panic!("Expected error for unknown provider"),
        }
    }
}
