//! OpenAI-compatible chat completions provider.
//!
//! Works with any endpoint speaking the `/chat/completions` protocol; providers
//! differ only by base URL and API key. OpenRouter is the default.

use crate::client::{check_status, map_transport_error, LlmClient, LlmRequest, LlmResponse, LlmUsage};
use cropwise_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ChatChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

/// Client for OpenAI-compatible APIs.
pub struct OpenAiCompatibleClient {
    /// Provider name used in logs and errors
    name: String,
    api_key: String,
    base_url: String,
    timeout_secs: u64,
    client: reqwest::Client,
}

impl OpenAiCompatibleClient {
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout_secs: u64,
    ) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| AppError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            name: name.into(),
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout_secs,
            client,
        })
    }

    fn chat_completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn build_request<'a>(&self, request: &'a LlmRequest) -> ChatRequest<'a> {
        let mut messages = Vec::with_capacity(2);
        if let Some(ref system) = request.system {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: &request.prompt,
        });

        ChatRequest {
            model: &request.model,
            messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        }
    }
}

/// Extract the first choice's content, rejecting empty or missing choices.
fn parse_chat_response(body: &str, fallback_model: &str) -> AppResult<LlmResponse> {
    let parsed: ChatResponse = serde_json::from_str(body)
        .map_err(|e| AppError::LlmMalformedResponse(format!("{}: {}", e, body)))?;

    let content = parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message)
        .and_then(|message| message.content)
        .ok_or_else(|| AppError::LlmMalformedResponse(format!("no choices in response: {}", body)))?;

    let usage = parsed
        .usage
        .map(|u| LlmUsage::new(u.prompt_tokens, u.completion_tokens))
        .unwrap_or_default();

    Ok(LlmResponse {
        content,
        model: parsed.model.unwrap_or_else(|| fallback_model.to_string()),
        usage,
    })
}

#[async_trait::async_trait]
impl LlmClient for OpenAiCompatibleClient {
    fn provider_name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        tracing::info!("Sending chat completion request to {}", self.name);
        tracing::debug!(
            "Model: {}, prompt length: {} bytes",
            request.model,
            request.prompt.len()
        );

        let response = self
            .client
            .post(self.chat_completions_url())
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&self.build_request(request))
            .send()
            .await
            .map_err(|e| map_transport_error(&self.name, e, self.timeout_secs))?;

        let response = check_status(&self.name, response).await?;

        let body = response
            .text()
            .await
            .map_err(|e| map_transport_error(&self.name, e, self.timeout_secs))?;

        let parsed = parse_chat_response(&body, &request.model)?;

        tracing::info!("Received completion from {}", self.name);
        tracing::debug!("Token usage: {}", parsed.usage.total_tokens);

        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> OpenAiCompatibleClient {
        OpenAiCompatibleClient::new("openrouter", OPENROUTER_BASE_URL, "sk-test", 30).unwrap()
    }

    #[test]
    fn test_chat_completions_url() {
        assert_eq!(
            client().chat_completions_url(),
            "https://openrouter.ai/api/v1/chat/completions"
        );
    }

    #[test]
    fn test_build_request_with_system() {
        let c = client();
        let request = LlmRequest::new("What is drying?", "openai/gpt-3.5-turbo")
            .with_system("Educational only.")
            .with_temperature(0.3);

        let body = serde_json::to_value(c.build_request(&request)).unwrap();
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(body["messages"][1]["content"], "What is drying?");
        assert!(body.get("max_tokens").is_none());
    }

    #[test]
    fn test_parse_valid_response() {
        let body = r#"{
            "model": "openai/gpt-3.5-turbo",
            "choices": [{"message": {"role": "assistant", "content": "Drying lowers moisture."}}],
            "usage": {"prompt_tokens": 40, "completion_tokens": 6}
        }"#;

        let response = parse_chat_response(body, "fallback").unwrap();
        assert_eq!(response.content, "Drying lowers moisture.");
        assert_eq!(response.model, "openai/gpt-3.5-turbo");
        assert_eq!(response.usage.total_tokens, 46);
    }

    #[test]
    fn test_parse_empty_choices_is_malformed() {
        let result = parse_chat_response(r#"{"choices": []}"#, "m");
        assert!(matches!(result, Err(AppError::LlmMalformedResponse(_))));
    }

    #[test]
    fn test_parse_non_json_is_malformed() {
        let result = parse_chat_response("<html>rate limited</html>", "m");
        assert!(matches!(result, Err(AppError::LlmMalformedResponse(_))));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_remote_error() {
        let c = OpenAiCompatibleClient::new("local", "http://127.0.0.1:9", "sk-test", 2).unwrap();
        let request = LlmRequest::new("hello", "m");

        let err = c.complete(&request).await.unwrap_err();
        assert!(err.is_recoverable());
    }
}
