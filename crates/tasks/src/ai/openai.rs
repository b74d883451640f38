//! OpenAI-compatible chat completions provider.
//!
//! Also serves OpenRouter and Perplexity, which expose the same API shape.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::{TasksError, TasksResult};

use super::provider::{AIMessage, AIProvider, AIResponse, GenerateOptions, TokenUsage};

/// OpenAI API endpoint
const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";

/// OpenRouter API endpoint
const OPENROUTER_API_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

/// Perplexity API endpoint
const PERPLEXITY_API_URL: &str = "https://api.perplexity.ai/chat/completions";

/// OpenAI API request message
#[derive(Debug, Serialize)]
struct OpenAIMessage {
    role: &'static str,
    content: String,
}

/// OpenAI API response format
#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

/// OpenAI API request
#[derive(Debug, Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

/// OpenAI API response choice message
#[derive(Debug, Deserialize)]
struct OpenAIChoiceMessage {
    content: Option<String>,
}

/// OpenAI API response choice
#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIChoiceMessage,
}

/// OpenAI API usage
#[derive(Debug, Default, Deserialize)]
#[allow(clippy::struct_field_names)]
struct OpenAIUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

/// OpenAI API response
#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
    #[serde(default)]
    model: String,
    #[serde(default)]
    usage: OpenAIUsage,
}

/// OpenAI API error
#[derive(Debug, Deserialize)]
struct OpenAIError {
    message: String,
}

/// OpenAI API error response
#[derive(Debug, Deserialize)]
struct OpenAIErrorResponse {
    error: OpenAIError,
}

/// Provider for any OpenAI-compatible chat completions endpoint.
pub struct OpenAIProvider {
    client: Client,
    name: &'static str,
    api_key_env: &'static str,
    api_key: Option<String>,
    base_url: String,
    /// Perplexity rejects `response_format: json_object`
    supports_json_mode: bool,
}

impl OpenAIProvider {
    fn from_env_with(name: &'static str, api_key_env: &'static str, base_url: &str) -> Self {
        Self {
            client: Client::new(),
            name,
            api_key_env,
            api_key: std::env::var(api_key_env).ok().filter(|k| !k.is_empty()),
            base_url: base_url.to_string(),
            supports_json_mode: true,
        }
    }

    /// Create a new OpenAI provider with an API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            ..Self::from_env_with("openai", "OPENAI_API_KEY", OPENAI_API_URL)
        }
    }

    /// OpenAI, key from `OPENAI_API_KEY`.
    pub fn openai() -> Self {
        Self::from_env_with("openai", "OPENAI_API_KEY", OPENAI_API_URL)
    }

    /// OpenRouter, key from `OPENROUTER_API_KEY`.
    pub fn openrouter() -> Self {
        Self::from_env_with("openrouter", "OPENROUTER_API_KEY", OPENROUTER_API_URL)
    }

    /// Perplexity, key from `PERPLEXITY_API_KEY`.
    pub fn perplexity() -> Self {
        Self {
            supports_json_mode: false,
            ..Self::from_env_with("perplexity", "PERPLEXITY_API_KEY", PERPLEXITY_API_URL)
        }
    }

    /// Set a custom base URL (useful for proxies or self-hosted gateways).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Convert messages to OpenAI format.
    fn convert_messages(messages: &[AIMessage]) -> Vec<OpenAIMessage> {
        messages
            .iter()
            .map(|msg| OpenAIMessage {
                role: msg.role.as_str(),
                content: msg.content.clone(),
            })
            .collect()
    }
}

#[async_trait]
impl AIProvider for OpenAIProvider {
    fn name(&self) -> &'static str {
        self.name
    }

    fn api_key_env_var(&self) -> &'static str {
        self.api_key_env
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn generate_text(
        &self,
        model: &str,
        messages: &[AIMessage],
        options: &GenerateOptions,
    ) -> TasksResult<AIResponse> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or_else(|| TasksError::Ai(format!("{} not set", self.api_key_env)))?;

        let response_format = (options.json_mode && self.supports_json_mode).then_some(ResponseFormat {
            format_type: "json_object",
        });

        let request = OpenAIRequest {
            model: model.to_string(),
            messages: Self::convert_messages(messages),
            max_tokens: options.max_tokens,
            temperature: options.temperature,
            response_format,
        };

        debug!(provider = self.name, model, "Calling chat completions API");

        let response = self
            .client
            .post(&self.base_url)
            .header("Authorization", format!("Bearer {api_key}"))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| TasksError::Ai(format!("{} API request failed: {e}", self.name)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| TasksError::Ai(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            if let Ok(error_response) = serde_json::from_str::<OpenAIErrorResponse>(&body) {
                return Err(TasksError::Ai(format!(
                    "{} API error: {}",
                    self.name, error_response.error.message
                )));
            }
            return Err(TasksError::Ai(format!(
                "{} API error ({status}): {body}",
                self.name
            )));
        }

        let api_response: OpenAIResponse = serde_json::from_str(&body)
            .map_err(|e| TasksError::Ai(format!("Failed to parse response: {e}")))?;

        let text = api_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        Ok(AIResponse {
            text,
            usage: TokenUsage {
                input_tokens: api_response.usage.prompt_tokens,
                output_tokens: api_response.usage.completion_tokens,
                total_tokens: api_response.usage.total_tokens,
            },
            model: api_response.model,
            provider: self.name.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_message_conversion() {
        let messages = vec![
            AIMessage::system("You are a helpful assistant"),
            AIMessage::user("Hello"),
            AIMessage::assistant("Hi there!"),
        ];

        let converted = OpenAIProvider::convert_messages(&messages);

        assert_eq!(converted.len(), 3);
        assert_eq!(converted[0].role, "system");
        assert_eq!(converted[1].role, "user");
        assert_eq!(converted[2].role, "assistant");
    }

    #[tokio::test]
    async fn test_generate_text_json_mode() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("Authorization", "Bearer sk-test"))
            .and(body_partial_json(json!({
                "model": "gpt-4o",
                "response_format": { "type": "json_object" }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{ "message": { "content": "{\"subtasks\": []}" } }],
                "model": "gpt-4o",
                "usage": { "prompt_tokens": 3, "completion_tokens": 4, "total_tokens": 7 }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = OpenAIProvider::new("sk-test").with_base_url(server.uri());
        let options = GenerateOptions {
            json_mode: true,
            ..GenerateOptions::default()
        };
        let response = provider
            .generate_text("gpt-4o", &[AIMessage::user("hi")], &options)
            .await
            .unwrap();

        assert_eq!(response.text, "{\"subtasks\": []}");
        assert_eq!(response.usage.total_tokens, 7);
        assert_eq!(response.provider, "openai");
    }

    #[tokio::test]
    async fn test_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_json(json!({
                "error": { "message": "rate limited" }
            })))
            .mount(&server)
            .await;

        let provider = OpenAIProvider::new("sk-test").with_base_url(server.uri());
        let err = provider
            .generate_text("gpt-4o", &[AIMessage::user("hi")], &GenerateOptions::default())
            .await
            .unwrap_err();

        assert!(err.to_string().contains("rate limited"));
    }
}
