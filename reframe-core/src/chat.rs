//! Chat-completion client — the external text-generation collaborator.
//!
//! Provides a `ChatBackend` trait so the orchestrator can be exercised
//! without a network, and an `OpenAiChatClient` implementation speaking the
//! chat-completions wire format. One attempt per call; the request timeout
//! is the only bound on a slow upstream, and the caller is responsible for
//! re-submitting after a failure.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{Role, Turn};

/// Abstraction over the text-generation service.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Produce one assistant reply given a system instruction and the
    /// conversation so far, in insertion order.
    async fn complete(&self, system_prompt: &str, history: &[Turn]) -> Result<String, ChatError>;

    /// Backend name for logging.
    fn name(&self) -> &str;
}

#[derive(Error, Debug)]
pub enum ChatError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({code}): {message}")]
    Api { code: u16, message: String },

    #[error("Missing API key")]
    MissingApiKey,

    #[error("Response contained no completion")]
    EmptyCompletion,
}

/// Chat client configuration.
#[derive(Debug, Clone)]
pub struct ChatConfig {
    pub api_key: String,
    pub model: String,
    pub max_tokens: u32,
    pub timeout: Duration,
}

impl ChatConfig {
    /// Falls back to the `OPENAI_API_KEY` environment variable when no key
    /// is passed explicitly.
    pub fn new(api_key: Option<String>, model: String, max_tokens: u32, timeout: Duration) -> Self {
        let api_key = api_key
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .unwrap_or_default();

        Self {
            api_key,
            model,
            max_tokens,
            timeout,
        }
    }
}

// ============================================================================
// Wire structs (private)
// ============================================================================

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: Option<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

// ============================================================================
// OpenAiChatClient
// ============================================================================

pub struct OpenAiChatClient {
    client: Client,
    config: ChatConfig,
    base_url: String,
}

impl OpenAiChatClient {
    pub fn new(config: ChatConfig) -> Result<Self, ChatError> {
        Self::with_base_url(config, "https://api.openai.com/v1".to_string())
    }

    /// Create a client with a custom base URL (for testing / integration)
    pub fn with_base_url(config: ChatConfig, base_url: String) -> Result<Self, ChatError> {
        if config.api_key.is_empty() {
            return Err(ChatError::MissingApiKey);
        }

        let client = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            client,
            config,
            base_url,
        })
    }

    async fn complete_once(
        &self,
        system_prompt: &str,
        history: &[Turn],
    ) -> Result<String, ChatError> {
        let url = format!("{}/chat/completions", self.base_url);

        let mut messages = Vec::with_capacity(history.len() + 1);
        messages.push(WireMessage {
            role: "system",
            content: system_prompt,
        });
        for turn in history {
            messages.push(WireMessage {
                role: match turn.role {
                    Role::User => "user",
                    Role::Assistant => "assistant",
                },
                content: &turn.content,
            });
        }

        let request = CompletionRequest {
            model: &self.config.model,
            messages,
            max_tokens: self.config.max_tokens,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();

        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorResponse>(&error_body)
                .ok()
                .and_then(|e| e.error)
                .map(|e| e.message)
                .unwrap_or(error_body);

            tracing::error!(code = status.as_u16(), message = %message, "Chat API error");

            return Err(ChatError::Api {
                code: status.as_u16(),
                message,
            });
        }

        let completion: CompletionResponse = response.json().await?;

        completion
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or(ChatError::EmptyCompletion)
    }
}

#[async_trait]
impl ChatBackend for OpenAiChatClient {
    async fn complete(&self, system_prompt: &str, history: &[Turn]) -> Result<String, ChatError> {
        self.complete_once(system_prompt, history).await
    }

    fn name(&self) -> &str {
        "openai"
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(api_key: &str) -> ChatConfig {
        ChatConfig {
            api_key: api_key.to_string(),
            model: "gpt-3.5-turbo".to_string(),
            max_tokens: 200,
            timeout: Duration::from_secs(5),
        }
    }

    fn mock_completion_response(content: &str) -> serde_json::Value {
        serde_json::json!({
            "choices": [
                { "message": { "role": "assistant", "content": content } }
            ]
        })
    }

    #[tokio::test]
    async fn test_complete_sends_system_then_history_and_returns_reply() {
        let mock_server = MockServer::start().await;
        let client = OpenAiChatClient::with_base_url(test_config("test-key"), mock_server.uri())
            .expect("Failed to create client");

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .and(body_json(serde_json::json!({
                "model": "gpt-3.5-turbo",
                "messages": [
                    { "role": "system", "content": "be persuasive" },
                    { "role": "user", "content": "I read it online" }
                ],
                "max_tokens": 200
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(mock_completion_response("Let's look at the evidence.")),
            )
            .mount(&mock_server)
            .await;

        let history = vec![Turn::user("I read it online")];
        let result = client.complete("be persuasive", &history).await;

        assert!(result.is_ok(), "Expected Ok, got Err: {:?}", result.err());
        assert_eq!(result.unwrap(), "Let's look at the evidence.");
    }

    #[tokio::test]
    async fn test_complete_returns_api_error_on_500() {
        let mock_server = MockServer::start().await;
        let client = OpenAiChatClient::with_base_url(test_config("test-key"), mock_server.uri())
            .expect("Failed to create client");

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_json(serde_json::json!({
                "error": { "message": "The server had an error" }
            })))
            .mount(&mock_server)
            .await;

        let result = client.complete("sys", &[Turn::user("hi")]).await;

        match result {
            Err(ChatError::Api { code, message }) => {
                assert_eq!(code, 500);
                assert_eq!(message, "The server had an error");
            }
            other => panic!("Expected Api error, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_complete_surfaces_rate_limit_without_retry() {
        let mock_server = MockServer::start().await;
        let client = OpenAiChatClient::with_base_url(test_config("test-key"), mock_server.uri())
            .expect("Failed to create client");

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
                "error": { "message": "Rate limit exceeded" }
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let result = client.complete("sys", &[Turn::user("hi")]).await;
        assert!(matches!(result, Err(ChatError::Api { code: 429, .. })));
    }

    #[tokio::test]
    async fn test_client_fails_with_missing_api_key() {
        let result = OpenAiChatClient::with_base_url(
            test_config(""),
            "http://localhost:1".to_string(),
        );
        assert!(matches!(result, Err(ChatError::MissingApiKey)));
    }

    #[tokio::test]
    async fn test_empty_choices_is_an_error() {
        let mock_server = MockServer::start().await;
        let client = OpenAiChatClient::with_base_url(test_config("test-key"), mock_server.uri())
            .expect("Failed to create client");

        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "choices": [] })),
            )
            .mount(&mock_server)
            .await;

        let result = client.complete("sys", &[Turn::user("hi")]).await;
        assert!(matches!(result, Err(ChatError::EmptyCompletion)));
    }

    #[tokio::test]
    async fn test_assistant_turns_round_trip_in_request_body() {
        let mock_server = MockServer::start().await;
        let client = OpenAiChatClient::with_base_url(test_config("test-key"), mock_server.uri())
            .expect("Failed to create client");

        Mock::given(method("POST"))
            .and(body_json(serde_json::json!({
                "model": "gpt-3.5-turbo",
                "messages": [
                    { "role": "system", "content": "sys" },
                    { "role": "user", "content": "u1" },
                    { "role": "assistant", "content": "a1" },
                    { "role": "user", "content": "u2" }
                ],
                "max_tokens": 200
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(mock_completion_response("a2")),
            )
            .mount(&mock_server)
            .await;

        let history = vec![Turn::user("u1"), Turn::assistant("a1"), Turn::user("u2")];
        let result = client.complete("sys", &history).await;
        assert_eq!(result.unwrap(), "a2");
    }
}
