//! Pure OpenAI REST API client
//!
//! A clean, minimal client for the OpenAI chat completions API with no
//! domain-specific logic. Supports plain chat and function calling.
//!
//! # Example
//!
//! ```rust,ignore
//! use openai_client::{OpenAIClient, ChatRequest, Message};
//!
//! let client = OpenAIClient::from_env()?;
//!
//! let response = client
//!     .chat_completion(ChatRequest::new("gpt-4o-mini").message(Message::user("Hello!")))
//!     .await?;
//! ```
//!
//! # Function Calling
//!
//! ```rust,ignore
//! let search = ToolDefinition::for_args::<SearchArgs>("web_search", "Search the web");
//! let response = client
//!     .function_calling(FunctionRequest::new("gpt-4o-mini", messages, &[search]))
//!     .await?;
//!
//! for call in &response.tool_calls {
//!     let args: SearchArgs = call.parse_args()?;
//! }
//! ```

pub mod error;
pub mod tool;
pub mod types;

pub use error::{OpenAIError, Result};
pub use tool::{parameters_schema, ToolCall, ToolDefinition};
pub use types::*;

use reqwest::Client;
use std::fmt;
use tracing::{debug, warn};

/// Pure OpenAI API client.
#[derive(Clone)]
pub struct OpenAIClient {
    http_client: Client,
    api_key: String,
    base_url: String,
}

impl fmt::Debug for OpenAIClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAIClient")
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl OpenAIClient {
    /// Create a new OpenAI client with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http_client: Client::new(),
            api_key: api_key.into(),
            base_url: "https://api.openai.com/v1".to_string(),
        }
    }

    /// Create from environment variable `OPENAI_API_KEY`.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| OpenAIError::Config("OPENAI_API_KEY not set".into()))?;
        Ok(Self::new(api_key))
    }

    /// Set a custom base URL (for Azure, proxies, etc.).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Use a preconfigured HTTP client (timeouts, proxies).
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http_client = client;
        self
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Chat completion.
    ///
    /// Send messages to the chat completion API and get a response.
    pub async fn chat_completion(&self, request: ChatRequest) -> Result<ChatResponse> {
        let start = std::time::Instant::now();
        let body = serde_json::to_value(&request)
            .map_err(|e| OpenAIError::Parse(format!("Failed to serialize request: {}", e)))?;
        let response = self.post_chat_completions(&body).await?;

        let chat_response: types::ChatResponseRaw = serde_json::from_value(response)
            .map_err(|e| OpenAIError::Parse(e.to_string()))?;

        let content = chat_response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content.unwrap_or_default())
            .ok_or_else(|| OpenAIError::Api {
                status: 200,
                message: "No response from OpenAI".into(),
            })?;

        debug!(
            model = %request.model,
            duration_ms = start.elapsed().as_millis(),
            "OpenAI chat completion"
        );

        Ok(ChatResponse {
            content,
            usage: chat_response.usage,
        })
    }

    /// Function calling (tool use).
    ///
    /// Send messages with tool definitions and get tool calls or content back.
    pub async fn function_calling(&self, request: FunctionRequest) -> Result<FunctionResponse> {
        let start = std::time::Instant::now();
        let body = serde_json::to_value(&request)
            .map_err(|e| OpenAIError::Parse(format!("Failed to serialize request: {}", e)))?;
        let response = self.post_chat_completions(&body).await?;

        let parsed = FunctionResponse::from_response_json(&response)
            .ok_or_else(|| OpenAIError::Parse("No message in response".into()))?;

        debug!(
            model = %request.model,
            tool_calls = parsed.tool_calls.len(),
            duration_ms = start.elapsed().as_millis(),
            "OpenAI function calling"
        );

        Ok(parsed)
    }

    async fn post_chat_completions(&self, body: &serde_json::Value) -> Result<serde_json::Value> {
        let response = self
            .http_client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "OpenAI request failed");
                OpenAIError::Network(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!(status = %status, error = %error_text, "OpenAI API error");
            return Err(OpenAIError::Api {
                status: status.as_u16(),
                message: format!("OpenAI API error: {}", error_text),
            });
        }

        response
            .json()
            .await
            .map_err(|e| OpenAIError::Parse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, routing::post, Json, Router};

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[test]
    fn test_client_builder() {
        let client = OpenAIClient::new("sk-test").with_base_url("https://custom.api.com/");

        assert_eq!(client.api_key, "sk-test");
        assert_eq!(client.base_url(), "https://custom.api.com");
    }

    #[test]
    fn test_debug_redacts_key() {
        let client = OpenAIClient::new("sk-super-secret");
        let debug = format!("{:?}", client);
        assert!(!debug.contains("sk-super"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[tokio::test]
    async fn test_chat_completion_against_stub() {
        let app = Router::new().route(
            "/chat/completions",
            post(|Json(body): Json<serde_json::Value>| async move {
                assert_eq!(body["model"], "gpt-4o-mini");
                Json(serde_json::json!({
                    "choices": [{ "message": { "role": "assistant", "content": "pong" } }],
                    "usage": { "prompt_tokens": 3, "completion_tokens": 1, "total_tokens": 4 }
                }))
            }),
        );
        let base = serve(app).await;
        let client = OpenAIClient::new("sk-test").with_base_url(base);

        let response = client
            .chat_completion(ChatRequest::new("gpt-4o-mini").message(Message::user("ping")))
            .await
            .unwrap();

        assert_eq!(response.content, "pong");
        assert_eq!(response.usage.unwrap().total_tokens, 4);
    }

    #[tokio::test]
    async fn test_function_calling_against_stub() {
        let app = Router::new().route(
            "/chat/completions",
            post(|Json(body): Json<serde_json::Value>| async move {
                assert_eq!(body["tool_choice"], "auto");
                Json(serde_json::json!({
                    "choices": [{ "message": {
                        "role": "assistant",
                        "content": null,
                        "tool_calls": [{
                            "id": "call_9",
                            "type": "function",
                            "function": { "name": "web_search", "arguments": "{\"query\":\"rust\"}" }
                        }]
                    } }]
                }))
            }),
        );
        let base = serve(app).await;
        let client = OpenAIClient::new("sk-test").with_base_url(base);

        #[derive(serde::Deserialize, schemars::JsonSchema)]
        struct SearchArgs {
            query: String,
        }
        let tool = ToolDefinition::for_args::<SearchArgs>("web_search", "Search the web");
        let request = FunctionRequest::new("gpt-4o-mini", vec![Message::user("hi").to_value()], &[tool]);

        let response = client.function_calling(request).await.unwrap();
        assert_eq!(response.tool_calls.len(), 1);
        let args: SearchArgs = response.tool_calls[0].parse_args().unwrap();
        assert_eq!(args.query, "rust");
    }

    #[tokio::test]
    async fn test_api_error_status_is_kept() {
        let app = Router::new().route(
            "/chat/completions",
            post(|| async { (StatusCode::TOO_MANY_REQUESTS, "slow down") }),
        );
        let base = serve(app).await;
        let client = OpenAIClient::new("sk-test").with_base_url(base);

        let err = client
            .chat_completion(ChatRequest::new("gpt-4o-mini").message(Message::user("ping")))
            .await
            .unwrap_err();

        assert!(err.is_rate_limited());
    }
}
