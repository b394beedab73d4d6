//! OpenAI implementation of the `ChatModel` trait.
//!
//! Maps the turn transcript onto OpenAI function calling: search requests
//! become assistant `tool_calls`, search output becomes `tool` messages.
//!
//! # Example
//!
//! ```rust,ignore
//! use asklang::models::OpenAiChatModel;
//!
//! let model = OpenAiChatModel::new("sk-...").with_temperature(Some(0.0));
//! let orchestrator = Orchestrator::new(model, searcher, AgentConfig::default());
//! ```

use async_trait::async_trait;
use openai_client::{FunctionRequest, OpenAIClient, ToolCall, ToolDefinition};
use tracing::{debug, warn};

use crate::error::{CollaboratorError, CollaboratorResult};
use crate::orchestrator::SearchToolArgs;
use crate::security::SecretString;
use crate::traits::model::ChatModel;
use crate::types::{ChatMessage, ModelDecision, SearchCall, ToolSpec};

/// OpenAI-based model collaborator.
#[derive(Clone, Debug)]
pub struct OpenAiChatModel {
    client: OpenAIClient,
    temperature: Option<f32>,
}

impl OpenAiChatModel {
    /// Create a new model collaborator with the given API key.
    pub fn new(api_key: impl Into<SecretString>) -> Self {
        let api_key: SecretString = api_key.into();
        Self {
            client: OpenAIClient::new(api_key.expose()),
            temperature: Some(0.0),
        }
    }

    /// Wrap an already configured client.
    pub fn from_client(client: OpenAIClient) -> Self {
        Self {
            client,
            temperature: Some(0.0),
        }
    }

    /// Set a custom base URL (for Azure, proxies, etc.).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.client = self.client.with_base_url(url);
        self
    }

    /// Sampling temperature (default 0).
    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }
}

/// Convert the transcript to OpenAI message values.
pub(crate) fn to_openai_messages(messages: &[ChatMessage]) -> Vec<serde_json::Value> {
    messages
        .iter()
        .map(|message| match message {
            ChatMessage::System { content } => {
                serde_json::json!({ "role": "system", "content": content })
            }
            ChatMessage::User { content } => {
                serde_json::json!({ "role": "user", "content": content })
            }
            ChatMessage::Assistant { content } => {
                serde_json::json!({ "role": "assistant", "content": content })
            }
            ChatMessage::SearchRequested { calls } => {
                let tool_calls: Vec<serde_json::Value> = calls
                    .iter()
                    .map(|call| {
                        ToolCall {
                            id: call.id.clone(),
                            name: crate::orchestrator::SEARCH_TOOL_NAME.to_string(),
                            arguments: serde_json::json!({ "query": call.query }).to_string(),
                        }
                        .to_openai_value()
                    })
                    .collect();
                serde_json::json!({
                    "role": "assistant",
                    "content": null,
                    "tool_calls": tool_calls
                })
            }
            ChatMessage::SearchOutput { call_id, content } => {
                serde_json::json!({
                    "role": "tool",
                    "tool_call_id": call_id,
                    "content": content
                })
            }
        })
        .collect()
}

/// Turn OpenAI tool calls into search calls, rejecting anything not offered.
pub(crate) fn to_search_calls(
    tool_calls: &[ToolCall],
    tools: &[ToolSpec],
) -> CollaboratorResult<Vec<SearchCall>> {
    tool_calls
        .iter()
        .map(|call| {
            if !tools.iter().any(|t| t.name == call.name) {
                warn!(tool = %call.name, "Model requested a tool that was not offered");
                return Err(CollaboratorError::Protocol(format!(
                    "model requested unknown tool '{}'",
                    call.name
                )));
            }
            let args: SearchToolArgs = call.parse_args().map_err(|e| {
                CollaboratorError::Protocol(format!(
                    "invalid arguments for '{}': {}",
                    call.name, e
                ))
            })?;
            Ok(SearchCall::new(call.id.clone(), args.query))
        })
        .collect()
}

#[async_trait]
impl ChatModel for OpenAiChatModel {
    async fn decide(
        &self,
        model: &str,
        messages: &[ChatMessage],
        tools: &[ToolSpec],
    ) -> CollaboratorResult<ModelDecision> {
        let definitions: Vec<ToolDefinition> = tools
            .iter()
            .map(|t| ToolDefinition {
                name: t.name.clone(),
                description: t.description.clone(),
                parameters: t.parameters.clone(),
            })
            .collect();

        let mut request = FunctionRequest::new(model, to_openai_messages(messages), &definitions);
        if let Some(temperature) = self.temperature {
            request = request.temperature(temperature);
        }

        let response = self
            .client
            .function_calling(request)
            .await
            .map_err(CollaboratorError::model)?;

        if response.wants_tools() {
            debug!(
                model = %model,
                tool_calls = response.tool_calls.len(),
                "OpenAI requested tool calls"
            );
            return to_search_calls(&response.tool_calls, tools).map(ModelDecision::Search);
        }

        Ok(ModelDecision::Final(response.content.unwrap_or_default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::search_tool_spec;
    use axum::{routing::post, Json, Router};

    #[test]
    fn test_transcript_mapping() {
        let messages = vec![
            ChatMessage::System {
                content: "preamble".to_string(),
            },
            ChatMessage::User {
                content: "Who won?".to_string(),
            },
            ChatMessage::SearchRequested {
                calls: vec![SearchCall::new("call_1", "world cup 2022 winner")],
            },
            ChatMessage::SearchOutput {
                call_id: "call_1".to_string(),
                content: "[]".to_string(),
            },
        ];

        let values = to_openai_messages(&messages);

        assert_eq!(values[0]["role"], "system");
        assert_eq!(values[2]["tool_calls"][0]["function"]["name"], "web_search");
        let args: serde_json::Value = serde_json::from_str(
            values[2]["tool_calls"][0]["function"]["arguments"].as_str().unwrap(),
        )
        .unwrap();
        assert_eq!(args["query"], "world cup 2022 winner");
        assert_eq!(values[3]["role"], "tool");
        assert_eq!(values[3]["tool_call_id"], "call_1");
    }

    #[test]
    fn test_unknown_tool_is_protocol_error() {
        let calls = vec![ToolCall {
            id: "c".to_string(),
            name: "delete_everything".to_string(),
            arguments: "{}".to_string(),
        }];
        let err = to_search_calls(&calls, &[search_tool_spec()]).unwrap_err();
        assert!(matches!(err, CollaboratorError::Protocol(_)));
    }

    #[test]
    fn test_bad_arguments_are_protocol_error() {
        let calls = vec![ToolCall {
            id: "c".to_string(),
            name: "web_search".to_string(),
            arguments: "{\"q\": 1}".to_string(),
        }];
        let err = to_search_calls(&calls, &[search_tool_spec()]).unwrap_err();
        assert!(matches!(err, CollaboratorError::Protocol(_)));
    }

    #[tokio::test]
    async fn test_decide_against_stub() {
        let app = Router::new().route(
            "/chat/completions",
            post(|Json(body): Json<serde_json::Value>| async move {
                let has_tool_output = body["messages"]
                    .as_array()
                    .unwrap()
                    .iter()
                    .any(|m| m["role"] == "tool");
                let message = if has_tool_output {
                    serde_json::json!({ "role": "assistant", "content": "Argentina." })
                } else {
                    serde_json::json!({
                        "role": "assistant",
                        "content": null,
                        "tool_calls": [{
                            "id": "call_1",
                            "type": "function",
                            "function": { "name": "web_search", "arguments": "{\"query\":\"wc 2022\"}" }
                        }]
                    })
                };
                Json(serde_json::json!({ "choices": [{ "message": message }] }))
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let model = OpenAiChatModel::new("sk-test").with_base_url(format!("http://{addr}"));
        let tools = vec![search_tool_spec()];
        let mut messages = vec![ChatMessage::User {
            content: "Who won?".to_string(),
        }];

        let first = model.decide("gpt-4o-mini", &messages, &tools).await.unwrap();
        let calls = match first {
            ModelDecision::Search(calls) => calls,
            other => panic!("expected a search, got {other:?}"),
        };
        assert_eq!(calls[0].query, "wc 2022");

        messages.push(ChatMessage::SearchRequested {
            calls: calls.clone(),
        });
        messages.push(ChatMessage::SearchOutput {
            call_id: calls[0].id.clone(),
            content: "[]".to_string(),
        });
        let second = model.decide("gpt-4o-mini", &messages, &tools).await.unwrap();
        assert_eq!(second, ModelDecision::Final("Argentina.".to_string()));
    }
}
