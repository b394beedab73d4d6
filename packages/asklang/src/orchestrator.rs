//! Agent orchestrator: drives one search-augmented turn.
//!
//! A turn goes Start -> Deciding -> (Searching -> Deciding)* -> Finalizing.
//! All turn state (transcript, recorder) lives on the stack of
//! [`Orchestrator::run_turn`], so one orchestrator can serve many sessions
//! concurrently and an abandoned turn leaves nothing behind.
//!
//! # Example
//!
//! ```rust,ignore
//! let orchestrator = Orchestrator::new(model, TavilyWebSearcher::new(key), AgentConfig::default());
//! let answer = orchestrator
//!     .run_turn(vec![ConversationTurn::user("Who won the 2022 World Cup?")], "facts", "gpt-4o-mini")
//!     .await?;
//! println!("{}\n\n{}", answer.body_text, answer.sources_markdown());
//! ```

use schemars::{schema_for, JsonSchema};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::config::AgentConfig;
use crate::error::{CollaboratorError, TurnError, TurnResult};
use crate::grounding::{ground, GroundedAnswer, RawAnswer};
use crate::mode::AnswerMode;
use crate::recorder::{ToolInvocation, ToolRunRecorder};
use crate::traits::model::ChatModel;
use crate::traits::searcher::{SearchResult, WebSearcher};
use crate::types::{ChatMessage, ConversationTurn, ModelDecision, Role, ToolSpec};
use crate::urls::is_absolute_http_url;

/// Name of the search tool offered to the model.
pub const SEARCH_TOOL_NAME: &str = "web_search";

/// Arguments of the search tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SearchToolArgs {
    /// Free-text web search query.
    pub query: String,
}

/// Tool spec for the web search capability.
pub fn search_tool_spec() -> ToolSpec {
    let mut parameters = serde_json::to_value(schema_for!(SearchToolArgs)).unwrap_or_default();
    if let serde_json::Value::Object(map) = &mut parameters {
        map.remove("$schema");
        map.remove("title");
        map.insert(
            "additionalProperties".to_string(),
            serde_json::Value::Bool(false),
        );
    }
    ToolSpec {
        name: SEARCH_TOOL_NAME.to_string(),
        description: "Search the web for up-to-date information. Returns result URLs, titles and snippets."
            .to_string(),
        parameters,
    }
}

/// Runs turns against a model and a search backend.
pub struct Orchestrator<M, S> {
    model: M,
    searcher: S,
    config: AgentConfig,
}

impl<M: ChatModel, S: WebSearcher> Orchestrator<M, S> {
    pub fn new(model: M, searcher: S, config: AgentConfig) -> Self {
        Self {
            model,
            searcher,
            config,
        }
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn searcher(&self) -> &S {
        &self.searcher
    }

    /// Run one turn. `mode` must be `facts`, `summary` or `links`.
    ///
    /// An empty `model_identifier` selects the configured default model.
    pub async fn run_turn(
        &self,
        history: Vec<ConversationTurn>,
        mode: &str,
        model_identifier: &str,
    ) -> TurnResult<GroundedAnswer> {
        let mode: AnswerMode = mode.parse()?;
        self.run_turn_with_mode(history, mode, model_identifier)
            .await
    }

    /// Run one turn with an already validated mode.
    pub async fn run_turn_with_mode(
        &self,
        history: Vec<ConversationTurn>,
        mode: AnswerMode,
        model_identifier: &str,
    ) -> TurnResult<GroundedAnswer> {
        let model = if model_identifier.trim().is_empty() {
            self.config.default_model.as_str()
        } else {
            model_identifier
        };

        info!(
            mode = %mode,
            model = %model,
            history_len = history.len(),
            "Turn starting"
        );

        let mut messages = build_messages(history, &mode.preamble());
        let tools = [search_tool_spec()];
        let mut recorder = ToolRunRecorder::new();
        let mut search_rounds = 0usize;
        let mut decisions = 0usize;

        loop {
            decisions += 1;
            debug!(
                decision = decisions,
                message_count = messages.len(),
                "Asking model for next step"
            );

            let decision = self
                .model
                .decide(model, &messages, &tools)
                .await
                .map_err(|e| {
                    warn!(error = %e, decision = decisions, "Model call failed");
                    TurnError::TurnFailed(e)
                })?;

            let calls = match decision {
                ModelDecision::Final(text) => {
                    let raw = RawAnswer::new(text);
                    let allowed = recorder.allowed_urls();
                    let mut answer = ground(&raw, &allowed, &self.config.grounding());
                    answer.searches = recorder.len();
                    answer.rounds = decisions;

                    info!(
                        rounds = decisions,
                        searches = answer.searches,
                        allowed = allowed.len(),
                        sources = answer.sources.len(),
                        fallback_used = answer.fallback_used,
                        "Turn finished"
                    );
                    return Ok(answer);
                }
                ModelDecision::Search(calls) => calls,
            };

            if calls.is_empty() {
                return Err(TurnError::TurnFailed(CollaboratorError::Protocol(
                    "model requested a search without any query".to_string(),
                )));
            }

            if search_rounds >= self.config.max_rounds {
                warn!(
                    max_rounds = self.config.max_rounds,
                    searches = recorder.len(),
                    "Model kept searching past the round cap"
                );
                return Err(TurnError::ToolLoopExceeded {
                    max_rounds: self.config.max_rounds,
                });
            }
            search_rounds += 1;

            messages.push(ChatMessage::SearchRequested {
                calls: calls.clone(),
            });

            for call in calls {
                info!(round = search_rounds, query = %call.query, "Executing search");

                let results = self
                    .searcher
                    .search_with_limit(&call.query, self.config.search_results)
                    .await
                    .map_err(|e| {
                        warn!(query = %call.query, error = %e, "Search failed");
                        TurnError::TurnFailed(e)
                    })?;

                let content = search_output(&results);
                recorder.record(ToolInvocation::from_results(call.query.as_str(), &results));

                debug!(
                    query = %call.query,
                    result_count = results.len(),
                    output_preview = %truncate_for_log(&content, 200),
                    "Search complete"
                );

                messages.push(ChatMessage::SearchOutput {
                    call_id: call.id,
                    content,
                });
            }
        }
    }

    /// Summarize a conversation by running a turn over a flattened transcript.
    pub async fn summarize_conversation(
        &self,
        history: &[ConversationTurn],
        model_identifier: &str,
    ) -> TurnResult<GroundedAnswer> {
        let transcript = history
            .iter()
            .map(|turn| format!("{}: {}", turn.role, turn.content))
            .collect::<Vec<_>>()
            .join("\n");
        let prompt = format!("Summarize this conversation:\n{transcript}");

        self.run_turn_with_mode(
            vec![ConversationTurn::user(prompt)],
            AnswerMode::Summary,
            model_identifier,
        )
        .await
    }
}

#[cfg(feature = "openai")]
impl Orchestrator<crate::models::OpenAiChatModel, crate::searchers::TavilyWebSearcher> {
    /// OpenAI model plus Tavily search, configured from [`Settings`].
    ///
    /// [`Settings`]: crate::config::Settings
    pub fn from_settings(settings: &crate::config::Settings) -> Self {
        let mut model = crate::models::OpenAiChatModel::new(settings.openai_api_key.clone())
            .with_temperature(settings.agent.temperature);
        if let Some(base_url) = &settings.openai_base_url {
            model = model.with_base_url(base_url.clone());
        }
        let searcher = crate::searchers::TavilyWebSearcher::new(settings.tavily_api_key.clone())
            .with_default_limit(settings.agent.search_results);

        Self::new(model, searcher, settings.agent.clone())
    }
}

/// Preamble as a system message, then the history.
///
/// A history that already opens with this preamble is left alone.
fn build_messages(history: Vec<ConversationTurn>, preamble: &str) -> Vec<ChatMessage> {
    let already_present = history
        .first()
        .is_some_and(|t| t.role == Role::System && t.content.contains(preamble));

    let mut messages = Vec::with_capacity(history.len() + 1);
    if !already_present {
        messages.push(ChatMessage::System {
            content: preamble.to_string(),
        });
    }
    messages.extend(history.into_iter().map(ChatMessage::from));
    messages
}

/// Serialize search results for the model.
fn search_output(results: &[SearchResult]) -> String {
    let items: Vec<serde_json::Value> = results
        .iter()
        .filter(|r| is_absolute_http_url(r.url.as_str()))
        .map(|r| {
            serde_json::json!({
                "url": r.url.as_str(),
                "title": r.title,
                "snippet": r.snippet,
            })
        })
        .collect();
    serde_json::Value::Array(items).to_string()
}

/// Truncate a string for logging purposes.
fn truncate_for_log(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        return s.to_string();
    }
    let mut end = max_len;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...[truncated {} bytes]", &s[..end], s.len() - end)
}
