//! Search-Augmented Answers With Grounded Citations
//!
//! A conversational agent core: the model may call a web search tool any
//! number of times during a turn, and the final answer's sources are
//! guaranteed to come from URLs those searches actually returned.
//!
//! # Design Philosophy
//!
//! - Citations are checked, not trusted
//! - All turn state is local to the turn
//! - Model and search are collaborators behind traits, chosen at construction
//! - Configuration is an explicit value, never ambient
//!
//! # Usage
//!
//! ```rust,ignore
//! use asklang::{AgentConfig, ConversationTurn, Orchestrator};
//! use asklang::testing::{MockWebSearcher, ScriptedModel};
//!
//! let model = ScriptedModel::new()
//!     .then_search("world cup 2022 winner")
//!     .then_answer("Argentina.\n\nSources:\n- https://a.example/wc2022");
//! let searcher = MockWebSearcher::new()
//!     .with_urls("world cup 2022 winner", &["https://a.example/wc2022"]);
//!
//! let orchestrator = Orchestrator::new(model, searcher, AgentConfig::default());
//! let answer = orchestrator
//!     .run_turn(vec![ConversationTurn::user("Who won?")], "facts", "gpt-4o-mini")
//!     .await?;
//! assert_eq!(answer.sources, vec!["https://a.example/wc2022"]);
//! ```
//!
//! # Modules
//!
//! - [`urls`] - URL extraction and normalization
//! - [`recorder`] - Per-turn record of search results and the allowed-URL set
//! - [`grounding`] - Citation grounding and sources rendering
//! - [`mode`] - Answer modes and system preambles
//! - [`orchestrator`] - The turn state machine
//! - [`traits`] - Model, search and fetch collaborator traits
//! - [`searchers`] / [`models`] - Tavily and OpenAI backends
//! - [`summarize`] - Single-page summarization
//! - [`testing`] - Mock implementations for testing

pub mod config;
pub mod error;
pub mod grounding;
pub mod mode;
pub mod models;
pub mod orchestrator;
pub mod recorder;
pub mod searchers;
pub mod security;
pub mod summarize;
pub mod testing;
pub mod traits;
pub mod types;
pub mod urls;

// Re-export core types at crate root
pub use config::{AgentConfig, Settings};
pub use error::{
    CollaboratorError, CollaboratorResult, ConfigError, SummarizeError, TurnError, TurnResult,
    UnknownModeError,
};
pub use grounding::{ground, render_sources, GroundedAnswer, GroundingConfig, RawAnswer};
pub use mode::{preamble_for, AnswerMode};
pub use orchestrator::{search_tool_spec, Orchestrator, SEARCH_TOOL_NAME};
pub use recorder::{AllowedUrlSet, ToolInvocation, ToolRunRecorder};
pub use searchers::TavilyWebSearcher;
pub use security::SecretString;
pub use summarize::{HttpPageFetcher, PageSummary, Summarizer};
pub use traits::{
    fetcher::PageFetcher,
    model::ChatModel,
    searcher::{SearchResult, WebSearcher},
};
pub use types::{ChatMessage, ConversationTurn, ModelDecision, Role, SearchCall, ToolSpec};
pub use urls::{extract_urls, normalize_url};

#[cfg(feature = "openai")]
pub use models::OpenAiChatModel;
