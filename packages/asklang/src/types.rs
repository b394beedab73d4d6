//! Conversation and transcript types shared by the orchestrator and collaborators.

use serde::{Deserialize, Serialize};

/// Who authored a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::System => "system",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One message of the caller's chat history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
}

impl ConversationTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }
}

/// A search the model asked for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchCall {
    /// Correlates the call with its result message.
    pub id: String,

    /// Free-text query chosen by the model.
    pub query: String,
}

impl SearchCall {
    pub fn new(id: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            query: query.into(),
        }
    }
}

/// One entry of the transcript sent to the model during a turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChatMessage {
    System { content: String },
    User { content: String },
    Assistant { content: String },
    /// The model's request for one or more searches.
    SearchRequested { calls: Vec<SearchCall> },
    /// Output of one search, serialized for the model.
    SearchOutput { call_id: String, content: String },
}

impl ChatMessage {
    /// True for system messages whose content contains `needle`.
    pub fn is_system_containing(&self, needle: &str) -> bool {
        matches!(self, Self::System { content } if content.contains(needle))
    }
}

impl From<ConversationTurn> for ChatMessage {
    fn from(turn: ConversationTurn) -> Self {
        match turn.role {
            Role::User => Self::User {
                content: turn.content,
            },
            Role::Assistant => Self::Assistant {
                content: turn.content,
            },
            Role::System => Self::System {
                content: turn.content,
            },
        }
    }
}

/// A tool the model may call, described to the model collaborator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    /// JSON schema of the tool arguments.
    pub parameters: serde_json::Value,
}

/// What the model decided to do next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelDecision {
    /// Run these searches (one at a time) and ask again.
    Search(Vec<SearchCall>),
    /// The final answer text.
    Final(String),
}
