//! Typed errors for the grounded search agent.
//!
//! Uses `thiserror` for library errors (not `anyhow`) to provide
//! strongly-typed, composable error handling.

use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The caller asked for an answer mode outside `facts` / `summary` / `links`.
///
/// This is a programmer error: callers validate the mode before a turn runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown answer mode {mode:?} (expected one of: facts, summary, links)")]
pub struct UnknownModeError {
    /// The rejected input, verbatim.
    pub mode: String,
}

/// Failures reported by the model, search or fetch collaborators.
#[derive(Debug, Error)]
pub enum CollaboratorError {
    /// Model call failed (network, API, decoding)
    #[error("model error: {0}")]
    Model(#[source] BoxError),

    /// Search call failed
    #[error("search error: {0}")]
    Search(#[source] BoxError),

    /// Page fetch failed
    #[error("fetch error: {0}")]
    Fetch(#[source] BoxError),

    /// The collaborator answered with something the protocol does not allow
    #[error("protocol error: {0}")]
    Protocol(String),
}

impl CollaboratorError {
    /// Wrap any error as a model failure.
    pub fn model(err: impl Into<BoxError>) -> Self {
        Self::Model(err.into())
    }

    /// Wrap any error as a search failure.
    pub fn search(err: impl Into<BoxError>) -> Self {
        Self::Search(err.into())
    }

    /// Wrap any error as a fetch failure.
    pub fn fetch(err: impl Into<BoxError>) -> Self {
        Self::Fetch(err.into())
    }
}

/// Errors that end a turn. A turn either returns a grounded answer or one of these.
#[derive(Debug, Error)]
pub enum TurnError {
    /// Mode outside the fixed enumeration
    #[error(transparent)]
    UnknownMode(#[from] UnknownModeError),

    /// The model kept requesting searches past the configured cap
    #[error("tool loop exceeded {max_rounds} search rounds without a final answer")]
    ToolLoopExceeded { max_rounds: usize },

    /// A model or search call failed; the cause is attached
    #[error("turn failed: {0}")]
    TurnFailed(#[from] CollaboratorError),
}

/// Errors from the single-page summarization path.
#[derive(Debug, Error)]
pub enum SummarizeError {
    /// Input is not an absolute http(s) URL
    #[error("invalid URL: {url}")]
    InvalidUrl { url: String },

    /// The page fetched fine but yielded no text
    #[error("no readable content at {url}")]
    EmptyPage { url: String },

    /// Fetch or model call failed
    #[error("summarization failed: {0}")]
    Failed(#[from] CollaboratorError),
}

/// Configuration errors, raised before any turn runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A required variable is missing or blank
    #[error("missing environment variable: {0}")]
    Missing(String),

    /// A variable is present but unparseable
    #[error("invalid value for {var}: {value:?}")]
    Invalid { var: String, value: String },
}

/// Result type alias for turn execution.
pub type TurnResult<T> = std::result::Result<T, TurnError>;

/// Result type alias for collaborator calls.
pub type CollaboratorResult<T> = std::result::Result<T, CollaboratorError>;
