//! Citation grounding.
//!
//! Restricts an answer's sources to URLs surfaced by this turn's searches.
//! Grounding never fails: when nothing the model cited can be verified, it
//! falls back to the top recorded search results and says so.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use tracing::{debug, warn};

use crate::recorder::AllowedUrlSet;
use crate::urls::{extract_urls, host_label};

/// Default number of search URLs shown when the model's citations don't verify.
pub const DEFAULT_FALLBACK_SOURCES: usize = 3;

/// Start of a trailing sources section: a markdown heading, a bare or bold
/// label line, or an inline `Sources: ...` label.
static SOURCES_HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?im)^[ \t>]*(?:#{1,6}[ \t]*(?:\*\*|__)?[ \t]*(?:sources?|references?|citations?)\b|(?:\*\*|__)?(?:sources?|references?|citations?)[ \t]*(?:\*\*|__)?[ \t]*(?::|$))",
    )
    .expect("valid sources header regex")
});

/// The model's final answer for a turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawAnswer {
    pub text: String,
    /// URLs found in `text`, first-occurrence order.
    pub claimed_sources: Vec<String>,
}

impl RawAnswer {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let claimed_sources = extract_urls(&text);
        Self {
            text,
            claimed_sources,
        }
    }
}

/// Terminal output of a turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroundedAnswer {
    /// Answer text with any sources section removed.
    pub body_text: String,
    /// Sources to display; every entry is a member of the turn's allowed set.
    pub sources: Vec<String>,
    /// True when `sources` are the top search results rather than the model's citations.
    pub fallback_used: bool,
    /// Number of searches run during the turn.
    #[serde(default)]
    pub searches: usize,
    /// Number of model decisions made during the turn.
    #[serde(default)]
    pub rounds: usize,
}

impl GroundedAnswer {
    /// Markdown bullet list of the sources.
    pub fn sources_markdown(&self) -> String {
        render_sources(&self.sources)
    }
}

/// Grounding knobs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroundingConfig {
    /// How many recorded URLs to show when no citation verifies.
    pub fallback_sources: usize,
}

impl Default for GroundingConfig {
    fn default() -> Self {
        Self {
            fallback_sources: DEFAULT_FALLBACK_SOURCES,
        }
    }
}

/// Ground `raw` against the URLs this turn's searches returned.
pub fn ground(raw: &RawAnswer, allowed: &AllowedUrlSet, config: &GroundingConfig) -> GroundedAnswer {
    let body_text = strip_sources_section(&raw.text);

    if allowed.is_empty() {
        debug!(
            claimed = raw.claimed_sources.len(),
            "No searches this turn, answer carries no sources"
        );
        return GroundedAnswer {
            body_text,
            sources: Vec::new(),
            fallback_used: false,
            searches: 0,
            rounds: 0,
        };
    }

    let mut sources: Vec<String> = Vec::new();
    for candidate in &raw.claimed_sources {
        if let Some(recorded) = allowed.resolve(candidate) {
            if !sources.iter().any(|s| s == recorded) {
                sources.push(recorded.to_string());
            }
        }
    }

    if !sources.is_empty() {
        debug!(
            claimed = raw.claimed_sources.len(),
            grounded = sources.len(),
            "Citations grounded"
        );
        return GroundedAnswer {
            body_text,
            sources,
            fallback_used: false,
            searches: 0,
            rounds: 0,
        };
    }

    let sources = allowed.first(config.fallback_sources);
    warn!(
        claimed = raw.claimed_sources.len(),
        allowed = allowed.len(),
        fallback = sources.len(),
        "No citation matched this turn's search results, using top results"
    );
    GroundedAnswer {
        body_text,
        sources,
        fallback_used: true,
        searches: 0,
        rounds: 0,
    }
}

/// Remove a trailing "Sources"/"References"/"Citations" section.
///
/// Everything from the first header line to the end is dropped.
pub fn strip_sources_section(text: &str) -> String {
    match SOURCES_HEADER_RE.find(text) {
        Some(m) => text[..m.start()].trim_end().to_string(),
        None => text.trim_end().to_string(),
    }
}

/// Render sources as a markdown bullet list.
pub fn render_sources<S: AsRef<str>>(sources: &[S]) -> String {
    if sources.is_empty() {
        return "_No sources._".to_string();
    }
    sources
        .iter()
        .map(|u| format!("- [{}]({})", host_label(u.as_ref()), u.as_ref()))
        .collect::<Vec<_>>()
        .join("\n")
}
