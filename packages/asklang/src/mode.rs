//! Answer modes and the system preamble each one selects.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::UnknownModeError;

/// Base instruction shared by every mode.
pub const BASE_PREAMBLE: &str = "You are a helpful research assistant. \
When a question likely requires up-to-date information or verification, \
use the web search tool first. Synthesize findings and, when you used search, \
append a short 'Sources:' section with 1-3 direct URLs. Keep answers concise.";

/// How the answer should be shaped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerMode {
    /// Short factual answer followed by sources.
    Facts,
    /// Paragraph-style summary followed by sources.
    Summary,
    /// One sentence plus a bulleted source list.
    Links,
}

impl AnswerMode {
    pub const ALL: [AnswerMode; 3] = [Self::Facts, Self::Summary, Self::Links];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Facts => "facts",
            Self::Summary => "summary",
            Self::Links => "links",
        }
    }

    fn hint(&self) -> &'static str {
        match self {
            Self::Facts => "Write a short, factual answer followed by Sources.",
            Self::Summary => "Write a concise paragraph-style summary followed by Sources.",
            Self::Links => {
                "Do not elaborate; return a one-sentence answer and a bulleted Sources list."
            }
        }
    }

    /// Full system preamble for this mode.
    pub fn preamble(&self) -> String {
        format!("{} {}", BASE_PREAMBLE, self.hint())
    }
}

impl Default for AnswerMode {
    fn default() -> Self {
        Self::Facts
    }
}

impl fmt::Display for AnswerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnswerMode {
    type Err = UnknownModeError;

    /// Exact, case-sensitive match on `facts`, `summary`, `links`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "facts" => Ok(Self::Facts),
            "summary" => Ok(Self::Summary),
            "links" => Ok(Self::Links),
            other => Err(UnknownModeError {
                mode: other.to_string(),
            }),
        }
    }
}

/// Preamble for a mode given by name.
pub fn preamble_for(mode: &str) -> Result<String, UnknownModeError> {
    mode.parse::<AnswerMode>().map(|m| m.preamble())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defined_modes_succeed() {
        for mode in AnswerMode::ALL {
            let preamble = preamble_for(mode.as_str()).unwrap();
            assert!(preamble.starts_with(BASE_PREAMBLE));
        }
    }

    #[test]
    fn test_modes_have_distinct_hints() {
        let facts = preamble_for("facts").unwrap();
        let summary = preamble_for("summary").unwrap();
        let links = preamble_for("links").unwrap();

        assert_ne!(facts, summary);
        assert_ne!(summary, links);
        assert!(links.contains("bulleted Sources list"));
    }

    #[test]
    fn test_everything_else_is_rejected() {
        for bad in ["", "Facts", "SUMMARY", "Links", " facts", "facts ", "bullets"] {
            let err = preamble_for(bad).unwrap_err();
            assert_eq!(err.mode, bad);
        }
    }

    #[test]
    fn test_display_round_trips() {
        for mode in AnswerMode::ALL {
            assert_eq!(mode.to_string().parse::<AnswerMode>().unwrap(), mode);
        }
    }
}
