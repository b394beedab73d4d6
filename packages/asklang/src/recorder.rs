//! Per-turn log of search invocations and the allowed-URL set derived from it.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::traits::searcher::SearchResult;
use crate::urls::{is_absolute_http_url, normalize_url};

/// One search call made during a turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocation {
    /// The query the model chose.
    pub query: String,

    /// Result URLs in ranking order.
    pub result_urls: Vec<String>,

    /// Result snippets, aligned with `result_urls` where available.
    pub result_snippets: Vec<String>,
}

impl ToolInvocation {
    /// Create an invocation with no results.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            result_urls: Vec::new(),
            result_snippets: Vec::new(),
        }
    }

    /// Build an invocation from search results, keeping only http(s) URLs.
    pub fn from_results(query: impl Into<String>, results: &[SearchResult]) -> Self {
        let mut invocation = Self::new(query);
        for result in results {
            let url = result.url.as_str();
            if !is_absolute_http_url(url) {
                debug!(url = %url, "Skipping non-http search result");
                continue;
            }
            invocation.result_urls.push(url.to_string());
            invocation
                .result_snippets
                .push(result.snippet.clone().unwrap_or_default());
        }
        invocation
    }

    /// Add a result URL.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.result_urls.push(url.into());
        self
    }
}

/// URLs a grounded answer may cite: every URL surfaced by a search this turn.
///
/// Keys are normalized URLs; values are the URL as first recorded. Iteration
/// follows first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowedUrlSet {
    urls: IndexMap<String, String>,
}

impl AllowedUrlSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a URL; returns false if an equivalent URL was already present.
    fn insert(&mut self, url: &str) -> bool {
        let key = normalize_url(url);
        if self.urls.contains_key(&key) {
            return false;
        }
        self.urls.insert(key, url.to_string());
        true
    }

    /// Membership under normalization.
    pub fn contains(&self, url: &str) -> bool {
        self.urls.contains_key(&normalize_url(url))
    }

    /// The recorded spelling of the member equivalent to `url`, if any.
    pub fn resolve(&self, url: &str) -> Option<&str> {
        self.urls.get(&normalize_url(url)).map(|s| s.as_str())
    }

    /// URLs in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.urls.values().map(|s| s.as_str())
    }

    /// The first `n` URLs in first-seen order.
    pub fn first(&self, n: usize) -> Vec<String> {
        self.iter().take(n).map(|s| s.to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}

impl<S: AsRef<str>> FromIterator<S> for AllowedUrlSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = Self::new();
        for url in iter {
            set.insert(url.as_ref());
        }
        set
    }
}

/// Records the search invocations of one turn.
///
/// The orchestrator creates one per turn, so nothing recorded in one turn
/// can ground another.
#[derive(Debug, Default)]
pub struct ToolRunRecorder {
    invocations: Vec<ToolInvocation>,
}

impl ToolRunRecorder {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an invocation to the log.
    pub fn record(&mut self, invocation: ToolInvocation) {
        debug!(
            query = %invocation.query,
            result_count = invocation.result_urls.len(),
            "Recorded search invocation"
        );
        self.invocations.push(invocation);
    }

    /// Deduplicated union of all recorded result URLs, first-seen order.
    pub fn allowed_urls(&self) -> AllowedUrlSet {
        self.invocations
            .iter()
            .flat_map(|inv| inv.result_urls.iter())
            .collect()
    }

    /// Drop everything recorded so far.
    pub fn reset(&mut self) {
        self.invocations.clear();
    }

    pub fn invocations(&self) -> &[ToolInvocation] {
        &self.invocations
    }

    pub fn len(&self) -> usize {
        self.invocations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.invocations.is_empty()
    }
}
