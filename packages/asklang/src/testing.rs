//! Testing utilities including mock implementations.
//!
//! These are useful for testing applications that use the agent without
//! making real model or network calls.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, RwLock};

use crate::error::{CollaboratorError, CollaboratorResult};
use crate::traits::{
    fetcher::PageFetcher,
    model::ChatModel,
    searcher::{SearchResult, WebSearcher},
};
use crate::types::{ChatMessage, ModelDecision, SearchCall, ToolSpec};

/// Record of a call made to a mock model.
#[derive(Debug, Clone)]
pub struct ModelCall {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub tool_names: Vec<String>,
}

impl ModelCall {
    fn new(model: &str, messages: &[ChatMessage], tools: &[ToolSpec]) -> Self {
        Self {
            model: model.to_string(),
            messages: messages.to_vec(),
            tool_names: tools.iter().map(|t| t.name.clone()).collect(),
        }
    }

    /// Content of the most recent user message.
    pub fn last_user_message(&self) -> Option<&str> {
        self.messages.iter().rev().find_map(|m| match m {
            ChatMessage::User { content } => Some(content.as_str()),
            _ => None,
        })
    }

    /// Number of search outputs the model had seen.
    pub fn search_outputs_seen(&self) -> usize {
        self.messages
            .iter()
            .filter(|m| matches!(m, ChatMessage::SearchOutput { .. }))
            .count()
    }
}

/// A model that plays back a fixed list of decisions.
///
/// Once the script runs out the model either keeps requesting the same
/// search (see [`ScriptedModel::searching_forever`]) or fails with a
/// protocol error.
#[derive(Default)]
pub struct ScriptedModel {
    /// Remaining decisions
    script: Arc<RwLock<VecDeque<ModelDecision>>>,

    /// Query to repeat after the script is exhausted
    loop_query: Option<String>,

    /// Ids handed out so far
    issued_ids: usize,

    /// Call tracking for assertions
    calls: Arc<RwLock<Vec<ModelCall>>>,
}

impl ScriptedModel {
    /// Create an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a raw decision.
    pub fn then(self, decision: ModelDecision) -> Self {
        self.script.write().unwrap().push_back(decision);
        self
    }

    /// Append a request for a single search.
    pub fn then_search(self, query: impl Into<String>) -> Self {
        self.then_searches([query])
    }

    /// Append a request for several searches in one decision.
    pub fn then_searches<I, S>(mut self, queries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let calls = queries
            .into_iter()
            .map(|q| {
                self.issued_ids += 1;
                SearchCall::new(format!("call_{}", self.issued_ids), q)
            })
            .collect();
        self.then(ModelDecision::Search(calls))
    }

    /// Append a final answer.
    pub fn then_answer(self, text: impl Into<String>) -> Self {
        self.then(ModelDecision::Final(text.into()))
    }

    /// After the script, keep asking for `query` forever.
    pub fn searching_forever(mut self, query: impl Into<String>) -> Self {
        self.loop_query = Some(query.into());
        self
    }

    /// Get all calls made to this mock.
    pub fn calls(&self) -> Vec<ModelCall> {
        self.calls.read().unwrap().clone()
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    async fn decide(
        &self,
        model: &str,
        messages: &[ChatMessage],
        tools: &[ToolSpec],
    ) -> CollaboratorResult<ModelDecision> {
        let call_number = {
            let mut calls = self.calls.write().unwrap();
            calls.push(ModelCall::new(model, messages, tools));
            calls.len()
        };

        if let Some(decision) = self.script.write().unwrap().pop_front() {
            return Ok(decision);
        }

        match &self.loop_query {
            Some(query) => Ok(ModelDecision::Search(vec![SearchCall::new(
                format!("loop_{call_number}"),
                query.clone(),
            )])),
            None => Err(CollaboratorError::Protocol(format!(
                "script exhausted at call {call_number}"
            ))),
        }
    }
}

/// A model that searches once for the latest user message, then answers
/// citing the first URL the search returned.
///
/// Stateless across calls, so one instance can serve concurrent turns.
#[derive(Debug, Default, Clone)]
pub struct CitingModel;

#[async_trait]
impl ChatModel for CitingModel {
    async fn decide(
        &self,
        _model: &str,
        messages: &[ChatMessage],
        _tools: &[ToolSpec],
    ) -> CollaboratorResult<ModelDecision> {
        let last_output = messages.iter().rev().find_map(|m| match m {
            ChatMessage::SearchOutput { content, .. } => Some(content.as_str()),
            _ => None,
        });

        let Some(output) = last_output else {
            let query = messages
                .iter()
                .rev()
                .find_map(|m| match m {
                    ChatMessage::User { content } => Some(content.clone()),
                    _ => None,
                })
                .unwrap_or_default();
            return Ok(ModelDecision::Search(vec![SearchCall::new("call_1", query)]));
        };

        let parsed: serde_json::Value = serde_json::from_str(output)
            .map_err(|e| CollaboratorError::Protocol(format!("bad search output: {e}")))?;
        let first_url = parsed[0]["url"].as_str().map(str::to_string);

        Ok(ModelDecision::Final(match first_url {
            Some(url) => format!("Here is what I found.\n\nSources:\n- {url}"),
            None => "I found nothing relevant.".to_string(),
        }))
    }
}

/// A mock web searcher for testing.
///
/// Returns predefined results by exact query; unknown queries return nothing.
#[derive(Default)]
pub struct MockWebSearcher {
    /// Predefined results by query
    results: Arc<RwLock<HashMap<String, Vec<SearchResult>>>>,

    /// Queries that should fail, with their error message
    failures: Arc<RwLock<HashMap<String, String>>>,

    /// Queries seen, in order
    queries: Arc<RwLock<Vec<String>>>,
}

impl MockWebSearcher {
    /// Create a new mock searcher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add results for a query.
    pub fn with_results(self, query: &str, results: Vec<SearchResult>) -> Self {
        self.results
            .write()
            .unwrap()
            .insert(query.to_string(), results);
        self
    }

    /// Add URL strings as results.
    pub fn with_urls(self, query: &str, urls: &[&str]) -> Self {
        let results: Vec<_> = urls
            .iter()
            .filter_map(|u| SearchResult::from_url(u))
            .collect();
        self.with_results(query, results)
    }

    /// Make a query fail with a search error.
    pub fn failing(self, query: &str, message: impl Into<String>) -> Self {
        self.failures
            .write()
            .unwrap()
            .insert(query.to_string(), message.into());
        self
    }

    /// Get all queries made to this mock.
    pub fn queries(&self) -> Vec<String> {
        self.queries.read().unwrap().clone()
    }
}

#[async_trait]
impl WebSearcher for MockWebSearcher {
    async fn search(&self, query: &str) -> CollaboratorResult<Vec<SearchResult>> {
        self.queries.write().unwrap().push(query.to_string());

        if let Some(message) = self.failures.read().unwrap().get(query) {
            return Err(CollaboratorError::search(message.clone()));
        }

        Ok(self
            .results
            .read()
            .unwrap()
            .get(query)
            .cloned()
            .unwrap_or_default())
    }
}

/// A mock page fetcher for testing.
#[derive(Default)]
pub struct MockPageFetcher {
    /// Predefined page text by URL
    pages: Arc<RwLock<HashMap<String, String>>>,

    /// URLs that should fail
    fail_urls: Arc<RwLock<Vec<String>>>,

    /// Call tracking
    fetched: Arc<RwLock<Vec<String>>>,
}

impl MockPageFetcher {
    /// Create a new mock fetcher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a predefined page.
    pub fn with_page(self, url: impl Into<String>, text: impl Into<String>) -> Self {
        self.pages.write().unwrap().insert(url.into(), text.into());
        self
    }

    /// Mark a URL as failing.
    pub fn fail_url(self, url: impl Into<String>) -> Self {
        self.fail_urls.write().unwrap().push(url.into());
        self
    }

    /// URLs fetched so far.
    pub fn fetched(&self) -> Vec<String> {
        self.fetched.read().unwrap().clone()
    }
}

#[async_trait]
impl PageFetcher for MockPageFetcher {
    async fn fetch_text(&self, url: &str) -> CollaboratorResult<String> {
        self.fetched.write().unwrap().push(url.to_string());

        if self.fail_urls.read().unwrap().iter().any(|u| u == url) {
            return Err(CollaboratorError::fetch(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "Mock connection refused",
            )));
        }

        self.pages
            .read()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| CollaboratorError::fetch(format!("Page not found: {url}")))
    }
}
