//! Single-page summarization.
//!
//! Fetch one URL, reduce it to plain text, cap the size and ask the model
//! for a few bullet points. The page URL is the only source, so no
//! grounding step is needed.
//!
//! # Example
//!
//! ```rust,ignore
//! let summarizer = Summarizer::new(model, HttpPageFetcher::new());
//! let summary = summarizer.summarize_url("https://example.com/post", "gpt-4o-mini").await?;
//! ```

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use tracing::{debug, info, warn};

use crate::error::{CollaboratorError, CollaboratorResult, SummarizeError};
use crate::traits::fetcher::PageFetcher;
use crate::traits::model::ChatModel;
use crate::types::ChatMessage;
use crate::urls::is_absolute_http_url;

/// Hard cap on page characters sent to the model.
pub const DEFAULT_MAX_CHARS: usize = 12_000;

const SUMMARY_INSTRUCTIONS: &str = "You are a concise summarizer.\n\
Summarize the following web page into 3-5 bullet points. \
Capture key facts, dates, numbers, and named entities. \
Avoid speculation. Keep total length within ~120 words.";

/// Summary of one page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSummary {
    /// Markdown bullet summary.
    pub summary: String,
    /// Always exactly the summarized URL.
    pub sources: Vec<String>,
}

/// Summarizes single pages with a model and a fetcher.
pub struct Summarizer<M, F> {
    model: M,
    fetcher: F,
    max_chars: usize,
}

impl<M: ChatModel, F: PageFetcher> Summarizer<M, F> {
    pub fn new(model: M, fetcher: F) -> Self {
        Self {
            model,
            fetcher,
            max_chars: DEFAULT_MAX_CHARS,
        }
    }

    /// Override the page character cap.
    pub fn with_max_chars(mut self, max_chars: usize) -> Self {
        self.max_chars = max_chars;
        self
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    /// Fetch `url` and summarize it.
    pub async fn summarize_url(
        &self,
        url: &str,
        model_identifier: &str,
    ) -> Result<PageSummary, SummarizeError> {
        let url = url.trim();
        if !is_absolute_http_url(url) {
            return Err(SummarizeError::InvalidUrl {
                url: url.to_string(),
            });
        }

        info!(url = %url, model = %model_identifier, "Summarizing page");
        let text = self.fetcher.fetch_text(url).await.map_err(|e| {
            warn!(url = %url, error = %e, "Page fetch failed");
            SummarizeError::Failed(e)
        })?;

        if text.trim().is_empty() {
            return Err(SummarizeError::EmptyPage {
                url: url.to_string(),
            });
        }

        let text = truncate_chars(&text, self.max_chars);
        debug!(url = %url, chars = text.chars().count(), "Page text ready");

        let prompt = format!(
            "{SUMMARY_INSTRUCTIONS}\n\n=== PAGE TEXT START ===\n{text}\n=== PAGE TEXT END ==="
        );
        let summary = self
            .model
            .complete(model_identifier, &[ChatMessage::User { content: prompt }])
            .await?;

        Ok(PageSummary {
            summary: summary.trim().to_string(),
            sources: vec![url.to_string()],
        })
    }
}

/// First `max_chars` characters of `text`.
fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

static SCRIPT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<script[^>]*>.*?</script>").expect("valid regex"));
static STYLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<style[^>]*>.*?</style>").expect("valid regex"));
static COMMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").expect("valid regex"));
static BREAK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<br\s*/?>|</(?:p|div|li|h[1-6]|tr|section|article)>").expect("valid regex")
});
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("valid regex"));
static SPACES_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t]+").expect("valid regex"));
static BLANK_LINES_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*\n(?:\s*\n)+").expect("valid regex"));

/// Convert HTML to readable plain text (simplified).
pub fn html_to_text(html: &str) -> String {
    let text = SCRIPT_RE.replace_all(html, "");
    let text = STYLE_RE.replace_all(&text, "");
    let text = COMMENT_RE.replace_all(&text, "");
    let text = BREAK_RE.replace_all(&text, "\n");
    let text = TAG_RE.replace_all(&text, "");

    let text = text
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&");

    let text = SPACES_RE.replace_all(&text, " ");
    let lines: Vec<&str> = text.lines().map(str::trim).collect();
    let text = lines.join("\n");
    BLANK_LINES_RE.replace_all(&text, "\n\n").trim().to_string()
}

/// Page fetcher over plain HTTP.
///
/// HTML responses are reduced to text; other text responses pass through.
pub struct HttpPageFetcher {
    client: reqwest::Client,
    user_agent: String,
}

impl Default for HttpPageFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpPageFetcher {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .unwrap_or_default(),
            user_agent: "asklang/0.1".to_string(),
        }
    }

    /// Set a custom user agent.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set a custom HTTP client.
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch_text(&self, url: &str) -> CollaboratorResult<String> {
        debug!(url = %url, "HTTP fetch starting");
        let response = self
            .client
            .get(url)
            .header("User-Agent", &self.user_agent)
            .send()
            .await
            .map_err(|e| {
                warn!(url = %url, error = %e, "HTTP request failed");
                CollaboratorError::fetch(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(CollaboratorError::fetch(format!("HTTP {}", status)));
        }

        let is_html = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.contains("html"))
            .unwrap_or(true);

        let body = response.text().await.map_err(CollaboratorError::fetch)?;
        Ok(if is_html { html_to_text(&body) } else { body })
    }
}
