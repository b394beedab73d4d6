//! URL extraction and normalization for answer text and tool output.
//!
//! Only absolute `http`/`https` URLs are recognized. Bare domains such as
//! `example.com` never match.

use indexmap::IndexSet;
use regex::Regex;
use std::sync::LazyLock;
use url::Url;

static URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)https?://[^\s<>"'`\[\]{}|\\^]+"#).expect("valid URL regex")
});

/// Characters that end a sentence or close quoting around a URL.
const TRAILING_PUNCTUATION: &[char] = &['.', ',', ';', ':', '!', '?', '~'];

/// Emphasis markers, trimmed only when the same run opens before the URL.
const EMPHASIS: &[char] = &['*', '_'];

/// Extract absolute http(s) URLs from free text.
///
/// Handles prose, markdown links (`[text](url)`), autolinks (`<url>`) and
/// bracketed citation lists. Balanced parentheses inside a URL are kept.
/// Duplicates are removed, first occurrence wins.
pub fn extract_urls(text: &str) -> Vec<String> {
    let mut seen = IndexSet::new();
    for m in URL_RE.find_iter(text) {
        let candidate = trim_url_end(m.as_str(), &text[..m.start()]);
        if is_absolute_http_url(candidate) {
            seen.insert(candidate.to_string());
        }
    }
    seen.into_iter().collect()
}

/// Strip markup and punctuation that follows a URL in running text.
///
/// `prefix` is the text before the match, used to pair emphasis markers.
fn trim_url_end<'a>(candidate: &'a str, prefix: &str) -> &'a str {
    let mut url = candidate;
    loop {
        let Some(last) = url.chars().last() else {
            return url;
        };

        if TRAILING_PUNCTUATION.contains(&last) {
            url = &url[..url.len() - last.len_utf8()];
        } else if last == ')' && url.matches(')').count() > url.matches('(').count() {
            url = &url[..url.len() - 1];
        } else if EMPHASIS.contains(&last) {
            let opened = prefix.chars().rev().take_while(|c| *c == last).count();
            let closing = url.chars().rev().take_while(|c| *c == last).count();
            let strip = opened.min(closing);
            if strip == 0 {
                return url;
            }
            url = &url[..url.len() - strip];
        } else {
            return url;
        }
    }
}

/// Render URLs one per line, the inverse of [`extract_urls`] for well-formed input.
pub fn urls_as_text<S: AsRef<str>>(urls: &[S]) -> String {
    urls.iter()
        .map(|u| u.as_ref())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Canonical form used for membership checks.
///
/// Lowercases scheme and host, drops the fragment, and trims trailing
/// slashes from the path when there is no query.
pub fn normalize_url(raw: &str) -> String {
    let trimmed = raw.trim();
    match Url::parse(trimmed) {
        Ok(mut url) => {
            url.set_fragment(None);
            if url.query().is_some() {
                url.to_string()
            } else {
                url.as_str().trim_end_matches('/').to_string()
            }
        }
        Err(_) => trimmed.trim_end_matches('/').to_string(),
    }
}

/// True for absolute `http`/`https` URLs that have a host.
pub fn is_absolute_http_url(raw: &str) -> bool {
    match Url::parse(raw) {
        Ok(url) => matches!(url.scheme(), "http" | "https") && url.host_str().is_some(),
        Err(_) => false,
    }
}

/// Short label for a source: the host without a leading `www.`.
pub fn host_label(raw: &str) -> String {
    Url::parse(raw)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.trim_start_matches("www.").to_string()))
        .unwrap_or_else(|| raw.to_string())
}
