//! Tavily-backed web searcher.

use async_trait::async_trait;
use tracing::{debug, warn};
use url::Url;

use crate::error::{CollaboratorError, CollaboratorResult};
use crate::security::SecretString;
use crate::traits::searcher::{SearchResult, WebSearcher};

const TAVILY_ENDPOINT: &str = "https://api.tavily.com/search";

/// Tavily search API client.
pub struct TavilyWebSearcher {
    api_key: SecretString,
    client: reqwest::Client,
    endpoint: String,
    /// Default number of results to return.
    pub default_limit: usize,
}

impl TavilyWebSearcher {
    /// Create a new Tavily web searcher.
    pub fn new(api_key: impl Into<SecretString>) -> Self {
        Self {
            api_key: api_key.into(),
            client: reqwest::Client::new(),
            endpoint: TAVILY_ENDPOINT.to_string(),
            default_limit: 5,
        }
    }

    /// Set the default result limit.
    pub fn with_default_limit(mut self, limit: usize) -> Self {
        self.default_limit = limit;
        self
    }

    /// Point at a different endpoint (proxies, stub servers).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Use a preconfigured HTTP client.
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }
}

#[async_trait]
impl WebSearcher for TavilyWebSearcher {
    async fn search(&self, query: &str) -> CollaboratorResult<Vec<SearchResult>> {
        self.search_with_limit(query, self.default_limit).await
    }

    async fn search_with_limit(
        &self,
        query: &str,
        limit: usize,
    ) -> CollaboratorResult<Vec<SearchResult>> {
        #[derive(serde::Serialize)]
        struct Request<'a> {
            query: &'a str,
            search_depth: &'a str,
            max_results: usize,
        }

        #[derive(serde::Deserialize)]
        struct Response {
            #[serde(default)]
            results: Vec<TavilyResult>,
        }

        #[derive(serde::Deserialize)]
        struct TavilyResult {
            url: String,
            title: Option<String>,
            content: Option<String>,
            score: Option<f32>,
        }

        let request = Request {
            query,
            search_depth: "basic",
            max_results: limit,
        };

        debug!(query = %query, limit, "Tavily search starting");
        let response = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", self.api_key.expose()))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                warn!(query = %query, error = %e, "Tavily request failed");
                CollaboratorError::search(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(query = %query, status = %status, "Tavily API error");
            return Err(CollaboratorError::search(format!(
                "Tavily API error: {}",
                status
            )));
        }

        let tavily_response: Response = response.json().await.map_err(CollaboratorError::search)?;

        let results: Vec<SearchResult> = tavily_response
            .results
            .into_iter()
            .filter_map(|r| {
                let url = match Url::parse(&r.url) {
                    Ok(url) => url,
                    Err(e) => {
                        debug!(url = %r.url, error = %e, "Dropping unparseable Tavily result");
                        return None;
                    }
                };
                let mut result = SearchResult::new(url);
                if let Some(title) = r.title {
                    result = result.with_title(title);
                }
                if let Some(content) = r.content {
                    result = result.with_snippet(content);
                }
                if let Some(score) = r.score {
                    result = result.with_score(score);
                }
                Some(result)
            })
            .take(limit)
            .collect();

        debug!(query = %query, result_count = results.len(), "Tavily search complete");
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::HeaderMap, http::StatusCode, routing::post, Json, Router};

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/search")
    }

    #[tokio::test]
    async fn test_parses_results_and_drops_bad_urls() {
        let app = Router::new().route(
            "/search",
            post(|headers: HeaderMap, Json(body): Json<serde_json::Value>| async move {
                assert_eq!(headers["authorization"], "Bearer tvly-test");
                assert_eq!(body["max_results"], 2);
                Json(serde_json::json!({
                    "results": [
                        { "url": "https://a.example/wc2022", "title": "A", "content": "snippet a", "score": 0.9 },
                        { "url": "not a url", "title": "broken" },
                        { "url": "https://b.example/wc2022-recap", "title": "B", "content": null }
                    ]
                }))
            }),
        );
        let endpoint = serve(app).await;
        let searcher = TavilyWebSearcher::new("tvly-test")
            .with_endpoint(endpoint)
            .with_default_limit(2);

        let results = searcher.search("world cup 2022").await.unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].url.as_str(), "https://a.example/wc2022");
        assert_eq!(results[0].snippet.as_deref(), Some("snippet a"));
        assert_eq!(results[1].url.as_str(), "https://b.example/wc2022-recap");
        assert!(results[1].snippet.is_none());
    }

    #[tokio::test]
    async fn test_http_error_is_a_search_error() {
        let app = Router::new().route(
            "/search",
            post(|| async { (StatusCode::UNAUTHORIZED, "bad key") }),
        );
        let endpoint = serve(app).await;
        let searcher = TavilyWebSearcher::new("tvly-wrong").with_endpoint(endpoint);

        let err = searcher.search("anything").await.unwrap_err();
        assert!(matches!(err, CollaboratorError::Search(_)));
    }
}
