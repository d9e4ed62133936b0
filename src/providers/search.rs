//! Best-effort web search used to enrich the chat system prompt.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use super::WebSearchProvider;
use crate::config::SearchConfig;
use crate::error::{KindredError, Result};

/// Results kept in the prompt.
const MAX_RESULTS: usize = 3;
/// Characters kept per result snippet.
const SNIPPET_CHARS: usize = 300;

/// Client for a Tavily-style search endpoint: `POST {base_url}` with
/// `{api_key, query, max_results}` returning `{results: [{title, content}]}`.
pub struct HttpSearchProvider {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpSearchProvider {
    pub fn new(config: &SearchConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .map_err(|e| KindredError::Internal(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
        })
    }

    async fn try_search(&self, query: &str) -> std::result::Result<String, reqwest::Error> {
        let body = serde_json::json!({
            "api_key": self.api_key,
            "query": query,
            "max_results": MAX_RESULTS,
        });

        let response: SearchResponse = self
            .client
            .post(&self.base_url)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(format_results(&response.results))
    }
}

#[async_trait]
impl WebSearchProvider for HttpSearchProvider {
    async fn search(&self, query: &str) -> String {
        match self.try_search(query).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(error = %e, "web search failed, continuing without results");
                String::new()
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    content: String,
}

fn format_results(results: &[SearchResult]) -> String {
    results
        .iter()
        .take(MAX_RESULTS)
        .map(|r| {
            let snippet: String = r.content.chars().take(SNIPPET_CHARS).collect();
            format!("- {}: {}", r.title.trim(), snippet.trim())
        })
        .collect::<Vec<_>>()
        .join("\n")
}
