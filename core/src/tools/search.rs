use crate::traits::{Tool, ToolError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

pub const SEARCH_TOOL_NAME: &str = "tavily_search_results_json";
const TAVILY_BASE_URL: &str = "https://api.tavily.com";
const DEFAULT_MAX_RESULTS: usize = 5;

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    api_key: &'a str,
    query: &'a str,
    max_results: usize,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    url: String,
    content: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct Snippet {
    pub url: String,
    pub content: String,
}

pub struct TavilySearchTool {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    max_results: usize,
}

impl TavilySearchTool {
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();

        Self {
            client,
            api_key: api_key.into(),
            base_url: TAVILY_BASE_URL.to_string(),
            max_results: DEFAULT_MAX_RESULTS,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    async fn search(&self, query: &str) -> Result<Vec<Snippet>, ToolError> {
        let request = SearchRequest {
            api_key: &self.api_key,
            query,
            max_results: self.max_results,
        };

        let response = self
            .client
            .post(format!("{}/search", self.base_url.trim_end_matches('/')))
            .json(&request)
            .send()
            .await
            .map_err(|e| ToolError::execution(format!("Search request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(ToolError::execution(format!(
                "Tavily API error {}: {}",
                status, error_text
            )));
        }

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| ToolError::execution(format!("Invalid search response: {}", e)))?;

        Ok(into_snippets(body))
    }
}

fn into_snippets(body: SearchResponse) -> Vec<Snippet> {
    body.results
        .into_iter()
        .map(|hit| Snippet {
            url: hit.url,
            content: hit.content,
        })
        .collect()
}

#[async_trait]
impl Tool for TavilySearchTool {
    fn name(&self) -> &str {
        SEARCH_TOOL_NAME
    }

    fn description(&self) -> &str {
        "A search engine optimized for comprehensive, accurate, and trusted results. Useful for when you need to answer questions about current events. Input should be a search query."
    }

    async fn invoke(&self, input: &str) -> Result<String, ToolError> {
        let query = input.trim();
        if query.is_empty() {
            return Err(ToolError::InvalidInput("search query is empty".to_string()));
        }

        debug!(%query, max_results = self.max_results, "Searching");
        let snippets = self.search(query).await?;
        serde_json::to_string(&snippets)
            .map_err(|e| ToolError::execution(format!("Failed to encode results: {}", e)))
    }
}
