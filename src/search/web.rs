//! Web search provider (Tavily)

use super::error::SearchError;
use super::types::{WebHit, WebSearchOptions};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const TAVILY_ENDPOINT: &str = "https://api.tavily.com/search";

/// Web search abstraction
#[async_trait]
pub trait WebSearch: Send + Sync {
    async fn search(
        &self,
        query: &str,
        options: &WebSearchOptions,
    ) -> Result<Vec<WebHit>, SearchError>;

    fn name(&self) -> &str;
}

/// Tavily-backed web search client
pub struct TavilyClient {
    api_key: String,
    endpoint: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct TavilyRequest<'a> {
    api_key: &'a str,
    query: &'a str,
    search_depth: &'a str,
    max_results: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    days: Option<u32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    include_domains: Vec<String>,
}

#[derive(Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    results: Vec<WebHit>,
}

impl TavilyClient {
    pub fn new(api_key: String, timeout: Duration) -> Result<Self, SearchError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            api_key,
            endpoint: TAVILY_ENDPOINT.to_string(),
            client,
        })
    }

    /// Overrides the API endpoint, for tests and self-hosted gateways
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl WebSearch for TavilyClient {
    async fn search(
        &self,
        query: &str,
        options: &WebSearchOptions,
    ) -> Result<Vec<WebHit>, SearchError> {
        let body = TavilyRequest {
            api_key: &self.api_key,
            query,
            search_depth: "advanced",
            max_results: options.max_results,
            days: options.recency_days,
            include_domains: options.include_domains.clone(),
        };

        debug!(
            query,
            max_results = options.max_results,
            days = ?options.recency_days,
            "web search"
        );

        let response = self.client.post(&self.endpoint).json(&body).send().await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(SearchError::Api {
                status: status.as_u16(),
                message: message.chars().take(200).collect(),
            });
        }

        let parsed: TavilyResponse = response
            .json()
            .await
            .map_err(|e| SearchError::Decode(e.to_string()))?;

        Ok(parsed.results)
    }

    fn name(&self) -> &str {
        "tavily"
    }
}

impl std::fmt::Debug for TavilyClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TavilyClient")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_omits_empty_fields() {
        let body = TavilyRequest {
            api_key: "key",
            query: "acme competitors",
            search_depth: "advanced",
            max_results: 5,
            days: None,
            include_domains: Vec::new(),
        };

        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("days").is_none());
        assert!(json.get("include_domains").is_none());
        assert_eq!(json["search_depth"], "advanced");
    }

    #[test]
    fn test_request_body_includes_domain_allowlist() {
        let body = TavilyRequest {
            api_key: "key",
            query: "acme competitors",
            search_depth: "advanced",
            max_results: 5,
            days: Some(30),
            include_domains: vec!["crunchbase.com".to_string()],
        };

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["days"], 30);
        assert_eq!(json["include_domains"][0], "crunchbase.com");
    }

    #[test]
    fn test_response_parsing_defaults_missing_fields() {
        let raw = r#"{"results": [{"url": "https://example.com", "content": "text"}]}"#;
        let parsed: TavilyResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.results.len(), 1);
        assert_eq!(parsed.results[0].title, "");
        assert_eq!(parsed.results[0].content, "text");
    }
}
