//! Internal document index client
//!
//! The index holds pre-ingested company disclosure documents and serves
//! semantic retrieval over HTTP. Queries are always scoped to a single
//! company so passages about other portfolio candidates never leak in.

use super::error::SearchError;
use super::types::IndexPassage;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Document index abstraction
#[async_trait]
pub trait DocumentIndex: Send + Sync {
    async fn search(
        &self,
        query: &str,
        company: &str,
        top_k: usize,
    ) -> Result<Vec<IndexPassage>, SearchError>;

    fn name(&self) -> &str;
}

/// HTTP client for the document index service
pub struct HttpDocumentIndex {
    endpoint: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct IndexRequest<'a> {
    query: &'a str,
    company: &'a str,
    top_k: usize,
}

#[derive(Deserialize)]
struct IndexResponse {
    #[serde(default)]
    passages: Vec<IndexPassage>,
}

impl HttpDocumentIndex {
    pub fn new(endpoint: String, timeout: Duration) -> Result<Self, SearchError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { endpoint, client })
    }
}

#[async_trait]
impl DocumentIndex for HttpDocumentIndex {
    async fn search(
        &self,
        query: &str,
        company: &str,
        top_k: usize,
    ) -> Result<Vec<IndexPassage>, SearchError> {
        let body = IndexRequest {
            query,
            company,
            top_k,
        };

        debug!(query, company, top_k, "index search");

        let response = self.client.post(&self.endpoint).json(&body).send().await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(SearchError::Api {
                status: status.as_u16(),
                message: message.chars().take(200).collect(),
            });
        }

        let parsed: IndexResponse = response
            .json()
            .await
            .map_err(|e| SearchError::Decode(e.to_string()))?;

        Ok(parsed.passages)
    }

    fn name(&self) -> &str {
        "document-index"
    }
}

impl std::fmt::Debug for HttpDocumentIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpDocumentIndex")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}
