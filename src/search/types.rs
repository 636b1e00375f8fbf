//! Evidence retrieval types
//!
//! Shared types for the three retrieval backends (document index, web
//! search, patent registry) and the evidence items stages consume.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Relevance judgment attached to an evidence item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Relevance {
    /// Not yet classified
    Unset,
    /// Judged relevant to the stage's claim
    Relevant,
    /// Judged irrelevant (or classification failed)
    Irrelevant,
}

/// A single piece of retrieved evidence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceItem {
    /// Short title or heading
    pub title: String,
    /// Text excerpt
    pub snippet: String,
    /// Source URL when the backend provides one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    /// When the item was retrieved
    pub retrieved_at: DateTime<Utc>,
    /// Relevance judgment
    pub relevance: Relevance,
}

impl EvidenceItem {
    pub fn new(
        title: impl Into<String>,
        snippet: impl Into<String>,
        source_url: Option<String>,
    ) -> Self {
        Self {
            title: title.into(),
            snippet: snippet.into(),
            source_url,
            retrieved_at: Utc::now(),
            relevance: Relevance::Unset,
        }
    }

    pub fn is_relevant(&self) -> bool {
        self.relevance == Relevance::Relevant
    }
}

/// A passage returned by the internal document index
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexPassage {
    /// Passage text
    pub text: String,
    /// Arbitrary metadata (company, title, source, ...)
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl IndexPassage {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// A result returned by the web search provider
#[derive(Debug, Clone, Deserialize)]
pub struct WebHit {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub content: String,
    pub score: Option<f64>,
}

/// A registration returned by the patent registry
#[derive(Debug, Clone)]
pub struct PatentHit {
    pub title: String,
    pub applicant: String,
    pub registration_number: String,
}

/// Options forwarded to the web search provider
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WebSearchOptions {
    /// Maximum results to return
    pub max_results: usize,
    /// Restrict results to the last N days
    pub recency_days: Option<u32>,
    /// Restrict results to these domains
    pub include_domains: Vec<String>,
}

/// Which retrieval backend a query targets
#[derive(Debug, Clone, PartialEq)]
pub enum SearchSource {
    /// Internal document index, scoped to one company
    Index { company: String },
    /// Web search with optional recency window and domain allowlist
    Web {
        recency_days: Option<u32>,
        include_domains: Vec<String>,
    },
    /// Patent registry lookup
    PatentRegistry,
}

impl SearchSource {
    /// Unrestricted web search
    pub fn web() -> Self {
        SearchSource::Web {
            recency_days: None,
            include_domains: Vec::new(),
        }
    }

    /// Web search restricted to the last `days` days
    pub fn web_recent(days: u32) -> Self {
        SearchSource::Web {
            recency_days: Some(days),
            include_domains: Vec::new(),
        }
    }

    /// Short label for logging
    pub fn label(&self) -> &'static str {
        match self {
            SearchSource::Index { .. } => "index",
            SearchSource::Web { .. } => "web",
            SearchSource::PatentRegistry => "patents",
        }
    }
}
