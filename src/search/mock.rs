//! Mock retrieval providers for tests

use super::error::SearchError;
use super::index::DocumentIndex;
use super::patents::PatentRegistry;
use super::types::{IndexPassage, PatentHit, WebHit, WebSearchOptions};
use super::web::WebSearch;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

fn provider_failure() -> SearchError {
    SearchError::Api {
        status: 503,
        message: "mock provider configured to fail".to_string(),
    }
}

/// In-memory document index honoring the per-company scope
pub struct MockDocumentIndex {
    passages: Mutex<Vec<IndexPassage>>,
    fail: AtomicBool,
    calls: AtomicUsize,
    queries: Mutex<Vec<String>>,
}

impl MockDocumentIndex {
    pub fn new() -> Self {
        Self {
            passages: Mutex::new(Vec::new()),
            fail: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn add_passage(&self, company: &str, text: &str) {
        self.passages
            .lock()
            .unwrap()
            .push(IndexPassage::new(text).with_metadata("company", company));
    }

    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

impl Default for MockDocumentIndex {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentIndex for MockDocumentIndex {
    async fn search(
        &self,
        query: &str,
        company: &str,
        top_k: usize,
    ) -> Result<Vec<IndexPassage>, SearchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().unwrap().push(query.to_string());

        if self.fail.load(Ordering::SeqCst) {
            return Err(provider_failure());
        }

        let passages = self
            .passages
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.metadata.get("company").map(String::as_str) == Some(company))
            .take(top_k)
            .cloned()
            .collect();

        Ok(passages)
    }

    fn name(&self) -> &str {
        "mock-index"
    }
}

/// Scripted web search provider
pub struct MockWebSearch {
    hits: Mutex<Vec<WebHit>>,
    fail: AtomicBool,
    calls: AtomicUsize,
    queries: Mutex<Vec<String>>,
    last_options: Mutex<Option<WebSearchOptions>>,
}

impl MockWebSearch {
    pub fn new() -> Self {
        Self {
            hits: Mutex::new(Vec::new()),
            fail: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
            queries: Mutex::new(Vec::new()),
            last_options: Mutex::new(None),
        }
    }

    pub fn add_hit(&self, title: &str, url: &str, content: &str) {
        self.hits.lock().unwrap().push(WebHit {
            title: title.to_string(),
            url: url.to_string(),
            content: content.to_string(),
            score: None,
        });
    }

    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }

    /// Options seen on the most recent call
    pub fn last_options(&self) -> Option<WebSearchOptions> {
        self.last_options.lock().unwrap().clone()
    }
}

impl Default for MockWebSearch {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WebSearch for MockWebSearch {
    async fn search(
        &self,
        query: &str,
        options: &WebSearchOptions,
    ) -> Result<Vec<WebHit>, SearchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().unwrap().push(query.to_string());
        *self.last_options.lock().unwrap() = Some(options.clone());

        if self.fail.load(Ordering::SeqCst) {
            return Err(provider_failure());
        }

        let hits = self
            .hits
            .lock()
            .unwrap()
            .iter()
            .take(options.max_results)
            .cloned()
            .collect();

        Ok(hits)
    }

    fn name(&self) -> &str {
        "mock-web"
    }
}

/// Scripted patent registry
pub struct MockPatentRegistry {
    hits: Mutex<Vec<PatentHit>>,
    fail: AtomicBool,
    calls: AtomicUsize,
}

impl MockPatentRegistry {
    pub fn new() -> Self {
        Self {
            hits: Mutex::new(Vec::new()),
            fail: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn add_registration(&self, title: &str, applicant: &str, number: &str) {
        self.hits.lock().unwrap().push(PatentHit {
            title: title.to_string(),
            applicant: applicant.to_string(),
            registration_number: number.to_string(),
        });
    }

    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for MockPatentRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PatentRegistry for MockPatentRegistry {
    async fn search(
        &self,
        _keyword: &str,
        max_results: usize,
    ) -> Result<Vec<PatentHit>, SearchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.fail.load(Ordering::SeqCst) {
            return Err(provider_failure());
        }

        let hits = self
            .hits
            .lock()
            .unwrap()
            .iter()
            .take(max_results)
            .cloned()
            .collect();

        Ok(hits)
    }

    fn name(&self) -> &str {
        "mock-patents"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_index_filters_by_company() {
        let index = MockDocumentIndex::new();
        index.add_passage("Acme", "Acme builds robots");
        index.add_passage("Other Corp", "Other Corp builds drones");

        let passages = index.search("robots", "Acme", 10).await.unwrap();

        assert_eq!(passages.len(), 1);
        assert!(passages[0].text.contains("Acme"));
    }

    #[tokio::test]
    async fn test_web_respects_max_results_and_records_options() {
        let web = MockWebSearch::new();
        for i in 0..5 {
            web.add_hit(&format!("hit {}", i), "https://example.com", "content");
        }

        let options = WebSearchOptions {
            max_results: 2,
            recency_days: Some(30),
            include_domains: vec!["crunchbase.com".to_string()],
        };
        let hits = web.search("acme", &options).await.unwrap();

        assert_eq!(hits.len(), 2);
        assert_eq!(web.last_options().unwrap().recency_days, Some(30));
        assert_eq!(web.queries(), vec!["acme".to_string()]);
    }

    #[tokio::test]
    async fn test_providers_fail_on_demand() {
        let index = MockDocumentIndex::new();
        index.set_fail(true);
        assert!(index.search("q", "Acme", 5).await.is_err());

        let patents = MockPatentRegistry::new();
        patents.set_fail(true);
        assert!(patents.search("q", 5).await.is_err());
    }
}
