//! Evidence gatherer
//!
//! Wraps the three retrieval backends behind one `search` call that
//! returns provider-neutral evidence items. Provider failures are
//! absorbed into an empty result set so a flaky backend reads as
//! "insufficient evidence" downstream, never as a pipeline error.

use super::index::DocumentIndex;
use super::patents::PatentRegistry;
use super::types::{EvidenceItem, IndexPassage, PatentHit, SearchSource, WebHit, WebSearchOptions};
use super::web::WebSearch;
use std::sync::Arc;
use tracing::warn;

const UNTITLED_PASSAGE_CHARS: usize = 80;

pub struct EvidenceGatherer {
    index: Arc<dyn DocumentIndex>,
    web: Arc<dyn WebSearch>,
    patents: Arc<dyn PatentRegistry>,
}

impl EvidenceGatherer {
    pub fn new(
        index: Arc<dyn DocumentIndex>,
        web: Arc<dyn WebSearch>,
        patents: Arc<dyn PatentRegistry>,
    ) -> Self {
        Self {
            index,
            web,
            patents,
        }
    }

    /// Runs one query against the selected backend.
    ///
    /// Results keep the provider's ranking order. On provider failure
    /// the query yields an empty sequence and a warning.
    pub async fn search(
        &self,
        query: &str,
        source: &SearchSource,
        max_results: usize,
    ) -> Vec<EvidenceItem> {
        let outcome = match source {
            SearchSource::Index { company } => self
                .index
                .search(query, company, max_results)
                .await
                .map(|passages| passages.into_iter().map(passage_to_item).collect()),
            SearchSource::Web {
                recency_days,
                include_domains,
            } => {
                let options = WebSearchOptions {
                    max_results,
                    recency_days: *recency_days,
                    include_domains: include_domains.clone(),
                };
                self.web
                    .search(query, &options)
                    .await
                    .map(|hits| hits.into_iter().map(hit_to_item).collect())
            }
            SearchSource::PatentRegistry => self
                .patents
                .search(query, max_results)
                .await
                .map(|hits| hits.into_iter().map(patent_to_item).collect()),
        };

        match outcome {
            Ok(items) => items,
            Err(e) => {
                warn!(
                    query,
                    source = source.label(),
                    error = %e,
                    "evidence provider failed, continuing with empty results"
                );
                Vec::new()
            }
        }
    }
}

fn passage_to_item(passage: IndexPassage) -> EvidenceItem {
    let title = passage
        .metadata
        .get("title")
        .cloned()
        .unwrap_or_else(|| truncate_title(&passage.text));
    let source_url = passage.metadata.get("source").cloned();
    EvidenceItem::new(title, passage.text, source_url)
}

fn hit_to_item(hit: WebHit) -> EvidenceItem {
    let url = if hit.url.is_empty() {
        None
    } else {
        Some(hit.url)
    };
    EvidenceItem::new(hit.title, hit.content, url)
}

fn patent_to_item(hit: PatentHit) -> EvidenceItem {
    let snippet = format!(
        "applicant: {}, registration number: {}",
        hit.applicant, hit.registration_number
    );
    EvidenceItem::new(hit.title, snippet, None)
}

fn truncate_title(text: &str) -> String {
    text.chars().take(UNTITLED_PASSAGE_CHARS).collect()
}

impl std::fmt::Debug for EvidenceGatherer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvidenceGatherer")
            .field("index", &self.index.name())
            .field("web", &self.web.name())
            .field("patents", &self.patents.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::mock::{MockDocumentIndex, MockPatentRegistry, MockWebSearch};

    fn gatherer() -> (
        Arc<MockDocumentIndex>,
        Arc<MockWebSearch>,
        Arc<MockPatentRegistry>,
        EvidenceGatherer,
    ) {
        let index = Arc::new(MockDocumentIndex::new());
        let web = Arc::new(MockWebSearch::new());
        let patents = Arc::new(MockPatentRegistry::new());
        let gatherer = EvidenceGatherer::new(index.clone(), web.clone(), patents.clone());
        (index, web, patents, gatherer)
    }

    #[tokio::test]
    async fn test_index_search_maps_passages() {
        let (index, _, _, gatherer) = gatherer();
        index.add_passage("Acme", "Acme builds surgical robots for spinal procedures");

        let source = SearchSource::Index {
            company: "Acme".to_string(),
        };
        let items = gatherer.search("core technology", &source, 5).await;

        assert_eq!(items.len(), 1);
        assert!(items[0].snippet.contains("surgical robots"));
        assert!(items[0].source_url.is_none());
    }

    #[tokio::test]
    async fn test_web_search_maps_hits_in_order() {
        let (_, web, _, gatherer) = gatherer();
        web.add_hit("First", "https://a.example.com", "first content");
        web.add_hit("Second", "https://b.example.com", "second content");

        let items = gatherer.search("acme", &SearchSource::web(), 5).await;

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, "First");
        assert_eq!(items[1].title, "Second");
        assert_eq!(
            items[0].source_url.as_deref(),
            Some("https://a.example.com")
        );
    }

    #[tokio::test]
    async fn test_patent_search_formats_snippet() {
        let (_, _, patents, gatherer) = gatherer();
        patents.add_registration("Sensor array", "Acme Inc.", "10-2023-0001234");

        let items = gatherer.search("sensor", &SearchSource::PatentRegistry, 5).await;

        assert_eq!(items.len(), 1);
        assert!(items[0].snippet.contains("Acme Inc."));
        assert!(items[0].snippet.contains("10-2023-0001234"));
    }

    #[tokio::test]
    async fn test_provider_failure_degrades_to_empty() {
        let (index, _, _, gatherer) = gatherer();
        index.add_passage("Acme", "text");
        index.set_fail(true);

        let source = SearchSource::Index {
            company: "Acme".to_string(),
        };
        let items = gatherer.search("anything", &source, 5).await;

        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn test_domain_allowlist_reaches_provider() {
        let (_, web, _, gatherer) = gatherer();

        let source = SearchSource::Web {
            recency_days: None,
            include_domains: vec!["crunchbase.com".to_string(), "reuters.com".to_string()],
        };
        gatherer.search("acme competitors", &source, 5).await;

        let options = web.last_options().unwrap();
        assert_eq!(options.include_domains.len(), 2);
        assert_eq!(options.max_results, 5);
    }
}
