//! LLM-backed relevance filter
//!
//! Screens gathered evidence one item at a time with a yes/no judgment
//! before any of it reaches a stage prompt. At most `top_k` items are
//! ever classified; the rest are discarded unclassified. A failed
//! judgment counts as "no" (fail closed), trading recall for precision
//! so junk snippets cannot poison an analysis prompt.

use super::types::{EvidenceItem, Relevance};
use crate::llm::{LLMClient, LLMRequest};
use std::sync::Arc;
use tracing::{debug, warn};

const JUDGMENT_MAX_TOKENS: u32 = 8;

pub struct RelevanceFilter {
    llm: Arc<dyn LLMClient>,
    top_k: usize,
}

impl RelevanceFilter {
    pub fn new(llm: Arc<dyn LLMClient>, top_k: usize) -> Self {
        Self { llm, top_k }
    }

    /// Classifies up to `top_k` items and returns the relevant ones,
    /// preserving input order.
    pub async fn filter(
        &self,
        subject: &str,
        claim_query: &str,
        items: Vec<EvidenceItem>,
    ) -> Vec<EvidenceItem> {
        let mut kept = Vec::new();

        for (position, mut item) in items.into_iter().enumerate() {
            if position >= self.top_k {
                break;
            }

            item.relevance = self.classify(subject, claim_query, &item).await;
            if item.is_relevant() {
                kept.push(item);
            }
        }

        debug!(subject, claim_query, kept = kept.len(), "relevance filter");
        kept
    }

    /// Single yes/no judgment for one item.
    pub async fn classify(
        &self,
        subject: &str,
        claim_query: &str,
        item: &EvidenceItem,
    ) -> Relevance {
        let prompt = build_judgment_prompt(subject, claim_query, item);
        let request = LLMRequest::user(prompt)
            .with_temperature(0.0)
            .with_max_tokens(JUDGMENT_MAX_TOKENS);

        match self.llm.chat(request).await {
            Ok(response) => {
                if is_affirmative(&response.content) {
                    Relevance::Relevant
                } else {
                    Relevance::Irrelevant
                }
            }
            Err(e) => {
                warn!(error = %e, "relevance judgment failed, treating item as irrelevant");
                Relevance::Irrelevant
            }
        }
    }
}

fn build_judgment_prompt(subject: &str, claim_query: &str, item: &EvidenceItem) -> String {
    format!(
        "You judge whether a retrieved passage is relevant to a research question.\n\n\
         Question: {} {}\n\
         Passage: {}\n\n\
         Answer with exactly one word: yes or no.",
        subject, claim_query, item.snippet
    )
}

fn is_affirmative(content: &str) -> bool {
    content.trim().to_lowercase().starts_with('y')
}

impl std::fmt::Debug for RelevanceFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelevanceFilter")
            .field("llm", &self.llm.name())
            .field("top_k", &self.top_k)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{BackendError, MockLLMClient, MockResponse};

    fn items(count: usize) -> Vec<EvidenceItem> {
        (0..count)
            .map(|i| EvidenceItem::new(format!("item {}", i), format!("snippet {}", i), None))
            .collect()
    }

    #[test]
    fn test_affirmative_parsing() {
        assert!(is_affirmative("yes"));
        assert!(is_affirmative("  Yes, it is."));
        assert!(is_affirmative("Y"));
        assert!(!is_affirmative("no"));
        assert!(!is_affirmative("Not relevant"));
        assert!(!is_affirmative(""));
    }

    #[test]
    fn test_judgment_prompt_combines_subject_and_claim() {
        let item = EvidenceItem::new("t", "Acme raised a Series B", None);
        let prompt = build_judgment_prompt("Acme", "funding history", &item);
        assert!(prompt.contains("Acme funding history"));
        assert!(prompt.contains("Acme raised a Series B"));
    }

    #[tokio::test]
    async fn test_filter_keeps_affirmed_items_in_order() {
        let llm = Arc::new(MockLLMClient::new());
        llm.add_responses(vec![
            MockResponse::text("yes"),
            MockResponse::text("no"),
            MockResponse::text("Yes."),
        ]);

        let filter = RelevanceFilter::new(llm.clone(), 5);
        let kept = filter.filter("Acme", "core technology", items(3)).await;

        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].title, "item 0");
        assert_eq!(kept[1].title, "item 2");
        assert!(kept.iter().all(|i| i.is_relevant()));
    }

    #[tokio::test]
    async fn test_filter_classifies_at_most_top_k() {
        let llm = Arc::new(MockLLMClient::new());
        llm.set_default_response("yes");

        let filter = RelevanceFilter::new(llm.clone(), 3);
        let kept = filter.filter("Acme", "market size", items(10)).await;

        assert_eq!(kept.len(), 3);
        assert_eq!(llm.call_count(), 3);
    }

    #[tokio::test]
    async fn test_failed_judgment_is_fail_closed() {
        let llm = Arc::new(MockLLMClient::new());
        llm.add_responses(vec![
            MockResponse::error(BackendError::TimeoutError { seconds: 5 }),
            MockResponse::text("yes"),
        ]);

        let filter = RelevanceFilter::new(llm, 5);
        let kept = filter.filter("Acme", "competitors", items(2)).await;

        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].title, "item 1");
    }

    #[tokio::test]
    async fn test_empty_input_makes_no_calls() {
        let llm = Arc::new(MockLLMClient::new());
        let filter = RelevanceFilter::new(llm.clone(), 5);

        let kept = filter.filter("Acme", "anything", Vec::new()).await;

        assert!(kept.is_empty());
        assert_eq!(llm.call_count(), 0);
    }
}
