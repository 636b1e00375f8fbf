//! Patent registry provider (KIPRIS)
//!
//! Registrations are fetched from the KIPRIS open API and parsed from
//! its XML envelope. When no service key is configured the registry
//! degrades to a stub that returns a single placeholder entry, so the
//! pipeline keeps running without patent credentials.

use super::error::SearchError;
use super::types::PatentHit;
use async_trait::async_trait;
use roxmltree::Document;
use std::time::Duration;
use tracing::debug;

const KIPRIS_ENDPOINT: &str =
    "http://plus.kipris.or.kr/kipo-api/kipi/patUtiModInfoSearchSevice/getWordSearch";

/// Patent registry abstraction
#[async_trait]
pub trait PatentRegistry: Send + Sync {
    async fn search(&self, keyword: &str, max_results: usize)
        -> Result<Vec<PatentHit>, SearchError>;

    fn name(&self) -> &str;
}

/// KIPRIS-backed registry client
pub struct KiprisClient {
    api_key: String,
    endpoint: String,
    client: reqwest::Client,
}

impl KiprisClient {
    pub fn new(api_key: String, timeout: Duration) -> Result<Self, SearchError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            api_key,
            endpoint: KIPRIS_ENDPOINT.to_string(),
            client,
        })
    }

    /// Overrides the API endpoint, for tests
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    fn parse_registrations(body: &str, max_results: usize) -> Result<Vec<PatentHit>, SearchError> {
        let doc = Document::parse(body).map_err(|e| SearchError::Decode(e.to_string()))?;

        let mut hits = Vec::new();
        for node in doc.descendants() {
            if !node.has_tag_name("item") {
                continue;
            }

            let mut title = None;
            let mut applicant = None;
            let mut registration_number = None;

            for child in node.children() {
                if child.has_tag_name("inventionTitle") {
                    title = child.text().map(|s| s.trim().to_string());
                }
                if child.has_tag_name("applicantName") {
                    applicant = child.text().map(|s| s.trim().to_string());
                }
                if child.has_tag_name("registerNumber") {
                    registration_number = child.text().map(|s| s.trim().to_string());
                }
            }

            if let Some(title) = title {
                hits.push(PatentHit {
                    title,
                    applicant: applicant.unwrap_or_default(),
                    registration_number: registration_number.unwrap_or_default(),
                });
                if hits.len() >= max_results {
                    break;
                }
            }
        }

        Ok(hits)
    }
}

#[async_trait]
impl PatentRegistry for KiprisClient {
    async fn search(
        &self,
        keyword: &str,
        max_results: usize,
    ) -> Result<Vec<PatentHit>, SearchError> {
        debug!(keyword, max_results, "patent registry search");

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("word", keyword),
                ("numOfRows", &max_results.to_string()),
                ("ServiceKey", &self.api_key),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(SearchError::Api {
                status: status.as_u16(),
                message: message.chars().take(200).collect(),
            });
        }

        let body = response.text().await?;
        Self::parse_registrations(&body, max_results)
    }

    fn name(&self) -> &str {
        "kipris"
    }
}

impl std::fmt::Debug for KiprisClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KiprisClient")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

/// Placeholder registry used when no service key is configured
///
/// Always returns a single marker entry rather than an error, so the
/// tech stage's IP cross-check phase still produces a well-formed
/// evidence section.
#[derive(Debug, Default)]
pub struct StubPatentRegistry;

#[async_trait]
impl PatentRegistry for StubPatentRegistry {
    async fn search(
        &self,
        keyword: &str,
        _max_results: usize,
    ) -> Result<Vec<PatentHit>, SearchError> {
        Ok(vec![PatentHit {
            title: format!("registry lookup unavailable for '{}'", keyword),
            applicant: "unknown".to_string(),
            registration_number: "n/a".to_string(),
        }])
    }

    fn name(&self) -> &str {
        "patent-stub"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<response>
  <body>
    <items>
      <item>
        <inventionTitle>Biosignal analysis apparatus</inventionTitle>
        <applicantName>Acme Health Inc.</applicantName>
        <registerNumber>10-2023-0001234</registerNumber>
      </item>
      <item>
        <inventionTitle>Wearable sensor array</inventionTitle>
        <applicantName>Acme Health Inc.</applicantName>
        <registerNumber>10-2022-0009876</registerNumber>
      </item>
    </items>
  </body>
</response>"#;

    #[test]
    fn test_parse_registrations() {
        let hits = KiprisClient::parse_registrations(SAMPLE, 10).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].title, "Biosignal analysis apparatus");
        assert_eq!(hits[0].applicant, "Acme Health Inc.");
        assert_eq!(hits[0].registration_number, "10-2023-0001234");
    }

    #[test]
    fn test_parse_respects_max_results() {
        let hits = KiprisClient::parse_registrations(SAMPLE, 1).unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn test_parse_rejects_invalid_xml() {
        let result = KiprisClient::parse_registrations("not xml at all <", 5);
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_stub_returns_single_placeholder() {
        let stub = StubPatentRegistry;
        let hits = stub.search("biosignal", 5).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert!(hits[0].title.contains("biosignal"));
    }
}
