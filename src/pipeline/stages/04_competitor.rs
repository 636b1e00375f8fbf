//! Stage 4: Competitor
//!
//! Finds the single most direct competitor and profiles the match-up.
//! Search is restricted to business-press domains so the profile rests
//! on reported facts rather than vendor marketing.

use super::llm_helper;
use crate::pipeline::context::StageContext;
use crate::pipeline::stage::AnalysisStage;
use crate::record::{set_if_filled, InvestmentRecord};
use crate::search::{EvidenceItem, SearchSource};
use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::warn;

const COMPETITOR_RESULTS: usize = 5;
const ALLOWED_DOMAINS: [&str; 4] = [
    "crunchbase.com",
    "reuters.com",
    "bloomberg.com",
    "techcrunch.com",
];

#[derive(Debug, Deserialize)]
struct CompetitorOutput {
    #[serde(default)]
    main_competitors: String,
    #[serde(default)]
    competitor_profiles: String,
    #[serde(default)]
    market_positioning: String,
    #[serde(default)]
    product_comparison: String,
    #[serde(default)]
    unique_value_props: String,
    #[serde(default)]
    threat_analysis: String,
    #[serde(default, alias = "MarketShare")]
    market_share: String,
    #[serde(default)]
    reference_urls: Vec<String>,
}

/// Unparseable analysis is still analysis: keep the raw text as the
/// profile instead of discarding it.
fn fallback_output(raw: &str) -> CompetitorOutput {
    CompetitorOutput {
        main_competitors: "N/A".to_string(),
        competitor_profiles: raw.to_string(),
        market_positioning: "N/A".to_string(),
        product_comparison: "N/A".to_string(),
        unique_value_props: "N/A".to_string(),
        threat_analysis: "N/A".to_string(),
        market_share: "N/A".to_string(),
        reference_urls: Vec::new(),
    }
}

fn competitor_query(record: &InvestmentRecord) -> String {
    let core_tech = record.core_tech.trim();
    if core_tech.is_empty() {
        format!("{} competitors", record.company_name())
    } else {
        format!("{} {} competitors", record.company_name(), core_tech)
    }
}

fn competitor_source() -> SearchSource {
    SearchSource::Web {
        recency_days: None,
        include_domains: ALLOWED_DOMAINS.iter().map(|d| d.to_string()).collect(),
    }
}

/// Source URLs of the evidence, deduplicated in retrieval order. Used
/// when the model returns no references of its own.
fn reference_urls_from(evidence: &[EvidenceItem]) -> Vec<String> {
    let mut urls = Vec::new();
    for item in evidence {
        if let Some(url) = &item.source_url {
            if !url.is_empty() && !urls.iter().any(|u| u == url) {
                urls.push(url.clone());
            }
        }
    }
    urls
}

fn build_prompt(record: &InvestmentRecord, evidence: &str) -> String {
    format!(
        r#"You are a competitive-intelligence analyst. Identify the single most direct competitor of the company below and profile the match-up.

Company: {}
Core technology: {}
Differentiation claims: {}

Selection criteria, in order:
1. Similarity of the core technology
2. Direct competition in market position
3. Overlap of product or service
4. Similarity of target customers

Retrieved evidence:
{}

Respond with JSON:
{{
  "main_competitors": "the competitor's name",
  "competitor_profiles": "founding year, scale, funding status, main products",
  "market_positioning": "how the two companies are positioned against each other",
  "product_comparison": "features, pricing, target customers, technical edge",
  "unique_value_props": "what only the analyzed company offers",
  "threat_analysis": "how the competitor threatens the analyzed company",
  "market_share": "market share of both, if reported",
  "reference_urls": ["source URLs used"]
}}

IMPORTANT:
- Respond with the JSON object only, no surrounding prose
- Pick exactly one main competitor
- Use an empty string for anything the evidence does not support
"#,
        record.company_name(),
        record.core_tech,
        record.differentiation_points,
        evidence
    )
}

pub struct CompetitorStage;

#[async_trait]
impl AnalysisStage for CompetitorStage {
    fn name(&self) -> &'static str {
        "CompetitorStage"
    }

    async fn execute(&self, record: &mut InvestmentRecord, ctx: &StageContext) -> Result<()> {
        let company = record.company_name().to_string();

        let gathered = ctx
            .gatherer
            .search(
                &competitor_query(record),
                &competitor_source(),
                COMPETITOR_RESULTS,
            )
            .await;
        let evidence = ctx
            .relevance
            .filter(&company, "direct competitors and market position", gathered)
            .await;

        let prompt = build_prompt(
            record,
            &llm_helper::format_evidence(&evidence, ctx.config.evidence_char_budget),
        );
        let content = llm_helper::invoke(ctx, prompt, self.name()).await?;

        let output: CompetitorOutput = match llm_helper::parse_stage_response(&content) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(company = %company, error = %e, "competitor response unparseable, keeping raw text as profile");
                fallback_output(&content)
            }
        };

        set_if_filled(&mut record.main_competitors, output.main_competitors);
        set_if_filled(&mut record.competitor_profiles, output.competitor_profiles);
        set_if_filled(&mut record.market_positioning, output.market_positioning);
        set_if_filled(&mut record.product_comparison, output.product_comparison);
        set_if_filled(&mut record.unique_value_props, output.unique_value_props);
        set_if_filled(&mut record.threat_analysis, output.threat_analysis);
        set_if_filled(&mut record.market_share, output.market_share);

        record.reference_urls = if output.reference_urls.is_empty() {
            reference_urls_from(&evidence)
        } else {
            output.reference_urls
        };

        Ok(())
    }

    fn apply_failure(&self, record: &mut InvestmentRecord, error: &str) {
        record.main_competitors = "analysis failed".to_string();
        record.competitor_profiles = error.to_string();
    }
}
