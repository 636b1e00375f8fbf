//! Stage 3: MarketEval
//!
//! Sizes the market around the technology from recent web coverage:
//! industry trends, market size and growth, and the regulatory
//! environment, each on its own recency window. Market claims go stale
//! fast, so every query is windowed and nothing is cached.

use super::llm_helper;
use crate::pipeline::context::StageContext;
use crate::pipeline::stage::AnalysisStage;
use crate::record::{set_if_filled, InvestmentRecord};
use crate::search::SearchSource;
use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::warn;

const TRENDS_WINDOW_DAYS: u32 = 30;
const MARKET_SIZE_WINDOW_DAYS: u32 = 30;
const REGULATION_WINDOW_DAYS: u32 = 60;

#[derive(Debug, Deserialize)]
struct MarketOutput {
    #[serde(default)]
    industry_trends: String,
    #[serde(default)]
    market_size: String,
    #[serde(default)]
    regulatory_barriers: String,
    #[serde(default)]
    customer_segments: String,
}

fn fallback_output() -> MarketOutput {
    MarketOutput {
        industry_trends: "N/A".to_string(),
        market_size: "N/A".to_string(),
        regulatory_barriers: "N/A".to_string(),
        customer_segments: "N/A".to_string(),
    }
}

/// What the market queries are about: the summarized technology when
/// the tech stage produced one, the claimed core tech otherwise, and
/// the company name as a last resort.
fn market_subject(record: &InvestmentRecord) -> String {
    let tech_summary = record.tech_summary.trim();
    if !tech_summary.is_empty() {
        return tech_summary.to_string();
    }
    let core_tech = record.core_tech.trim();
    if !core_tech.is_empty() {
        return core_tech.to_string();
    }
    record.company_name().to_string()
}

/// The three windowed market queries: (query, source, max_results,
/// claim used for relevance screening).
fn market_queries(record: &InvestmentRecord) -> [(String, SearchSource, usize, &'static str); 3] {
    let subject = market_subject(record);
    [
        (
            format!("{} industry trends", subject),
            SearchSource::web_recent(TRENDS_WINDOW_DAYS),
            3,
            "industry trends",
        ),
        (
            format!("{} {} market size growth", subject, record.company_name()),
            SearchSource::web_recent(MARKET_SIZE_WINDOW_DAYS),
            2,
            "market size and growth rate",
        ),
        (
            format!("{} regulation policy", subject),
            SearchSource::web_recent(REGULATION_WINDOW_DAYS),
            2,
            "regulatory environment",
        ),
    ]
}

fn build_prompt(
    record: &InvestmentRecord,
    trends: &str,
    market_size: &str,
    regulation: &str,
) -> String {
    format!(
        r#"You are a market analyst assessing the commercial opportunity for a startup's technology.

Company: {}
Technology: {}

Industry-trend evidence:
{}

Market-size evidence:
{}

Regulatory evidence:
{}

Respond with JSON:
{{
  "industry_trends": "where the industry is heading and at what pace",
  "market_size": "market size and growth, with figures from the evidence",
  "regulatory_barriers": "regulatory hurdles and how binding they are",
  "customer_segments": "who buys this and why"
}}

IMPORTANT:
- Respond with the JSON object only, no surrounding prose
- Quote figures only when the evidence contains them
- Use an empty string for anything the evidence does not support
"#,
        record.company_name(),
        market_subject(record),
        trends,
        market_size,
        regulation
    )
}

pub struct MarketEvalStage;

#[async_trait]
impl AnalysisStage for MarketEvalStage {
    fn name(&self) -> &'static str {
        "MarketEvalStage"
    }

    async fn execute(&self, record: &mut InvestmentRecord, ctx: &StageContext) -> Result<()> {
        let company = record.company_name().to_string();
        let subject = market_subject(record);
        let budget = ctx.config.evidence_char_budget;

        let mut sections = Vec::with_capacity(3);
        for (query, source, max_results, claim) in market_queries(record) {
            let gathered = ctx.gatherer.search(&query, &source, max_results).await;
            let kept = ctx.relevance.filter(&subject, claim, gathered).await;
            sections.push(llm_helper::format_evidence(&kept, budget));
        }

        let prompt = build_prompt(record, &sections[0], &sections[1], &sections[2]);
        let content = llm_helper::invoke(ctx, prompt, self.name()).await?;

        let output: MarketOutput = match llm_helper::parse_stage_response(&content) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(company = %company, error = %e, "market response unparseable, using fallback");
                fallback_output()
            }
        };

        set_if_filled(&mut record.industry_trends, output.industry_trends);
        set_if_filled(&mut record.market_size, output.market_size);
        set_if_filled(&mut record.regulatory_barriers, output.regulatory_barriers);
        set_if_filled(&mut record.customer_segments, output.customer_segments);

        Ok(())
    }

    fn apply_failure(&self, record: &mut InvestmentRecord, error: &str) {
        record.industry_trends = "analysis failed".to_string();
        record.market_size = error.to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockResponse;
    use serde_json::json;

    #[test]
    fn test_market_subject_precedence() {
        let mut record = InvestmentRecord::new("Acme").unwrap();
        assert_eq!(market_subject(&record), "Acme");

        record.core_tech = "glucose biosensor".to_string();
        assert_eq!(market_subject(&record), "glucose biosensor");

        record.tech_summary = "CGM platform for chronic care".to_string();
        assert_eq!(market_subject(&record), "CGM platform for chronic care");
    }

    #[test]
    fn test_queries_use_windowed_web_search() {
        let mut record = InvestmentRecord::new("Acme").unwrap();
        record.core_tech = "glucose biosensor".to_string();

        let queries = market_queries(&record);

        let windows: Vec<Option<u32>> = queries
            .iter()
            .map(|(_, source, _, _)| match source {
                SearchSource::Web { recency_days, .. } => *recency_days,
                _ => panic!("market queries must hit the web"),
            })
            .collect();
        assert_eq!(windows, vec![Some(30), Some(30), Some(60)]);

        let caps: Vec<usize> = queries.iter().map(|(_, _, max, _)| *max).collect();
        assert_eq!(caps, vec![3, 2, 2]);

        assert!(queries[1].0.contains("Acme"));
    }

    #[test]
    fn test_prompt_embeds_sections() {
        let mut record = InvestmentRecord::new("Acme").unwrap();
        record.tech_summary = "CGM platform".to_string();

        let prompt = build_prompt(&record, "trend-ev", "size-ev", "reg-ev");
        assert!(prompt.contains("Technology: CGM platform"));
        assert!(prompt.contains("trend-ev"));
        assert!(prompt.contains("size-ev"));
        assert!(prompt.contains("reg-ev"));
        assert!(prompt.contains("\"customer_segments\""));
    }

    #[tokio::test]
    async fn test_execute_with_no_evidence() {
        let (ctx, llm, _tmp) = StageContext::with_mocks();
        llm.add_response(MockResponse::json(json!({
            "industry_trends": "telehealth adoption accelerating",
            "market_size": "no figures found",
            "regulatory_barriers": "device clearance required",
            "customer_segments": "chronic-care patients"
        })));

        let mut record = InvestmentRecord::new("Acme").unwrap();
        MarketEvalStage.execute(&mut record, &ctx).await.unwrap();

        assert_eq!(llm.call_count(), 1);
        assert_eq!(record.industry_trends, "telehealth adoption accelerating");
        assert_eq!(record.customer_segments, "chronic-care patients");
    }

    #[test]
    fn test_failure_placeholder() {
        let mut record = InvestmentRecord::new("Acme").unwrap();
        MarketEvalStage.apply_failure(&mut record, "timeout");

        assert_eq!(record.industry_trends, "analysis failed");
        assert_eq!(record.market_size, "timeout");
    }
}
