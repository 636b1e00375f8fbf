//! Stage 1: Explore
//!
//! Seeds the record from the company's indexed disclosures: founder
//! background, core technology, strengths, patent posture, funding
//! history. Falls back to a web search when the index has nothing for
//! the company.

use super::llm_helper;
use crate::pipeline::context::StageContext;
use crate::pipeline::stage::AnalysisStage;
use crate::record::{set_if_filled, InvestmentRecord};
use crate::search::SearchSource;
use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::warn;

const INDEX_RESULTS: usize = 5;
const WEB_FALLBACK_RESULTS: usize = 3;

#[derive(Debug, Default, Deserialize)]
struct ExploreOutput {
    #[serde(default)]
    owner: String,
    #[serde(default)]
    core_tech: String,
    #[serde(default)]
    pros: String,
    #[serde(default)]
    patents: String,
    #[serde(default)]
    investments: String,
}

pub struct ExploreStage;

fn build_prompt(company: &str, evidence: &str) -> String {
    format!(
        r#"You are an aggressive investment analyst profiling a startup.

Company: {}

Retrieved evidence:
{}

Using the evidence above (and only well-supported inference beyond it), profile the company.

Respond with JSON:
{{
  "owner": "founder / CEO and their track record",
  "core_tech": "the core technology or product",
  "pros": "strengths and selling points",
  "patents": "patent holdings and defensive posture",
  "investments": "funding history (rounds, amounts, years)"
}}

IMPORTANT:
- Respond with the JSON object only, no surrounding prose
- Use an empty string for anything the evidence does not support
"#,
        company, evidence
    )
}

#[async_trait]
impl AnalysisStage for ExploreStage {
    fn name(&self) -> &'static str {
        "ExploreStage"
    }

    async fn execute(&self, record: &mut InvestmentRecord, ctx: &StageContext) -> Result<()> {
        let company = record.company_name().to_string();

        let index_source = SearchSource::Index {
            company: company.clone(),
        };
        let mut gathered = ctx
            .gatherer
            .search(
                "core technology, founders, patents, funding history",
                &index_source,
                INDEX_RESULTS,
            )
            .await;

        if gathered.is_empty() {
            warn!(company = %company, "no indexed disclosures, falling back to web search");
            gathered = ctx
                .gatherer
                .search(
                    &format!("{} startup core technology funding", company),
                    &SearchSource::web(),
                    WEB_FALLBACK_RESULTS,
                )
                .await;
        }

        let evidence = ctx
            .relevance
            .filter(&company, "core technology and investment profile", gathered)
            .await;

        let prompt = build_prompt(
            &company,
            &llm_helper::format_evidence(&evidence, ctx.config.evidence_char_budget),
        );
        let content = llm_helper::invoke(ctx, prompt, self.name()).await?;

        let output: ExploreOutput = match llm_helper::parse_stage_response(&content) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(company = %company, error = %e, "explore response unparseable, keeping empty profile");
                ExploreOutput::default()
            }
        };

        set_if_filled(&mut record.owner, output.owner);
        set_if_filled(&mut record.core_tech, output.core_tech);
        set_if_filled(&mut record.pros, output.pros);
        set_if_filled(&mut record.patents, output.patents);
        set_if_filled(&mut record.investments, output.investments);

        Ok(())
    }

    fn apply_failure(&self, record: &mut InvestmentRecord, error: &str) {
        record.core_tech = "analysis failed".to_string();
        record.pros = error.to_string();
    }
}
