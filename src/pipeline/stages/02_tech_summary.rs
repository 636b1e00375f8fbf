//! Stage 2: TechSummary
//!
//! Validates that the claimed technology actually exists before paying
//! for deep analysis. Existence validation retrieves disclosure
//! evidence and scores it; a confident record earns the deep path
//! (mechanism, IP cross-check and competitive-landscape evidence
//! feeding one synthesis call), a thin one gets a basic summary from
//! whatever was found. Query revision is bounded so a company with no
//! footprint cannot loop forever.

use super::llm_helper;
use crate::pipeline::confidence::{AnalysisDepth, ConfidenceBreakdown, EvidenceSignals};
use crate::pipeline::context::StageContext;
use crate::pipeline::stage::AnalysisStage;
use crate::record::{set_if_filled, InvestmentRecord};
use crate::search::{EvidenceItem, SearchSource};
use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

const VALIDATION_RESULTS: usize = 5;
const SUBPHASE_RESULTS: usize = 3;

#[derive(Debug, Deserialize)]
struct TechOutput {
    #[serde(default)]
    tech_summary: String,
    #[serde(default)]
    strengths_and_weaknesses: String,
    #[serde(default)]
    differentiation_points: String,
    #[serde(default)]
    technical_risks: String,
    #[serde(default)]
    patents_and_papers: Vec<String>,
}

fn fallback_output() -> TechOutput {
    TechOutput {
        tech_summary: "N/A".to_string(),
        strengths_and_weaknesses: "N/A".to_string(),
        differentiation_points: "N/A".to_string(),
        technical_risks: "N/A".to_string(),
        patents_and_papers: Vec::new(),
    }
}

/// Validation query for a given revision round. Each round rephrases
/// rather than repeats, so a retry has a chance of hitting differently
/// indexed passages.
fn validation_query(record: &InvestmentRecord, revision: usize) -> String {
    let company = record.company_name();
    let core_tech = record.core_tech.trim();

    match revision {
        0 if !core_tech.is_empty() => format!("{} {}", company, core_tech),
        0 => format!("{} core technology", company),
        1 => format!("{} patents registered technology", company),
        _ => format!("{} product launch technology verification", company),
    }
}

fn registry_keyword(record: &InvestmentRecord) -> String {
    let core_tech = record.core_tech.trim();
    if core_tech.is_empty() {
        record.company_name().to_string()
    } else {
        core_tech.to_string()
    }
}

fn build_deep_prompt(
    record: &InvestmentRecord,
    validation: &str,
    mechanism: &str,
    ip: &str,
    competitive: &str,
) -> String {
    format!(
        r#"You are a technology due-diligence analyst. The company below passed an existence check; produce a deep technical assessment.

Company: {}
Claimed core technology: {}
Claimed patents: {}
Funding history: {}

Validation evidence:
{}

Mechanism evidence:
{}

IP / registry evidence:
{}

Competitive-landscape evidence:
{}

Respond with JSON:
{{
  "tech_summary": "what the technology is and how mature it is",
  "strengths_and_weaknesses": "technical strengths and weaknesses",
  "differentiation_points": "what sets it apart from the state of the art",
  "technical_risks": "failure modes, scaling risks, dependency risks",
  "patents_and_papers": ["identifier or title", "..."]
}}

IMPORTANT:
- Respond with the JSON object only, no surrounding prose
- Cite only patents and papers that appear in the evidence
- Use an empty string for anything the evidence does not support
"#,
        record.company_name(),
        record.core_tech,
        record.patents,
        record.investments,
        validation,
        mechanism,
        ip,
        competitive
    )
}

fn build_basic_prompt(record: &InvestmentRecord, validation: &str) -> String {
    format!(
        r#"You are a technology due-diligence analyst. Evidence for the company below is thin, so give a cautious basic summary and say plainly what could not be verified.

Company: {}
Claimed core technology: {}
Claimed patents: {}

Retrieved evidence:
{}

Respond with JSON:
{{
  "tech_summary": "what can be said about the technology from the evidence",
  "strengths_and_weaknesses": "strengths and weaknesses, hedged where unverified",
  "differentiation_points": "differentiation, if any is supportable",
  "technical_risks": "risks, including the risk that the claims are unverified",
  "patents_and_papers": []
}}

IMPORTANT:
- Respond with the JSON object only, no surrounding prose
- Do not invent patents, papers, or capabilities
"#,
        record.company_name(),
        record.core_tech,
        record.patents,
        validation
    )
}

pub struct TechSummaryStage;

impl TechSummaryStage {
    /// One validation round: gather from the index, filter, score.
    async fn validation_round(
        &self,
        record: &InvestmentRecord,
        ctx: &StageContext,
        revision: usize,
    ) -> (Vec<EvidenceItem>, ConfidenceBreakdown) {
        let company = record.company_name().to_string();
        let source = SearchSource::Index {
            company: company.clone(),
        };

        let query = validation_query(record, revision);
        let gathered = ctx.gatherer.search(&query, &source, VALIDATION_RESULTS).await;
        let gathered_count = gathered.len();

        let kept = ctx
            .relevance
            .filter(&company, "technology existence and maturity", gathered)
            .await;

        let signals = EvidenceSignals {
            gathered: gathered_count,
            relevant: kept.len(),
        };
        let evidence_text =
            llm_helper::format_evidence(&kept, ctx.config.evidence_char_budget);
        let breakdown = ctx.confidence.score(&signals, record, &evidence_text);

        debug!(
            company = %company,
            revision,
            gathered = gathered_count,
            relevant = kept.len(),
            confidence = breakdown.total,
            "existence validation round"
        );

        (kept, breakdown)
    }

    /// Extra evidence for the deep path, already relevance-filtered.
    async fn deep_evidence(
        &self,
        record: &InvestmentRecord,
        ctx: &StageContext,
    ) -> (String, String, String) {
        let company = record.company_name().to_string();
        let budget = ctx.config.evidence_char_budget;

        let index_source = SearchSource::Index {
            company: company.clone(),
        };
        let mechanism = ctx
            .gatherer
            .search(
                &format!("how {} works architecture", registry_keyword(record)),
                &index_source,
                SUBPHASE_RESULTS,
            )
            .await;
        let mechanism = ctx
            .relevance
            .filter(&company, "technical mechanism", mechanism)
            .await;

        let ip = ctx
            .gatherer
            .search(
                &registry_keyword(record),
                &SearchSource::PatentRegistry,
                SUBPHASE_RESULTS,
            )
            .await;

        let competitive = ctx
            .gatherer
            .search(
                &format!("{} competing approaches alternatives", registry_keyword(record)),
                &SearchSource::web(),
                SUBPHASE_RESULTS,
            )
            .await;
        let competitive = ctx
            .relevance
            .filter(&company, "competing technology", competitive)
            .await;

        (
            llm_helper::format_evidence(&mechanism, budget),
            llm_helper::format_evidence(&ip, budget),
            llm_helper::format_evidence(&competitive, budget),
        )
    }
}

#[async_trait]
impl AnalysisStage for TechSummaryStage {
    fn name(&self) -> &'static str {
        "TechSummaryStage"
    }

    async fn execute(&self, record: &mut InvestmentRecord, ctx: &StageContext) -> Result<()> {
        let company = record.company_name().to_string();

        // Existence validation with bounded query revision. A revision
        // can regress, so synthesis uses the best round seen.
        let (mut best_evidence, mut best) = self.validation_round(record, ctx, 0).await;
        let mut revision = 0;
        while ctx.confidence.gate(&best) == AnalysisDepth::Basic
            && revision < ctx.config.max_query_revisions
        {
            revision += 1;
            let (evidence, breakdown) = self.validation_round(record, ctx, revision).await;
            if breakdown.total > best.total {
                best_evidence = evidence;
                best = breakdown;
            }
        }

        let depth = ctx.confidence.gate(&best);
        debug!(
            company = %company,
            confidence = best.total,
            evidence_quality = best.evidence_quality,
            field_completeness = best.field_completeness,
            identifier_specificity = best.identifier_specificity,
            depth = depth.as_str(),
            "existence validation settled"
        );

        let validation_text =
            llm_helper::format_evidence(&best_evidence, ctx.config.evidence_char_budget);
        let prompt = match depth {
            AnalysisDepth::Deep => {
                let (mechanism, ip, competitive) = self.deep_evidence(record, ctx).await;
                build_deep_prompt(record, &validation_text, &mechanism, &ip, &competitive)
            }
            AnalysisDepth::Basic => build_basic_prompt(record, &validation_text),
        };

        let content = llm_helper::invoke(ctx, prompt, self.name()).await?;
        let output: TechOutput = match llm_helper::parse_stage_response(&content) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(company = %company, error = %e, "tech summary response unparseable, using fallback");
                fallback_output()
            }
        };

        set_if_filled(&mut record.tech_summary, output.tech_summary);
        set_if_filled(
            &mut record.strengths_and_weaknesses,
            output.strengths_and_weaknesses,
        );
        set_if_filled(
            &mut record.differentiation_points,
            output.differentiation_points,
        );
        set_if_filled(&mut record.technical_risks, output.technical_risks);
        if !output.patents_and_papers.is_empty() {
            record.patents_and_papers = output.patents_and_papers;
        }
        record.confidence_score = Some(best.total);

        Ok(())
    }

    fn apply_failure(&self, record: &mut InvestmentRecord, error: &str) {
        record.tech_summary = "analysis failed".to_string();
        record.technical_risks = error.to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockResponse;
    use serde_json::json;

    fn record_with_tech() -> InvestmentRecord {
        let mut record = InvestmentRecord::new("Acme Health").unwrap();
        record.core_tech = "continuous glucose biosensor".to_string();
        record
    }

    #[test]
    fn test_validation_query_revisions_differ() {
        let record = record_with_tech();
        let queries: Vec<String> = (0..3).map(|r| validation_query(&record, r)).collect();

        assert_eq!(queries[0], "Acme Health continuous glucose biosensor");
        assert_ne!(queries[0], queries[1]);
        assert_ne!(queries[1], queries[2]);
    }

    #[test]
    fn test_validation_query_without_core_tech() {
        let record = InvestmentRecord::new("Acme Health").unwrap();
        assert_eq!(validation_query(&record, 0), "Acme Health core technology");
    }

    #[test]
    fn test_deep_prompt_embeds_sections() {
        let record = record_with_tech();
        let prompt = build_deep_prompt(&record, "val-ev", "mech-ev", "ip-ev", "comp-ev");

        assert!(prompt.contains("Company: Acme Health"));
        assert!(prompt.contains("val-ev"));
        assert!(prompt.contains("mech-ev"));
        assert!(prompt.contains("ip-ev"));
        assert!(prompt.contains("comp-ev"));
        assert!(prompt.contains("\"patents_and_papers\""));
    }

    #[test]
    fn test_basic_prompt_mentions_unverified() {
        let record = record_with_tech();
        let prompt = build_basic_prompt(&record, "");
        assert!(prompt.contains("could not be verified"));
        assert!(prompt.contains("Do not invent"));
    }

    #[test]
    fn test_fallback_marks_fields() {
        let output = fallback_output();
        assert_eq!(output.tech_summary, "N/A");
        assert_eq!(output.technical_risks, "N/A");
        assert!(output.patents_and_papers.is_empty());
    }

    #[tokio::test]
    async fn test_execute_basic_path_with_no_evidence() {
        let (ctx, llm, _tmp) = StageContext::with_mocks();
        llm.add_response(MockResponse::json(json!({
            "tech_summary": "biosensor platform, maturity unverified",
            "strengths_and_weaknesses": "no independent evidence found",
            "differentiation_points": "",
            "technical_risks": "claims unverified",
            "patents_and_papers": []
        })));

        let mut record = record_with_tech();
        TechSummaryStage.execute(&mut record, &ctx).await.unwrap();

        // No evidence anywhere: every validation round scores low, so
        // only the one synthesis call reaches the model.
        assert_eq!(llm.call_count(), 1);
        assert_eq!(record.tech_summary, "biosensor platform, maturity unverified");
        assert_eq!(record.technical_risks, "claims unverified");
        let confidence = record.confidence_score.unwrap();
        assert!(confidence < ctx.config.confidence_gate);
    }

    #[tokio::test]
    async fn test_execute_parse_failure_falls_back() {
        let (ctx, llm, _tmp) = StageContext::with_mocks();
        llm.add_response(MockResponse::text("I cannot answer that."));

        let mut record = record_with_tech();
        TechSummaryStage.execute(&mut record, &ctx).await.unwrap();

        assert_eq!(record.tech_summary, "N/A");
        assert_eq!(record.strengths_and_weaknesses, "N/A");
        assert!(record.confidence_score.is_some());
    }

    #[test]
    fn test_failure_placeholder() {
        let mut record = record_with_tech();
        TechSummaryStage.apply_failure(&mut record, "LLM call failed in TechSummaryStage");

        assert_eq!(record.tech_summary, "analysis failed");
        assert!(record.technical_risks.contains("failed"));
        assert_eq!(record.core_tech, "continuous glucose biosensor");
    }
}
