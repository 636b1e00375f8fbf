//! Stage 6: Report
//!
//! Renders the Markdown report for recommended companies and records
//! where it landed. Held companies get no report and no report_path.
//! The executive summary is the only model call here and it degrades
//! softly: a summary failure must not block a report the scores earned.

use super::llm_helper;
use crate::pipeline::context::StageContext;
use crate::pipeline::stage::AnalysisStage;
use crate::record::{Decision, InvestmentRecord};
use crate::report;
use anyhow::Result;
use async_trait::async_trait;
use tracing::{debug, warn};

fn build_summary_prompt(record_json: &str) -> String {
    format!(
        r#"You are writing the executive summary of an investment evaluation report.

Analysis record:
{}

Write 3-5 sentences for an investment committee: what the company does, why the scores came out as they did, and the decision. Plain prose, no headings, no bullet points.
"#,
        record_json
    )
}

pub struct ReportStage;

#[async_trait]
impl AnalysisStage for ReportStage {
    fn name(&self) -> &'static str {
        "ReportStage"
    }

    async fn execute(&self, record: &mut InvestmentRecord, ctx: &StageContext) -> Result<()> {
        let company = record.company_name().to_string();

        if record.decision() != Some(Decision::Recommend) {
            debug!(
                company = %company,
                decision = ?record.decision(),
                "decision is not recommend, skipping report"
            );
            return Ok(());
        }

        let record_json = serde_json::to_string_pretty(&record.to_value()?)?;
        let executive_summary =
            match llm_helper::invoke(ctx, build_summary_prompt(&record_json), self.name()).await {
                Ok(summary) => summary,
                Err(e) => {
                    warn!(company = %company, error = %e, "executive summary failed, writing report without it");
                    String::new()
                }
            };

        let path = report::write_report(&ctx.reports_dir, record, &executive_summary)?;
        debug!(company = %company, path = %path.display(), "report written");
        record.report_path = Some(path);

        Ok(())
    }

    fn apply_failure(&self, record: &mut InvestmentRecord, error: &str) {
        // Never leave a path to a report that was not written.
        record.report_path = None;
        warn!(company = %record.company_name(), error, "report stage failed");
    }
}
