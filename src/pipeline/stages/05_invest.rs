//! Stage 5: Invest
//!
//! Scores the fully-annotated record on the six fixed criteria and
//! derives the weighted total and recommend/hold decision. Unlike the
//! research stages this one gathers no evidence: the record itself is
//! the evidence, and the whole of it goes into the prompt.

use std::collections::BTreeMap;

use super::llm_helper;
use crate::pipeline::context::StageContext;
use crate::pipeline::stage::AnalysisStage;
use crate::record::{InvestmentRecord, DEFAULT_NEUTRAL_SCORE, RECOMMEND_THRESHOLD, SCORE_WEIGHTS};
use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use tracing::warn;

fn build_prompt(record_json: &str) -> String {
    format!(
        r#"You are an investment committee member. Score the startup below on each criterion, 0-100, from the analysis record alone.

Criteria and weights:
- owner (30%): founder and team track record, execution capability
- market (25%): market size, growth, and timing
- product (15%): product and technology strength
- competitor (10%): competitive position and defensibility
- performance (10%): traction and operating performance
- deal (10%): quality of the funding history and deal terms

Analysis record:
{}

Respond with JSON:
{{
  "owner": 0,
  "market": 0,
  "product": 0,
  "competitor": 0,
  "performance": 0,
  "deal": 0
}}

IMPORTANT:
- Respond with the JSON object only, no surrounding prose
- Every score is an integer between 0 and 100
- Score 50 for any criterion the record gives you nothing on
"#,
        record_json
    )
}

/// Pulls the criterion scores out of a parsed response. Tolerates a
/// nested `{"scores": ...}` envelope and numbers sent as strings.
fn extract_scores(value: &Value) -> BTreeMap<String, f64> {
    let object = match value.get("scores") {
        Some(Value::Object(nested)) => nested,
        _ => match value {
            Value::Object(map) => map,
            _ => return BTreeMap::new(),
        },
    };

    object
        .iter()
        .filter_map(|(key, raw)| {
            let number = raw
                .as_f64()
                .or_else(|| raw.as_str().and_then(|s| s.trim().parse().ok()));
            number.map(|n| (key.clone(), n))
        })
        .collect()
}

/// Every criterion at the neutral default. A failed scoring pass reads
/// as hold, not recommend.
fn neutral_scores() -> BTreeMap<String, f64> {
    SCORE_WEIGHTS
        .iter()
        .map(|(criterion, _)| (criterion.to_string(), DEFAULT_NEUTRAL_SCORE))
        .collect()
}

pub struct InvestStage;

#[async_trait]
impl AnalysisStage for InvestStage {
    fn name(&self) -> &'static str {
        "InvestStage"
    }

    async fn execute(&self, record: &mut InvestmentRecord, ctx: &StageContext) -> Result<()> {
        let company = record.company_name().to_string();

        let record_json = serde_json::to_string_pretty(&record.to_value()?)?;
        let prompt = build_prompt(&record_json);
        let content = llm_helper::invoke(ctx, prompt, self.name()).await?;

        let raw = match llm_helper::parse_stage_response::<Value>(&content) {
            Ok(value) => {
                let scores = extract_scores(&value);
                if scores.is_empty() {
                    warn!(company = %company, "score response had no numeric criteria, using neutral scores");
                    neutral_scores()
                } else {
                    scores
                }
            }
            Err(e) => {
                warn!(company = %company, error = %e, "score response unparseable, using neutral scores");
                neutral_scores()
            }
        };

        record.apply_scores(&raw, ctx.config.recommend_threshold);
        Ok(())
    }

    fn apply_failure(&self, record: &mut InvestmentRecord, _error: &str) {
        record.apply_scores(&neutral_scores(), RECOMMEND_THRESHOLD);
    }
}
