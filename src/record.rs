//! Investment record schema
//!
//! This module defines the single mutable record threaded through the
//! analysis pipeline. Each stage owns a disjoint group of fields and is
//! the only writer of that group. The scoring trio (scores mapping,
//! weighted total, decision) is never written directly: stages go
//! through [`InvestmentRecord::apply_scores`], which recomputes the
//! total from the fixed weight table and derives the decision.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use thiserror::Error;

/// Fixed weight table for the six scoring criteria. Sums to 1.0.
pub const SCORE_WEIGHTS: [(&str, f64); 6] = [
    ("owner", 0.30),
    ("market", 0.25),
    ("product", 0.15),
    ("competitor", 0.10),
    ("performance", 0.10),
    ("deal", 0.10),
];

/// Weighted total at or above this recommends investment.
pub const RECOMMEND_THRESHOLD: f64 = 74.0;

/// Score substituted for criteria the model failed to return.
pub const DEFAULT_NEUTRAL_SCORE: f64 = 50.0;

fn deserialize_null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::deserialize(deserializer)?.unwrap_or_default())
}

/// Older checkpoints store funding history as a list of round objects
/// rather than prose; coerce anything non-string to its JSON text.
fn deserialize_flexible_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    })
}

/// Overwrite a text field only when the new value carries content.
/// A partial model response must not blank out a field an earlier
/// run filled.
pub(crate) fn set_if_filled(target: &mut String, value: String) {
    if !value.trim().is_empty() {
        *target = value;
    }
}

/// Final investment decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Recommend,
    Hold,
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Decision::Recommend => write!(f, "recommend"),
            Decision::Hold => write!(f, "hold"),
        }
    }
}

/// Errors raised when constructing a record
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("company_name must be non-empty")]
    EmptyCompanyName,

    #[error("invalid record shape: {0}")]
    Invalid(#[from] serde_json::Error),
}

/// Per-company analysis record
///
/// Field groups, by owning stage:
/// - Explore: owner, core_tech, pros, patents, investments
/// - TechSummary: tech_summary, strengths_and_weaknesses,
///   differentiation_points, technical_risks, patents_and_papers,
///   confidence_score
/// - MarketEval: industry_trends, market_size, regulatory_barriers,
///   customer_segments
/// - Competitor: main_competitors, competitor_profiles,
///   market_positioning, product_comparison, unique_value_props,
///   threat_analysis, market_share, reference_urls
/// - Invest: scores, total_score, decision (via `apply_scores` only)
/// - Report: report_path
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InvestmentRecord {
    /// Company identity; immutable after creation
    company_name: String,

    /// Founder / CEO background
    #[serde(default, deserialize_with = "deserialize_null_default")]
    #[serde(skip_serializing_if = "String::is_empty")]
    pub owner: String,
    /// Core technology or product
    #[serde(default, deserialize_with = "deserialize_null_default")]
    #[serde(skip_serializing_if = "String::is_empty")]
    pub core_tech: String,
    /// Strengths and selling points
    #[serde(default, deserialize_with = "deserialize_null_default")]
    #[serde(skip_serializing_if = "String::is_empty")]
    pub pros: String,
    /// Patent holdings as described in disclosures
    #[serde(default, deserialize_with = "deserialize_null_default")]
    #[serde(skip_serializing_if = "String::is_empty")]
    pub patents: String,
    /// Funding history
    #[serde(default, deserialize_with = "deserialize_flexible_text")]
    #[serde(skip_serializing_if = "String::is_empty")]
    pub investments: String,

    /// Technology summary from the tech stage
    #[serde(default, deserialize_with = "deserialize_null_default")]
    #[serde(skip_serializing_if = "String::is_empty")]
    pub tech_summary: String,
    /// Technical strengths and weaknesses
    #[serde(default, deserialize_with = "deserialize_null_default")]
    #[serde(skip_serializing_if = "String::is_empty")]
    pub strengths_and_weaknesses: String,
    /// What differentiates the technology
    #[serde(default, deserialize_with = "deserialize_null_default")]
    #[serde(skip_serializing_if = "String::is_empty")]
    pub differentiation_points: String,
    /// Known technical risks
    #[serde(default, deserialize_with = "deserialize_null_default")]
    #[serde(skip_serializing_if = "String::is_empty")]
    pub technical_risks: String,
    /// Patent and paper identifiers backing the summary
    #[serde(default, deserialize_with = "deserialize_null_default")]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub patents_and_papers: Vec<String>,
    /// Confidence total from the existence-validation gate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence_score: Option<f64>,

    /// Industry trend summary
    #[serde(default, deserialize_with = "deserialize_null_default")]
    #[serde(skip_serializing_if = "String::is_empty")]
    pub industry_trends: String,
    /// Market size and growth
    #[serde(default, deserialize_with = "deserialize_null_default")]
    #[serde(skip_serializing_if = "String::is_empty")]
    pub market_size: String,
    /// Regulatory barriers
    #[serde(default, deserialize_with = "deserialize_null_default")]
    #[serde(skip_serializing_if = "String::is_empty")]
    pub regulatory_barriers: String,
    /// Customer segments
    #[serde(default, deserialize_with = "deserialize_null_default")]
    #[serde(skip_serializing_if = "String::is_empty")]
    pub customer_segments: String,

    /// Most direct competitor(s)
    #[serde(default, deserialize_with = "deserialize_null_default")]
    #[serde(skip_serializing_if = "String::is_empty")]
    pub main_competitors: String,
    /// Competitor profile text
    #[serde(default, deserialize_with = "deserialize_null_default")]
    #[serde(skip_serializing_if = "String::is_empty")]
    pub competitor_profiles: String,
    /// Relative market positioning
    #[serde(default, deserialize_with = "deserialize_null_default")]
    #[serde(skip_serializing_if = "String::is_empty")]
    pub market_positioning: String,
    /// Product-level comparison
    #[serde(default, deserialize_with = "deserialize_null_default")]
    #[serde(skip_serializing_if = "String::is_empty")]
    pub product_comparison: String,
    /// Unique value propositions vs the competitor
    #[serde(default, deserialize_with = "deserialize_null_default")]
    #[serde(skip_serializing_if = "String::is_empty")]
    pub unique_value_props: String,
    /// Competitive threat analysis
    #[serde(default, deserialize_with = "deserialize_null_default")]
    #[serde(skip_serializing_if = "String::is_empty")]
    pub threat_analysis: String,
    /// Market share estimate
    /// Canonical spelling; older checkpoints used "MarketShare".
    #[serde(default, deserialize_with = "deserialize_null_default")]
    #[serde(skip_serializing_if = "String::is_empty", alias = "MarketShare")]
    pub market_share: String,
    /// Sources cited by the competitor stage
    #[serde(default, deserialize_with = "deserialize_null_default")]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub reference_urls: Vec<String>,

    /// Criterion scores, 0-100 each; written via `apply_scores`
    #[serde(default, deserialize_with = "deserialize_null_default")]
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    scores: BTreeMap<String, u8>,
    /// Weighted total; recomputed, never set directly
    #[serde(skip_serializing_if = "Option::is_none")]
    total_score: Option<f64>,
    /// Derived decision
    #[serde(skip_serializing_if = "Option::is_none")]
    decision: Option<Decision>,

    /// Path of the generated report, when one was produced
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_path: Option<PathBuf>,
}

impl InvestmentRecord {
    /// Creates a fresh record for one company.
    pub fn new(company_name: impl Into<String>) -> Result<Self, RecordError> {
        let company_name = company_name.into().trim().to_string();
        if company_name.is_empty() {
            return Err(RecordError::EmptyCompanyName);
        }
        Ok(Self {
            company_name,
            ..Default::default()
        })
    }

    /// Restores a record from a checkpoint entry.
    pub fn from_value(value: serde_json::Value) -> Result<Self, RecordError> {
        let record: Self = serde_json::from_value(value)?;
        if record.company_name.trim().is_empty() {
            return Err(RecordError::EmptyCompanyName);
        }
        Ok(record)
    }

    /// Serializes the record for checkpointing. Empty fields are
    /// omitted so a merge never clobbers data this run did not produce.
    pub fn to_value(&self) -> Result<serde_json::Value, RecordError> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn company_name(&self) -> &str {
        &self.company_name
    }

    /// Applies raw model scores: clamps each criterion to [0,100],
    /// substitutes the neutral default for missing criteria, drops
    /// unknown criteria, then recomputes the weighted total and derives
    /// the decision against `threshold`.
    pub fn apply_scores(&mut self, raw: &BTreeMap<String, f64>, threshold: f64) {
        let mut scores = BTreeMap::new();
        let mut total = 0.0;

        for (criterion, weight) in SCORE_WEIGHTS {
            let value = raw
                .get(criterion)
                .copied()
                .unwrap_or(DEFAULT_NEUTRAL_SCORE)
                .clamp(0.0, 100.0)
                .round();
            total += value * weight;
            scores.insert(criterion.to_string(), value as u8);
        }

        self.scores = scores;
        self.total_score = Some(total);
        self.decision = Some(if total >= threshold {
            Decision::Recommend
        } else {
            Decision::Hold
        });
    }

    pub fn scores(&self) -> &BTreeMap<String, u8> {
        &self.scores
    }

    pub fn total_score(&self) -> Option<f64> {
        self.total_score
    }

    pub fn decision(&self) -> Option<Decision> {
        self.decision
    }
}
