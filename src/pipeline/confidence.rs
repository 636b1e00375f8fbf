//! Confidence scoring for the tech stage's existence-validation gate
//!
//! Aggregates three sub-signals into a [0,100] total: retrieval quality
//! of the validation evidence (40%), completeness of the explore-stage
//! fields (35%), and specificity of patent / funding identifiers (25%).
//! The total drives a one-shot two-state gate: at or above the
//! threshold the tech stage runs its deep sub-pipeline, below it a
//! basic summary path. No retries, no intermediate states.

use crate::record::InvestmentRecord;
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::OnceLock;

const EVIDENCE_WEIGHT: f64 = 0.40;
const COMPLETENESS_WEIGHT: f64 = 0.35;
const IDENTIFIER_WEIGHT: f64 = 0.25;

/// Relevant-evidence count at which the volume signal saturates
const EVIDENCE_SATURATION: usize = 4;

fn patent_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)\b(?:(?:KR|US|EP|JP|CN)[-\s]?\d{2,4}[-\s]?\d{3,}|\d{2}-\d{4}-\d{7})\b")
            .expect("patent id pattern")
    })
}

fn year_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\b(?:19|20)\d{2}\b").expect("year pattern"))
}

fn funding_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)\bseed\b|\bseries\s+[a-z]\b|\bround\b|\bmillion\b|\bbillion\b|\busd\b|\$\s?\d")
            .expect("funding pattern")
    })
}

/// Which analysis path the gate selected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisDepth {
    Deep,
    Basic,
}

impl AnalysisDepth {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisDepth::Deep => "deep",
            AnalysisDepth::Basic => "basic",
        }
    }
}

/// Retrieval counts observed during existence validation
#[derive(Debug, Clone, Copy, Default)]
pub struct EvidenceSignals {
    /// Items returned by the gatherer
    pub gathered: usize,
    /// Items the relevance filter kept
    pub relevant: usize,
}

/// Per-signal contributions plus the weighted total
#[derive(Debug, Clone, Copy)]
pub struct ConfidenceBreakdown {
    pub evidence_quality: f64,
    pub field_completeness: f64,
    pub identifier_specificity: f64,
    pub total: f64,
}

pub struct ConfidenceScorer {
    gate_threshold: f64,
}

impl ConfidenceScorer {
    pub fn new(gate_threshold: f64) -> Self {
        Self { gate_threshold }
    }

    /// Scores the record against the validation evidence. Each
    /// sub-signal is clamped to [0,100] before weighting.
    pub fn score(
        &self,
        signals: &EvidenceSignals,
        record: &InvestmentRecord,
        evidence_text: &str,
    ) -> ConfidenceBreakdown {
        let evidence_quality = clamp_signal(evidence_quality(signals));
        let field_completeness = clamp_signal(field_completeness(record));
        let identifier_specificity = clamp_signal(identifier_specificity(record, evidence_text));

        let total = evidence_quality * EVIDENCE_WEIGHT
            + field_completeness * COMPLETENESS_WEIGHT
            + identifier_specificity * IDENTIFIER_WEIGHT;

        ConfidenceBreakdown {
            evidence_quality,
            field_completeness,
            identifier_specificity,
            total,
        }
    }

    /// One-shot depth decision for a breakdown.
    pub fn gate(&self, breakdown: &ConfidenceBreakdown) -> AnalysisDepth {
        if breakdown.total >= self.gate_threshold {
            AnalysisDepth::Deep
        } else {
            AnalysisDepth::Basic
        }
    }
}

fn clamp_signal(value: f64) -> f64 {
    value.clamp(0.0, 100.0)
}

/// Retrieval precision (60%) blended with relevant-result volume (40%).
/// No gathered evidence at all scores zero: nothing was verifiable.
fn evidence_quality(signals: &EvidenceSignals) -> f64 {
    if signals.gathered == 0 {
        return 0.0;
    }

    let precision = signals.relevant as f64 / signals.gathered as f64;
    let volume = signals.relevant.min(EVIDENCE_SATURATION) as f64 / EVIDENCE_SATURATION as f64;

    100.0 * (0.6 * precision + 0.4 * volume)
}

/// Share of the five explore-owned fields that hold content.
fn field_completeness(record: &InvestmentRecord) -> f64 {
    let fields = [
        &record.owner,
        &record.core_tech,
        &record.pros,
        &record.patents,
        &record.investments,
    ];

    let filled = fields.iter().filter(|f| !f.trim().is_empty()).count();
    100.0 * filled as f64 / fields.len() as f64
}

/// Concrete identifiers are the strongest existence evidence: distinct
/// patent-style registration numbers (25 each, capped at two), a year
/// in the funding history, and a funding-round token.
fn identifier_specificity(record: &InvestmentRecord, evidence_text: &str) -> f64 {
    let mut score = 0.0;

    let haystack = format!(
        "{} {} {}",
        record.patents,
        record.patents_and_papers.join(" "),
        evidence_text
    );
    let distinct: BTreeSet<String> = patent_id_pattern()
        .find_iter(&haystack)
        .map(|m| m.as_str().to_uppercase())
        .collect();
    score += 25.0 * distinct.len().min(2) as f64;

    if year_pattern().is_match(&record.investments) {
        score += 25.0;
    }
    if funding_pattern().is_match(&record.investments) {
        score += 25.0;
    }

    score
}
