//! Pipeline context for managing dependencies

use std::path::PathBuf;
use std::sync::Arc;

use crate::llm::LLMClient;
use crate::search::{EvidenceGatherer, RelevanceFilter};

use super::config::PipelineConfig;
use super::confidence::ConfidenceScorer;

/// Context that owns all long-lived stage dependencies
pub struct StageContext {
    /// LLM client for stage prompts
    pub llm: Arc<dyn LLMClient>,

    /// Evidence retrieval over index / web / patents
    pub gatherer: Arc<EvidenceGatherer>,

    /// Relevance screening for gathered evidence
    pub relevance: RelevanceFilter,

    /// Confidence scoring for the tech stage gate
    pub confidence: ConfidenceScorer,

    /// Pipeline configuration
    pub config: PipelineConfig,

    /// Directory where reports are written
    pub reports_dir: PathBuf,
}

impl StageContext {
    /// Create a new stage context. The relevance filter and confidence
    /// scorer are derived from the config so all stages share one
    /// consistent setup.
    pub fn new(
        llm: Arc<dyn LLMClient>,
        gatherer: Arc<EvidenceGatherer>,
        config: PipelineConfig,
        reports_dir: PathBuf,
    ) -> Self {
        let relevance = RelevanceFilter::new(llm.clone(), config.relevance_top_k);
        let confidence = ConfidenceScorer::new(config.confidence_gate);

        Self {
            llm,
            gatherer,
            relevance,
            confidence,
            config,
            reports_dir,
        }
    }
}
