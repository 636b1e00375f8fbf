use crate::record::RECOMMEND_THRESHOLD;

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Max evidence items classified by the relevance filter per stage call
    pub relevance_top_k: usize,
    /// Character budget for evidence text embedded in a stage prompt
    pub evidence_char_budget: usize,
    /// Max broadened re-queries per tech-stage execution
    pub max_query_revisions: usize,
    /// Confidence total required for the deep tech analysis path
    pub confidence_gate: f64,
    /// Weighted total required to recommend and generate a report
    pub recommend_threshold: f64,
    /// Sampling temperature for stage prompts
    pub temperature: f32,
    /// Token cap for stage responses
    pub max_output_tokens: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            relevance_top_k: 5,
            evidence_char_budget: 1200,
            max_query_revisions: 2,
            confidence_gate: 70.0,
            recommend_threshold: RECOMMEND_THRESHOLD,
            temperature: 0.0,
            max_output_tokens: 1200,
        }
    }
}

impl PipelineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_relevance_top_k(mut self, top_k: usize) -> Self {
        self.relevance_top_k = top_k;
        self
    }

    pub fn with_evidence_char_budget(mut self, budget: usize) -> Self {
        self.evidence_char_budget = budget;
        self
    }

    pub fn with_max_query_revisions(mut self, revisions: usize) -> Self {
        self.max_query_revisions = revisions;
        self
    }

    pub fn with_confidence_gate(mut self, gate: f64) -> Self {
        self.confidence_gate = gate;
        self
    }

    pub fn with_recommend_threshold(mut self, threshold: f64) -> Self {
        self.recommend_threshold = threshold;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_output_tokens(mut self, max_tokens: u32) -> Self {
        self.max_output_tokens = max_tokens;
        self
    }
}
