pub mod confidence;
pub mod config;
pub mod context;
pub mod orchestrator;
pub mod stage;
pub mod stages;

pub use confidence::{AnalysisDepth, ConfidenceBreakdown, ConfidenceScorer, EvidenceSignals};
pub use config::PipelineConfig;
pub use context::StageContext;
pub use orchestrator::{PipelineController, StageFailure};
pub use stage::{AnalysisStage, StageId};
