//! Pipeline controller: fixed-order stage execution for one company
//!
//! Stages run in a fixed linear order. A stage failure is absorbed:
//! the stage's failure placeholder is written into the record and the
//! controller advances, so one broken provider never aborts a
//! company's analysis.

use std::sync::Arc;
use std::time::Instant;

use super::context::StageContext;
use super::stage::{AnalysisStage, StageId};
use super::stages::{
    CompetitorStage, ExploreStage, InvestStage, MarketEvalStage, ReportStage, TechSummaryStage,
};
use crate::progress::{NoOpHandler, ProgressEvent, ProgressHandler};
use crate::record::InvestmentRecord;
use tracing::{debug, info};

/// One absorbed stage failure, reported after the run
#[derive(Debug, Clone)]
pub struct StageFailure {
    pub stage: String,
    pub error: String,
}

pub struct PipelineController {
    context: StageContext,
    progress: Arc<dyn ProgressHandler>,
}

impl PipelineController {
    pub fn new(context: StageContext) -> Self {
        Self {
            context,
            progress: Arc::new(NoOpHandler),
        }
    }

    pub fn with_progress(mut self, handler: Arc<dyn ProgressHandler>) -> Self {
        self.progress = handler;
        self
    }

    pub fn context(&self) -> &StageContext {
        &self.context
    }

    /// Stage ids to run, in order. `from` starts the run at a later
    /// stage when resuming from a checkpoint.
    pub fn stage_sequence(from: Option<StageId>) -> Vec<StageId> {
        let all = StageId::all();
        match from {
            None => all.to_vec(),
            Some(start) => all.iter().copied().skip_while(|id| *id != start).collect(),
        }
    }

    fn build_stage(id: StageId) -> Box<dyn AnalysisStage> {
        match id {
            StageId::Explore => Box::new(ExploreStage),
            StageId::TechSummary => Box::new(TechSummaryStage),
            StageId::MarketEval => Box::new(MarketEvalStage),
            StageId::Competitor => Box::new(CompetitorStage),
            StageId::Invest => Box::new(InvestStage),
            StageId::Report => Box::new(ReportStage),
        }
    }

    /// Run the full pipeline against one record.
    pub async fn run(&self, record: &mut InvestmentRecord) -> Vec<StageFailure> {
        self.run_from(record, None).await
    }

    /// Run the pipeline starting at `from` (or the beginning).
    pub async fn run_from(
        &self,
        record: &mut InvestmentRecord,
        from: Option<StageId>,
    ) -> Vec<StageFailure> {
        let stages: Vec<Box<dyn AnalysisStage>> = Self::stage_sequence(from)
            .into_iter()
            .map(Self::build_stage)
            .collect();

        let start = Instant::now();
        info!(
            company = %record.company_name(),
            stages = stages.len(),
            "Running analysis pipeline"
        );

        let failures = self.run_stages(record, &stages).await;

        debug!(
            company = %record.company_name(),
            duration_ms = start.elapsed().as_millis(),
            failures = failures.len(),
            "Pipeline complete"
        );
        failures
    }

    async fn run_stages(
        &self,
        record: &mut InvestmentRecord,
        stages: &[Box<dyn AnalysisStage>],
    ) -> Vec<StageFailure> {
        let company = record.company_name().to_string();
        let mut failures = Vec::new();
        let mut had_report = record.report_path.is_some();

        for stage in stages {
            let name = stage.name();
            self.progress.on_progress(&ProgressEvent::StageStarted {
                company: company.clone(),
                stage: name.to_string(),
            });

            let stage_start = Instant::now();
            match stage.execute(record, &self.context).await {
                Ok(()) => {
                    self.progress.on_progress(&ProgressEvent::StageCompleted {
                        company: company.clone(),
                        stage: name.to_string(),
                        duration: stage_start.elapsed(),
                    });
                    if !had_report {
                        if let Some(path) = &record.report_path {
                            had_report = true;
                            self.progress.on_progress(&ProgressEvent::ReportGenerated {
                                company: company.clone(),
                                path: path.clone(),
                            });
                        }
                    }
                    debug!(company = %company, stage = name, "Stage complete");
                }
                Err(e) => {
                    let error = format!("{:#}", e);
                    stage.apply_failure(record, &error);
                    self.progress.on_progress(&ProgressEvent::StageFailed {
                        company: company.clone(),
                        stage: name.to_string(),
                        error: error.clone(),
                    });
                    failures.push(StageFailure {
                        stage: name.to_string(),
                        error,
                    });
                }
            }
        }

        failures
    }
}
