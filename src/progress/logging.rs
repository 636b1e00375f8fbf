//! Progress rendered as tracing output
//!
//! The default handler for CLI runs: per-stage chatter at debug,
//! company and batch milestones at info, failures at warn.

use super::{ProgressEvent, ProgressHandler};
use tracing::{debug, info, warn};

/// Turns each event into one tracing line at a level matching its weight.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingHandler;

impl ProgressHandler for LoggingHandler {
    fn on_progress(&self, event: &ProgressEvent) {
        match event {
            ProgressEvent::BatchStarted { run_id, companies } => {
                info!(run_id = %run_id, companies, "Starting batch run");
            }
            ProgressEvent::CompanyStarted {
                company,
                index,
                total,
            } => {
                info!(
                    company = %company,
                    progress = format!("{}/{}", index, total),
                    "Analyzing company"
                );
            }
            ProgressEvent::StageStarted { company, stage } => {
                debug!(company = %company, stage = %stage, "Starting stage");
            }
            ProgressEvent::StageCompleted {
                company,
                stage,
                duration,
            } => {
                debug!(
                    company = %company,
                    stage = %stage,
                    duration_ms = duration.as_millis(),
                    "Stage complete"
                );
            }
            ProgressEvent::StageFailed {
                company,
                stage,
                error,
            } => {
                warn!(
                    company = %company,
                    stage = %stage,
                    error = %error,
                    "Stage failed, continuing with placeholder"
                );
            }
            ProgressEvent::ReportGenerated { company, path } => {
                info!(company = %company, path = %path.display(), "Report written");
            }
            ProgressEvent::CompanyCompleted {
                company,
                index,
                total,
                duration,
            } => {
                info!(
                    company = %company,
                    progress = format!("{}/{}", index, total),
                    duration_ms = duration.as_millis(),
                    "Company analysis complete"
                );
            }
            ProgressEvent::BatchCompleted {
                companies,
                stage_failures,
                total_time,
            } => {
                if *stage_failures > 0 {
                    warn!(
                        companies,
                        stage_failures,
                        total_time_ms = total_time.as_millis(),
                        "Batch complete with stage failures"
                    );
                } else {
                    info!(
                        companies,
                        total_time_ms = total_time.as_millis(),
                        "Batch complete"
                    );
                }
            }
        }
    }
}
