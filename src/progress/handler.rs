//! Observer seam for batch runs
//!
//! The batch driver and pipeline controller emit [`ProgressEvent`]s as
//! work advances; handlers decide what to make of them (log lines, a
//! terminal progress bar, capture in tests). Emitters never block on
//! handlers doing anything clever.

use std::path::PathBuf;
use std::time::Duration;

/// Everything observable about a batch run, in emission order.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// Batch run started
    BatchStarted { run_id: String, companies: usize },

    /// One company's pipeline started
    CompanyStarted {
        company: String,
        index: usize,
        total: usize,
    },

    /// A stage started for a company
    StageStarted { company: String, stage: String },

    /// A stage completed for a company
    StageCompleted {
        company: String,
        stage: String,
        duration: Duration,
    },

    /// A stage failed; the pipeline continues with a placeholder
    StageFailed {
        company: String,
        stage: String,
        error: String,
    },

    /// A report was rendered for a company
    ReportGenerated { company: String, path: PathBuf },

    /// One company's pipeline finished (with or without stage failures)
    CompanyCompleted {
        company: String,
        index: usize,
        total: usize,
        duration: Duration,
    },

    /// Batch run finished
    BatchCompleted {
        companies: usize,
        stage_failures: usize,
        total_time: Duration,
    },
}

/// Receives events as a run advances.
///
/// Handlers are shared across the driver and the controller, so they
/// must be callable from either without interior assumptions.
pub trait ProgressHandler: Send + Sync {
    fn on_progress(&self, event: &ProgressEvent);
}

/// Handler that discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpHandler;

impl ProgressHandler for NoOpHandler {
    fn on_progress(&self, _event: &ProgressEvent) {}
}
