//! Batch driver: runs the pipeline over every company in a checkpoint
//!
//! Companies run strictly one after another, each on its own record.
//! The checkpoint is re-saved after every company so an interrupted
//! batch loses at most the company in flight.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::checkpoint::{CheckpointError, CheckpointStore};
use crate::pipeline::{PipelineController, StageId};
use crate::progress::{NoOpHandler, ProgressEvent, ProgressHandler};
use crate::record::InvestmentRecord;

/// Outcome of one batch run
#[derive(Debug, Clone)]
pub struct BatchSummary {
    pub run_id: String,
    pub companies: usize,
    pub skipped: usize,
    pub stage_failures: usize,
    pub reports_written: usize,
    pub duration: Duration,
}

pub struct BatchDriver {
    controller: PipelineController,
    store: CheckpointStore,
    progress: Arc<dyn ProgressHandler>,
    show_bar: bool,
}

fn entry_name(entry: &Value) -> Option<&str> {
    entry.get("company_name").and_then(Value::as_str)
}

impl BatchDriver {
    pub fn new(controller: PipelineController, store: CheckpointStore) -> Self {
        Self {
            controller,
            store,
            progress: Arc::new(NoOpHandler),
            show_bar: false,
        }
    }

    pub fn with_progress(mut self, handler: Arc<dyn ProgressHandler>) -> Self {
        self.progress = handler;
        self
    }

    pub fn with_progress_bar(mut self, enabled: bool) -> Self {
        self.show_bar = enabled;
        self
    }

    /// Run the pipeline for every company in the checkpoint, or for
    /// one named company. A named company absent from the checkpoint
    /// starts from a fresh record and is appended on save.
    pub async fn run(
        &self,
        from: Option<StageId>,
        company: Option<&str>,
    ) -> Result<BatchSummary> {
        let start = Instant::now();
        let run_id = Uuid::new_v4().to_string();

        let mut entries = match self.store.load() {
            Ok(entries) => entries,
            // A named company may start a brand-new checkpoint.
            Err(CheckpointError::Io { ref source, .. })
                if company.is_some() && source.kind() == std::io::ErrorKind::NotFound =>
            {
                debug!(path = %self.store.path().display(), "checkpoint missing, starting a new one");
                Vec::new()
            }
            Err(e) => return Err(e).context("loading checkpoint"),
        };

        let mut skipped = 0usize;
        let mut records: Vec<InvestmentRecord> = Vec::new();
        match company {
            Some(name) => {
                let existing = entries
                    .iter()
                    .find(|entry| entry_name(entry) == Some(name))
                    .cloned();
                match existing {
                    Some(entry) => match InvestmentRecord::from_value(entry) {
                        Ok(record) => records.push(record),
                        Err(e) => bail!("checkpoint entry for '{}' is malformed: {}", name, e),
                    },
                    None => records.push(InvestmentRecord::new(name)?),
                }
            }
            None => {
                for entry in &entries {
                    match InvestmentRecord::from_value(entry.clone()) {
                        Ok(record) => records.push(record),
                        Err(e) => {
                            warn!(error = %e, "skipping malformed checkpoint entry");
                            skipped += 1;
                        }
                    }
                }
            }
        }

        let total = records.len();
        self.progress.on_progress(&ProgressEvent::BatchStarted {
            run_id: run_id.clone(),
            companies: total,
        });

        let bar = if self.show_bar {
            ProgressBar::new(total as u64)
        } else {
            ProgressBar::hidden()
        };
        bar.set_style(
            ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len} {msg}")
                .expect("progress bar template"),
        );

        let mut stage_failures = 0usize;
        let mut reports_written = 0usize;

        for (index, mut record) in records.into_iter().enumerate() {
            let name = record.company_name().to_string();
            bar.set_message(name.clone());
            self.progress.on_progress(&ProgressEvent::CompanyStarted {
                company: name.clone(),
                index: index + 1,
                total,
            });

            let company_start = Instant::now();
            let failures = self.controller.run_from(&mut record, from).await;
            stage_failures += failures.len();
            if record.report_path.is_some() {
                reports_written += 1;
            }

            CheckpointStore::merge_record(&mut entries, &record)
                .with_context(|| format!("merging results for '{}'", name))?;
            self.store
                .save(&entries)
                .context("saving checkpoint after company")?;

            self.progress.on_progress(&ProgressEvent::CompanyCompleted {
                company: name,
                index: index + 1,
                total,
                duration: company_start.elapsed(),
            });
            bar.inc(1);
        }
        bar.finish_and_clear();

        let summary = BatchSummary {
            run_id,
            companies: total,
            skipped,
            stage_failures,
            reports_written,
            duration: start.elapsed(),
        };
        self.progress.on_progress(&ProgressEvent::BatchCompleted {
            companies: summary.companies,
            stage_failures: summary.stage_failures,
            total_time: summary.duration,
        });
        info!(
            run_id = %summary.run_id,
            companies = summary.companies,
            skipped = summary.skipped,
            stage_failures = summary.stage_failures,
            reports = summary.reports_written,
            duration_ms = summary.duration.as_millis(),
            "Batch run finished"
        );

        Ok(summary)
    }
}
