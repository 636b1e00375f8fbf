//! Checkpoint persistence
//!
//! Batch runs interchange state through a JSON array of per-company
//! objects. Re-running a later stage locates a company by exact
//! company_name match and merges that run's output into the existing
//! object: new fields are added, stage-owned fields are overwritten,
//! and everything else (including keys this codebase does not know
//! about) is preserved untouched.

use crate::record::InvestmentRecord;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("checkpoint io failed for {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("checkpoint is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("checkpoint root must be a JSON array of company objects: {}", .0.display())]
    NotAnArray(PathBuf),

    #[error("record serialization failed: {0}")]
    Record(#[from] crate::record::RecordError),
}

/// File-backed checkpoint store
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    path: PathBuf,
}

impl CheckpointStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the full company array. A missing file is an error: batch
    /// runs start from an ingested checkpoint, they do not invent one.
    pub fn load(&self) -> Result<Vec<Value>, CheckpointError> {
        let raw = fs::read_to_string(&self.path).map_err(|source| CheckpointError::Io {
            path: self.path.clone(),
            source,
        })?;

        let parsed: Value = serde_json::from_str(&raw)?;
        match parsed {
            Value::Array(entries) => {
                debug!(path = %self.path.display(), companies = entries.len(), "checkpoint loaded");
                Ok(entries)
            }
            _ => Err(CheckpointError::NotAnArray(self.path.clone())),
        }
    }

    /// Writes the array back atomically (temp file + rename).
    pub fn save(&self, entries: &[Value]) -> Result<(), CheckpointError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|source| CheckpointError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        let serialized = serde_json::to_string_pretty(entries)?;
        let tmp = self.path.with_extension("json.tmp");

        fs::write(&tmp, serialized).map_err(|source| CheckpointError::Io {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, &self.path).map_err(|source| CheckpointError::Io {
            path: self.path.clone(),
            source,
        })?;

        debug!(path = %self.path.display(), companies = entries.len(), "checkpoint saved");
        Ok(())
    }

    /// Merges one analyzed record into the in-memory array. Matches by
    /// exact company_name; appends a new entry when the company is not
    /// present yet.
    pub fn merge_record(
        entries: &mut Vec<Value>,
        record: &InvestmentRecord,
    ) -> Result<(), CheckpointError> {
        use serde::ser::Error as _;

        let update = match record.to_value()? {
            Value::Object(map) => map,
            _ => {
                return Err(CheckpointError::Parse(serde_json::Error::custom(
                    "record serialized to non-object",
                )))
            }
        };

        // Value::get returns None on non-objects, so a match here is
        // always an object entry.
        let existing = entries.iter_mut().find(|entry| {
            entry.get("company_name").and_then(Value::as_str) == Some(record.company_name())
        });

        if let Some(Value::Object(entry)) = existing {
            merge_fields(entry, update);
        } else {
            entries.push(Value::Object(update));
        }

        Ok(())
    }
}

fn merge_fields(existing: &mut Map<String, Value>, update: Map<String, Value>) {
    for (key, value) in update {
        existing.insert(key, value);
    }
}
