// Pipeline stage tracing
// Append-only JSONL trace of every stage of a beatmap invocation

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors that can occur during trace operations
#[derive(Debug, Error)]
pub enum TraceError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// Pipeline stage, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Adapt,
    Aggregate,
    Snap,
    Merge,
    Govern,
    Thin,
    Classify,
    Arrange,
    Assemble,
}

impl Stage {
    pub const ALL: [Stage; 9] = [
        Stage::Adapt,
        Stage::Aggregate,
        Stage::Snap,
        Stage::Merge,
        Stage::Govern,
        Stage::Thin,
        Stage::Classify,
        Stage::Arrange,
        Stage::Assemble,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Adapt => "adapt",
            Stage::Aggregate => "aggregate",
            Stage::Snap => "snap",
            Stage::Merge => "merge",
            Stage::Govern => "govern",
            Stage::Thin => "thin",
            Stage::Classify => "classify",
            Stage::Arrange => "arrange",
            Stage::Assemble => "assemble",
        }
    }

    /// Fraction of the pipeline done once this stage finishes
    pub fn progress(&self) -> f32 {
        let position = Stage::ALL.iter().position(|s| s == self).unwrap_or(0);
        (position + 1) as f32 / Stage::ALL.len() as f32
    }
}

/// A single trace entry in the pipeline execution log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceEntry {
    /// RFC 3339 timestamp of when this entry was created
    pub timestamp: String,

    /// Stage name (e.g., "snap", "govern")
    pub stage: String,

    /// Progress through the invocation [0.0, 1.0]
    pub progress: f32,

    pub message: String,

    /// Stage counters (input/output sizes, thresholds)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl TraceEntry {
    pub fn new(stage: impl Into<String>, progress: f32, message: impl Into<String>) -> Self {
        TraceEntry {
            timestamp: Utc::now().to_rfc3339(),
            stage: stage.into(),
            progress: progress.clamp(0.0, 1.0),
            message: message.into(),
            data: None,
        }
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Serialize to JSON line (with newline)
    pub fn to_json_line(&self) -> Result<String, serde_json::Error> {
        let json = serde_json::to_string(self)?;
        Ok(format!("{}\n", json))
    }
}

/// Helper builder for stage entries
pub struct TraceBuilder {
    stage: Stage,
}

impl TraceBuilder {
    pub fn stage(stage: Stage) -> Self {
        TraceBuilder { stage }
    }

    /// Entry for a stage that just finished
    pub fn complete(self, message: impl Into<String>, data: serde_json::Value) -> TraceEntry {
        TraceEntry::new(self.stage.as_str(), self.stage.progress(), message).with_data(data)
    }

    /// Entry for a stage that was skipped or degraded
    pub fn note(self, message: impl Into<String>) -> TraceEntry {
        TraceEntry::new(self.stage.as_str(), self.stage.progress(), message)
    }
}

/// Append-only JSONL trace writer, shareable across worker threads
#[derive(Debug, Clone)]
pub struct TraceWriter {
    file_path: PathBuf,
    lock: Arc<Mutex<()>>,
}

impl TraceWriter {
    pub fn new(file_path: PathBuf) -> Self {
        TraceWriter {
            file_path,
            lock: Arc::new(Mutex::new(())),
        }
    }

    /// Append entries as one write; creates the file if it doesn't exist
    pub fn write_batch(&self, entries: &[TraceEntry]) -> Result<(), TraceError> {
        let mut lines = String::new();
        for entry in entries {
            lines.push_str(&entry.to_json_line()?);
        }

        // a poisoned lock only means another writer panicked mid-append
        let _guard = self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.file_path)?;
        file.write_all(lines.as_bytes())?;
        file.flush()?;

        Ok(())
    }

    pub fn write(&self, entry: &TraceEntry) -> Result<(), TraceError> {
        self.write_batch(std::slice::from_ref(entry))
    }

    /// Write entries, logging instead of failing
    pub fn record(&self, entries: &[TraceEntry]) {
        if let Err(e) = self.write_batch(entries) {
            log::warn!("Failed to write trace to {}: {}", self.file_path.display(), e);
        }
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }
}

/// Read trace entries from a JSONL file
pub fn read_trace_file(path: &Path) -> Result<Vec<TraceEntry>, TraceError> {
    let contents = std::fs::read_to_string(path)?;
    let mut entries = Vec::new();

    for line in contents.lines() {
        if line.trim().is_empty() {
            continue;
        }
        entries.push(serde_json::from_str(line)?);
    }

    Ok(entries)
}
