//! Per-day JSON run log.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::warn;

use crate::error::RunLogError;

use super::PipelineResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunLogEntry {
    pub timestamp: DateTime<Local>,
    pub success: bool,
    pub daily_branch: String,
    pub workspace_name: String,
    pub result: PipelineResult,
    /// Milliseconds.
    pub duration: u64,
}

/// Appends run entries to `<dir>/<YYYY-MM-DD>.json`.
pub struct RunLog {
    dir: PathBuf,
}

impl RunLog {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// File holding the entries for `timestamp`'s day.
    pub fn file_for(&self, timestamp: &DateTime<Local>) -> PathBuf {
        self.dir
            .join(format!("{}.json", timestamp.format("%Y-%m-%d")))
    }

    fn read_entries(path: &Path) -> Vec<serde_json::Value> {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Vec::new();
        };
        serde_json::from_str(&content).unwrap_or_else(|e| {
            warn!("Replacing unreadable run log {}: {}", path.display(), e);
            Vec::new()
        })
    }

    /// Append `entry` to its day's file and return the file path.
    ///
    /// Existing entries are kept as raw JSON; a file that isn't a JSON array
    /// is replaced. The file is rewritten atomically.
    pub fn append(&self, entry: &RunLogEntry) -> Result<PathBuf, RunLogError> {
        std::fs::create_dir_all(&self.dir).map_err(RunLogError::CreateDir)?;

        let path = self.file_for(&entry.timestamp);
        let mut entries = Self::read_entries(&path);
        entries.push(serde_json::to_value(entry).map_err(RunLogError::Serialize)?);

        let json = serde_json::to_string_pretty(&entries).map_err(RunLogError::Serialize)?;
        let mut file = NamedTempFile::new_in(&self.dir).map_err(RunLogError::WriteFailed)?;
        file.write_all(json.as_bytes())
            .map_err(RunLogError::WriteFailed)?;
        file.persist(&path)
            .map_err(|e| RunLogError::WriteFailed(e.error))?;

        Ok(path)
    }
}
