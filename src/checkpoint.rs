//! Periodic crawl checkpoints
//!
//! A checkpoint snapshots the accumulated records plus the last fully
//! processed page index. Resuming from one is a manual operator action: the
//! next run is pointed at the checkpoint explicitly, nothing is auto-detected
//! on startup.

use crate::record::ResultRecord;
use crate::{Result, ScrapeError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// On-disk snapshot of crawl progress
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckpointState {
    pub entries: Vec<ResultRecord>,
    pub last_page: u32,
    /// RFC 3339 timestamp of when the snapshot was written
    pub timestamp: String,
}

/// Writes snapshots every `interval` processed pages
#[derive(Debug)]
pub struct Checkpointer {
    path: PathBuf,
    interval: u32,
    pages_done: u32,
}

impl Checkpointer {
    pub fn new(path: impl Into<PathBuf>, interval: u32) -> Self {
        Self {
            path: path.into(),
            interval,
            pages_done: 0,
        }
    }

    /// Records one fully processed page, snapshotting on the interval
    pub fn page_done(&mut self, records: &[ResultRecord], last_page: u32) -> Result<()> {
        self.pages_done += 1;
        if self.pages_done % self.interval == 0 {
            self.snapshot(records, last_page)?;
        }
        Ok(())
    }

    /// Writes a snapshot unconditionally
    ///
    /// Also used for the final flush on shutdown.
    pub fn snapshot(&self, records: &[ResultRecord], last_page: u32) -> Result<()> {
        let state = CheckpointState {
            entries: records.to_vec(),
            last_page,
            timestamp: chrono::Utc::now().to_rfc3339(),
        };
        let json = serde_json::to_string_pretty(&state)?;
        std::fs::write(&self.path, json)?;
        tracing::info!(
            "Checkpoint saved: {} records through page {} -> {}",
            state.entries.len(),
            last_page,
            self.path.display()
        );
        Ok(())
    }
}

/// Loads a checkpoint file for a manual resume
pub fn load_checkpoint(path: &Path) -> Result<CheckpointState> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        ScrapeError::Checkpoint(format!("cannot read {}: {}", path.display(), e))
    })?;
    let state: CheckpointState = serde_json::from_str(&content)
        .map_err(|e| ScrapeError::Checkpoint(format!("cannot parse {}: {}", path.display(), e)))?;
    Ok(state)
}
