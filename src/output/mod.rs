//! Output artifact handling
//!
//! Writes the final record sequence as a JSON array for the downstream
//! loader (which upserts keyed on `entry_url`) and reads it back for the
//! coverage report.

pub mod stats;

pub use stats::{compute_coverage, print_coverage, FieldCoverage};

use crate::record::ResultRecord;
use crate::Result;
use std::path::Path;

/// Serializes the final records as a pretty JSON array
pub fn write_records(path: &Path, records: &[ResultRecord]) -> Result<()> {
    let json = serde_json::to_string_pretty(records)?;
    std::fs::write(path, json)?;
    tracing::info!("Wrote {} records to {}", records.len(), path.display());
    Ok(())
}

/// Reads a previously written record array
pub fn read_records(path: &Path) -> Result<Vec<ResultRecord>> {
    let content = std::fs::read_to_string(path)?;
    let records: Vec<ResultRecord> = serde_json::from_str(&content)?;
    Ok(records)
}
