//! Final aggregation of accumulated records
//!
//! The listing endpoint is assumed not to repeat rows across pages within one
//! run; deduplication here is the guard that makes the output's `entry_url`
//! uniqueness unconditional rather than an assumption.

use crate::record::ResultRecord;
use std::collections::HashSet;

/// Produces the final ordered output sequence
///
/// Drops any record whose `entry_url` repeats an earlier one (first
/// occurrence wins), then truncates to `max_entries`. Discovery order is
/// preserved throughout; truncation simply excludes later-discovered records.
pub fn finalize(records: Vec<ResultRecord>, max_entries: usize) -> Vec<ResultRecord> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut output: Vec<ResultRecord> = Vec::with_capacity(records.len().min(max_entries));

    for record in records {
        let Some(url) = record.entry_url.clone() else {
            // Row parsing already discards link-less rows; a record without a
            // key cannot be deduplicated downstream, so it is dropped here too
            continue;
        };
        if !seen.insert(url) {
            tracing::debug!(
                "Dropping duplicate entry_url {:?}",
                record.entry_url.as_deref()
            );
            continue;
        }
        output.push(record);
        if output.len() >= max_entries {
            break;
        }
    }

    output
}
