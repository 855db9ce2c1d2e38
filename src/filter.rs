//! Filter/dedup stage: drops duplicate, cancelled, and expired records.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::model::AlertRecord;

#[derive(Debug, Clone, Default)]
pub struct FilterOptions {
    /// Also treat records whose headline or description mentions
    /// "CANCELLED" as cancelled. Off by default: the text scan can false
    /// positive on prose that mentions another hazard's cancellation, and
    /// the structured message type is authoritative.
    pub scan_text_for_cancellation: bool,
}

/// Removes already-seen, cancelled, and expired records, preserving input
/// order. First-seen wins for duplicate ids; `now` is the pass reference
/// time, fixed once so every record faces the same expiry cutoff.
pub fn filter_active(
    records: Vec<AlertRecord>,
    now: DateTime<Utc>,
    opts: &FilterOptions,
) -> Vec<AlertRecord> {
    let total = records.len();
    let mut seen: HashSet<String> = HashSet::new();
    let mut kept = Vec::with_capacity(total);

    for record in records {
        if !seen.insert(record.id.clone()) {
            debug!(alert = %record.id, "Duplicate id, dropping");
            continue;
        }
        if record.message_type.is_cancel() {
            debug!(alert = %record.id, "Cancelled, dropping");
            continue;
        }
        if opts.scan_text_for_cancellation && mentions_cancellation(&record) {
            debug!(alert = %record.id, "Cancellation text match, dropping");
            continue;
        }
        if let Some(ends) = record.ends_at {
            if ends < now {
                debug!(alert = %record.id, ends = %ends, "Expired, dropping");
                continue;
            }
        }
        kept.push(record);
    }

    info!(total, kept = kept.len(), "Filtered alert records");
    kept
}

fn mentions_cancellation(record: &AlertRecord) -> bool {
    let hit = |text: &Option<String>| {
        text.as_deref()
            .is_some_and(|t| t.to_uppercase().contains("CANCELLED"))
    };
    hit(&record.headline) || hit(&record.description)
}
