//! Classifier and sequencer: attaches catalog tags and produces the final
//! render order and legend.

use std::collections::HashMap;

use crate::catalog::HazardCatalog;
use crate::model::{AlertRecord, ClassifiedRecord, LegendEntry};

/// Tags each record with priority, color, and category from the catalog.
pub fn classify(records: Vec<AlertRecord>, catalog: &HazardCatalog) -> Vec<ClassifiedRecord> {
    records
        .into_iter()
        .map(|record| {
            let tags = catalog.lookup(&record.event_type);
            ClassifiedRecord {
                record,
                priority: tags.priority,
                color: tags.color,
                category: tags.category,
            }
        })
        .collect()
}

/// Orders records for rendering: most severe (lowest priority value) last.
///
/// The renderer draws in sequence order and later shapes occlude earlier
/// ones, so the severe hazards must come last to stay visible where
/// hazards overlap. The sort is stable; equal priorities keep their input
/// order.
pub fn sequence(records: &mut [ClassifiedRecord]) {
    records.sort_by(|a, b| b.priority.cmp(&a.priority));
}

/// Builds the legend: each distinct event type once, with its color,
/// ordered most severe first (ties broken by name for determinism).
pub fn legend(records: &[ClassifiedRecord]) -> Vec<LegendEntry> {
    let mut by_event: HashMap<&str, (u32, &str)> = HashMap::new();
    for r in records {
        by_event
            .entry(r.record.event_type.as_str())
            .or_insert((r.priority, r.color.as_str()));
    }

    let mut rows: Vec<(&str, u32, &str)> = by_event
        .into_iter()
        .map(|(event, (priority, color))| (event, priority, color))
        .collect();
    rows.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(b.0)));

    rows.into_iter()
        .map(|(event, _, color)| LegendEntry {
            event_type: event.to_string(),
            color: color.to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MessageType;
    use serde_json::json;

    fn record(id: &str, event: &str) -> AlertRecord {
        AlertRecord {
            id: id.to_string(),
            event_type: event.to_string(),
            headline: None,
            description: None,
            message_type: MessageType::Alert,
            ends_at: None,
            affected_zone_refs: vec![],
            geometry: Some(json!({"type": "Polygon", "coordinates": []})),
        }
    }

    fn classified(records: Vec<AlertRecord>) -> Vec<ClassifiedRecord> {
        classify(records, &HazardCatalog::builtin())
    }

    #[test]
    fn test_classify_attaches_catalog_tags() {
        let out = classified(vec![record("a1", "Tornado Warning")]);
        assert_eq!(out[0].priority, 2);
        assert_eq!(out[0].color, "#FF0000");
        assert_eq!(out[0].category, "Tornado");
    }

    #[test]
    fn test_classify_unknown_event() {
        let out = classified(vec![record("a1", "Ball Lightning Warning")]);
        assert_eq!(out[0].priority, u32::MAX);
        assert_eq!(out[0].color, crate::catalog::DEFAULT_COLOR);
    }

    #[test]
    fn test_sequence_most_severe_last() {
        let mut out = classified(vec![
            record("a1", "Tornado Warning"),       // priority 2
            record("a2", "Small Craft Advisory"),  // priority 28
            record("a3", "Gale Warning"),          // priority 16
        ]);
        sequence(&mut out);

        let ids: Vec<&str> = out.iter().map(|r| r.record.id.as_str()).collect();
        assert_eq!(ids, ["a2", "a3", "a1"]);
        for pair in out.windows(2) {
            assert!(pair[0].priority >= pair[1].priority);
        }
    }

    #[test]
    fn test_sequence_is_stable_for_ties() {
        let mut out = classified(vec![
            record("first", "Gale Warning"),
            record("a", "Tornado Warning"),
            record("second", "Gale Warning"),
        ]);
        sequence(&mut out);

        let ids: Vec<&str> = out.iter().map(|r| r.record.id.as_str()).collect();
        assert_eq!(ids, ["first", "second", "a"]);
    }

    #[test]
    fn test_legend_distinct_sorted_by_severity() {
        let out = classified(vec![
            record("a1", "Small Craft Advisory"),
            record("a2", "Tornado Warning"),
            record("a3", "Small Craft Advisory"),
        ]);
        let legend = legend(&out);

        assert_eq!(legend.len(), 2);
        assert_eq!(legend[0].event_type, "Tornado Warning");
        assert_eq!(legend[1].event_type, "Small Craft Advisory");
        assert_eq!(legend[1].color, "#3498db");
    }

    #[test]
    fn test_legend_empty_input() {
        assert!(legend(&[]).is_empty());
    }
}
