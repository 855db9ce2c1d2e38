//! Parsers for the two upstream JSON shapes: active-alert feature
//! collections and single zone documents.

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, warn};

use crate::model::{AlertRecord, MessageType};

/// Extracts alert records from an active-alerts feature collection.
///
/// Features missing `id` or `event` are malformed and dropped with a
/// warning; everything else in the document is taken as-is. A document
/// with no `features` member yields an empty list.
pub fn parse_alerts(doc: &Value) -> Vec<AlertRecord> {
    let Some(features) = doc.get("features").and_then(Value::as_array) else {
        warn!("Feed document has no features array");
        return Vec::new();
    };

    let mut records = Vec::with_capacity(features.len());
    let mut dropped = 0usize;

    for feature in features {
        match parse_feature(feature) {
            Some(record) => records.push(record),
            None => dropped += 1,
        }
    }

    if dropped > 0 {
        warn!(dropped, "Dropped malformed features from feed document");
    }
    debug!(count = records.len(), "Parsed alert records");
    records
}

fn parse_feature(feature: &Value) -> Option<AlertRecord> {
    let props = feature.get("properties")?;

    // The feed repeats the id under properties; fall back to the feature
    // level id when the copy is missing.
    let id = props
        .get("id")
        .and_then(Value::as_str)
        .or_else(|| feature.get("id").and_then(Value::as_str))?
        .to_string();

    let event_type = props.get("event").and_then(Value::as_str)?.to_string();

    let message_type = props
        .get("messageType")
        .and_then(Value::as_str)
        .map(MessageType::from_feed)
        .unwrap_or(MessageType::Alert);

    let ends_at = props
        .get("ends")
        .and_then(Value::as_str)
        .and_then(|s| parse_timestamp(&id, s));

    let affected_zone_refs = props
        .get("affectedZones")
        .and_then(Value::as_array)
        .map(|zones| {
            zones
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    let geometry = feature.get("geometry").filter(|g| !g.is_null()).cloned();

    Some(AlertRecord {
        id,
        event_type,
        headline: string_field(props, "headline"),
        description: string_field(props, "description"),
        message_type,
        ends_at,
        affected_zone_refs,
        geometry,
    })
}

fn string_field(props: &Value, key: &str) -> Option<String> {
    props.get(key).and_then(Value::as_str).map(str::to_string)
}

fn parse_timestamp(id: &str, s: &str) -> Option<DateTime<Utc>> {
    match DateTime::parse_from_rfc3339(s) {
        Ok(t) => Some(t.with_timezone(&Utc)),
        Err(e) => {
            // An unparseable expiry means "no stated expiration" rather
            // than a dropped record.
            warn!(alert = %id, ends = %s, error = %e, "Unparseable ends timestamp");
            None
        }
    }
}

/// Extracts the geometry from a zone document, if it carries one.
pub fn parse_zone_geometry(doc: &Value) -> Option<Value> {
    doc.get("geometry").filter(|g| !g.is_null()).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn feature(id: &str, event: &str) -> Value {
        json!({
            "id": id,
            "properties": {
                "id": id,
                "event": event,
                "headline": format!("{event} issued"),
                "description": "Conditions expected.",
                "messageType": "Alert",
                "ends": "2026-08-25T18:00:00-04:00",
                "affectedZones": ["https://api.weather.gov/zones/forecast/AMZ150"]
            },
            "geometry": null
        })
    }

    #[test]
    fn test_parse_alerts_basic() {
        let doc = json!({"features": [feature("a1", "Gale Warning")]});
        let records = parse_alerts(&doc);

        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.id, "a1");
        assert_eq!(r.event_type, "Gale Warning");
        assert_eq!(r.message_type, MessageType::Alert);
        assert!(r.ends_at.is_some());
        assert_eq!(r.affected_zone_refs.len(), 1);
        assert!(r.geometry.is_none());
    }

    #[test]
    fn test_parse_alerts_keeps_inline_geometry() {
        let mut f = feature("a1", "Tornado Warning");
        f["geometry"] = json!({"type": "Polygon", "coordinates": [[[0.0, 0.0]]]});
        let records = parse_alerts(&json!({ "features": [f] }));

        assert_eq!(records.len(), 1);
        assert!(records[0].geometry.is_some());
    }

    #[test]
    fn test_parse_alerts_drops_malformed() {
        let doc = json!({"features": [
            feature("a1", "Gale Warning"),
            {"properties": {"event": "No Id Warning"}},
            {"id": "a3", "properties": {"headline": "no event field"}},
        ]});
        let records = parse_alerts(&doc);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "a1");
    }

    #[test]
    fn test_parse_alerts_missing_features() {
        assert!(parse_alerts(&json!({})).is_empty());
        assert!(parse_alerts(&json!({"features": []})).is_empty());
    }

    #[test]
    fn test_parse_alerts_bad_ends_is_open_ended() {
        let mut f = feature("a1", "Gale Warning");
        f["properties"]["ends"] = json!("not-a-timestamp");
        let records = parse_alerts(&json!({ "features": [f] }));

        assert_eq!(records.len(), 1);
        assert!(records[0].ends_at.is_none());
    }

    #[test]
    fn test_parse_zone_geometry() {
        let doc = json!({"geometry": {"type": "MultiPolygon", "coordinates": []}});
        assert!(parse_zone_geometry(&doc).is_some());
        assert!(parse_zone_geometry(&json!({"geometry": null})).is_none());
        assert!(parse_zone_geometry(&json!({})).is_none());
    }
}
