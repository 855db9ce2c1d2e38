//! Core data types for one aggregation pass.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

/// NWS CAP message type. `Cancel` marks an alert as withdrawn.
///
/// Unknown values are preserved rather than rejected; the feed adds
/// message types occasionally and an unrecognized one is not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum MessageType {
    Alert,
    Update,
    Cancel,
    Other(String),
}

impl MessageType {
    pub fn from_feed(s: &str) -> Self {
        match s {
            "Alert" => Self::Alert,
            "Update" => Self::Update,
            "Cancel" => Self::Cancel,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn is_cancel(&self) -> bool {
        matches!(self, Self::Cancel)
    }
}

/// One hazard notification from an upstream feed.
///
/// `geometry` is carried as raw GeoJSON (`serde_json::Value`); the pipeline
/// never inspects coordinates, only whether a shape exists. A record may
/// arrive without geometry, in which case `affected_zone_refs` is the only
/// way to obtain a renderable shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertRecord {
    pub id: String,
    pub event_type: String,
    pub headline: Option<String>,
    pub description: Option<String>,
    pub message_type: MessageType,
    pub ends_at: Option<DateTime<Utc>>,
    pub affected_zone_refs: Vec<String>,
    pub geometry: Option<Value>,
}

impl AlertRecord {
    /// Returns a copy of this record carrying the given resolved shape.
    ///
    /// Used by the geometry resolver when one zone-based alert expands
    /// into one output record per resolved zone.
    pub fn with_geometry(&self, geometry: Value) -> Self {
        Self {
            geometry: Some(geometry),
            ..self.clone()
        }
    }
}

/// An [`AlertRecord`] with severity tags attached from the hazard catalog.
///
/// `priority` is a rank, not a score: lower values are more severe and must
/// be drawn last so they stay visible where hazards overlap.
#[derive(Debug, Clone, Serialize)]
pub struct ClassifiedRecord {
    pub record: AlertRecord,
    pub priority: u32,
    pub color: String,
    pub category: String,
}

/// One legend row: a distinct event type and its display color.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LegendEntry {
    pub event_type: String,
    pub color: String,
}

/// The product of one aggregation pass.
///
/// `records` is in render order (most severe last). `unresolved` counts
/// records dropped because no zone yielded a shape; it is informational,
/// not an error. An empty result is valid and means "no active hazards".
#[derive(Debug, Serialize)]
pub struct AggregationResult {
    pub records: Vec<ClassifiedRecord>,
    pub legend: Vec<LegendEntry>,
    pub unresolved: usize,
}

impl AggregationResult {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
