//! Static hazard catalog: event type to severity rank, display color, and
//! category.
//!
//! The table lives in `data/hazards.json` so new event types can be added
//! without touching logic. Lookup is exact-string; an unknown event type
//! gets the lowest precedence, a neutral color, and a keyword-derived
//! category.

use std::collections::HashMap;

use anyhow::Result;
use serde::Deserialize;

/// Fill color for event types the catalog does not know.
pub const DEFAULT_COLOR: &str = "#95a5a6";

/// Priority assigned to unknown event types; sorts before (renders under)
/// everything the catalog knows.
pub const DEFAULT_PRIORITY: u32 = u32::MAX;

static HAZARD_TABLE: &str = include_str!("data/hazards.json");

/// Keyword groups for coarse category classification, checked in order.
/// The first group with a matching keyword wins; no match falls into
/// "Other". More specific phrases come before the generic ones they
/// contain ("Winter Storm" before "Storm").
static CATEGORY_KEYWORDS: &[(&str, &[&str])] = &[
    ("Tornado", &["Tornado"]),
    ("Severe Storm", &["Severe Thunderstorm", "Special Weather"]),
    ("Tropical", &["Hurricane", "Tropical", "Typhoon"]),
    ("Winter", &["Winter", "Blizzard", "Ice", "Snow", "Freez", "Frost", "Wind Chill"]),
    ("Coastal", &["Coastal", "Surge", "Tsunami", "Surf", "Rip Current", "Beach"]),
    ("Flood", &["Flood"]),
    ("Marine", &["Small Craft", "Gale", "Marine", "Waterspout", "Sea"]),
    ("Heat", &["Heat"]),
    ("Fog", &["Fog", "Smoke"]),
    ("Fire", &["Fire", "Red Flag"]),
    ("Wind", &["Wind"]),
];

#[derive(Debug, Clone, Deserialize)]
struct HazardEntry {
    event: String,
    priority: u32,
    color: String,
    category: String,
}

/// Display tags for one event type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HazardTags {
    pub priority: u32,
    pub color: String,
    pub category: String,
}

/// Immutable event-type lookup table. Built once per process, shared by
/// reference through the pass.
pub struct HazardCatalog {
    entries: HashMap<String, HazardEntry>,
}

impl HazardCatalog {
    /// Parses a catalog from a JSON array of
    /// `{event, priority, color, category}` rows.
    pub fn from_json(json: &str) -> Result<Self> {
        let rows: Vec<HazardEntry> = serde_json::from_str(json)?;
        let entries = rows.into_iter().map(|e| (e.event.clone(), e)).collect();
        Ok(Self { entries })
    }

    /// The catalog shipped with the crate.
    pub fn builtin() -> Self {
        Self::from_json(HAZARD_TABLE).expect("embedded hazard table is valid")
    }

    /// Returns the display tags for an event type. Never fails: unknown
    /// event types get the default priority/color and a keyword-derived
    /// category.
    pub fn lookup(&self, event_type: &str) -> HazardTags {
        match self.entries.get(event_type) {
            Some(e) => HazardTags {
                priority: e.priority,
                color: e.color.clone(),
                category: e.category.clone(),
            },
            None => HazardTags {
                priority: DEFAULT_PRIORITY,
                color: DEFAULT_COLOR.to_string(),
                category: categorize(event_type).to_string(),
            },
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Coarse keyword classification of an event-type name. First matching
/// keyword group wins; unmatched names fall into "Other".
pub fn categorize(event_type: &str) -> &'static str {
    for (category, keywords) in CATEGORY_KEYWORDS {
        if keywords.iter().any(|k| event_type.contains(k)) {
            return category;
        }
    }
    "Other"
}
