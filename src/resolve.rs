//! Geometry resolver: gives every surviving record a renderable shape, or
//! drops it.
//!
//! The feed frequently omits polygons for zone-based (marine) hazards; the
//! zone endpoint is then the only source of geometry. One alert spanning
//! several zones expands into one output record per resolved zone so each
//! tile's polygon renders.

use tracing::debug;

use crate::fetch::{FetchPolicy, HttpClient};
use crate::model::AlertRecord;
use crate::zones::ZoneShapeCache;

/// Returns the zone id portion of a zone ref URI (its last path segment).
pub fn zone_id(zone_ref: &str) -> &str {
    zone_ref.rsplit('/').next().unwrap_or(zone_ref)
}

/// Optional allow-list of zone ids. A ref passes when its zone id equals
/// or starts with any listed entry; an absent list admits everything.
#[derive(Debug, Clone, Default)]
pub struct ZoneFilter(Option<Vec<String>>);

impl ZoneFilter {
    pub fn allow_all() -> Self {
        Self(None)
    }

    pub fn allow(wanted: Vec<String>) -> Self {
        Self(Some(wanted))
    }

    pub fn wants(&self, zone_ref: &str) -> bool {
        match &self.0 {
            None => true,
            Some(wanted) => {
                let id = zone_id(zone_ref);
                wanted.iter().any(|w| id == w || id.starts_with(w.as_str()))
            }
        }
    }
}

/// Resolves one record into zero or more shaped records.
///
/// A record with inline geometry passes through untouched. Otherwise each
/// wanted zone ref is resolved through the cache and yields one copy of
/// the record carrying that zone's shape. An empty return means no zone
/// resolved; the caller counts it, nothing more.
pub async fn resolve_record<C: HttpClient>(
    record: AlertRecord,
    client: &C,
    cache: &ZoneShapeCache,
    policy: &FetchPolicy,
    filter: &ZoneFilter,
) -> Vec<AlertRecord> {
    if record.geometry.is_some() {
        return vec![record];
    }

    let mut shaped = Vec::new();
    for zone_ref in &record.affected_zone_refs {
        if !filter.wants(zone_ref) {
            debug!(alert = %record.id, zone = %zone_id(zone_ref), "Zone outside allow-list");
            continue;
        }
        if let Some(geometry) = cache.resolve(client, policy, zone_ref).await {
            shaped.push(record.with_geometry(geometry));
        }
    }

    if shaped.is_empty() {
        debug!(alert = %record.id, "No zone yielded a shape, dropping record");
    }
    shaped
}
