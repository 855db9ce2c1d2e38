//! Pass-scoped cache of resolved zone geometry.
//!
//! Many alerts in one pass reference the same marine zone, and the zone
//! endpoint is the slowest upstream call, so each zone must be fetched at
//! most once per pass. Failures are cached too (`None`) so a dead zone is
//! not retried for every alert that references it.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde_json::Value;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use crate::fetch::{FetchPolicy, HttpClient};
use crate::parser::parse_zone_geometry;

type ZoneCell = Arc<OnceCell<Option<Value>>>;

/// Memoized zone-ref to geometry lookups for a single pass.
///
/// The mutex guards only the map of cells; the per-zone [`OnceCell`] makes
/// concurrent resolvers of the same zone wait on one in-flight fetch
/// instead of issuing their own.
#[derive(Default)]
pub struct ZoneShapeCache {
    shapes: Mutex<HashMap<String, ZoneCell>>,
}

impl ZoneShapeCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the geometry for `zone_ref`, fetching it on first use.
    /// `None` means the zone could not be resolved this pass, either now
    /// or on an earlier attempt.
    pub async fn resolve<C: HttpClient>(
        &self,
        client: &C,
        policy: &FetchPolicy,
        zone_ref: &str,
    ) -> Option<Value> {
        let cell = {
            let mut shapes = self.shapes.lock().unwrap();
            shapes
                .entry(zone_ref.to_string())
                .or_insert_with(|| Arc::new(OnceCell::new()))
                .clone()
        };

        cell.get_or_init(|| async {
            debug!(zone = %zone_ref, "Fetching zone geometry");
            let geometry = match policy.get_or_skip(client, zone_ref).await {
                Some(doc) => parse_zone_geometry(&doc),
                None => None,
            };
            if geometry.is_none() {
                warn!(zone = %zone_ref, "Zone unresolved for this pass");
            }
            geometry
        })
        .await
        .clone()
    }

    /// Number of distinct zone refs looked up so far.
    pub fn len(&self) -> usize {
        self.shapes.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.lock().unwrap().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct CountingClient {
        calls: AtomicUsize,
        fail: bool,
    }

    impl CountingClient {
        fn new(fail: bool) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail,
            }
        }
    }

    #[async_trait]
    impl HttpClient for CountingClient {
        async fn get_json(&self, _url: &str, _timeout: Duration) -> anyhow::Result<Value> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(anyhow!("503 service unavailable"))
            } else {
                Ok(json!({"geometry": {"type": "Polygon", "coordinates": []}}))
            }
        }
    }

    fn policy() -> FetchPolicy {
        FetchPolicy::new("zone", Duration::from_secs(1))
    }

    #[tokio::test]
    async fn test_second_lookup_hits_cache() {
        let client = CountingClient::new(false);
        let cache = ZoneShapeCache::new();

        let first = cache.resolve(&client, &policy(), "zone/AMZ150").await;
        let second = cache.resolve(&client, &policy(), "zone/AMZ150").await;

        assert!(first.is_some());
        assert_eq!(first, second);
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failure_is_cached_negative() {
        let client = CountingClient::new(true);
        let cache = ZoneShapeCache::new();

        assert!(cache.resolve(&client, &policy(), "zone/AMZ150").await.is_none());
        assert!(cache.resolve(&client, &policy(), "zone/AMZ150").await.is_none());
        // The failed fetch is not retried within the pass.
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_distinct_zones_fetch_separately() {
        let client = CountingClient::new(false);
        let cache = ZoneShapeCache::new();

        cache.resolve(&client, &policy(), "zone/AMZ150").await;
        cache.resolve(&client, &policy(), "zone/AMZ152").await;

        assert_eq!(client.calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.len(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_lookups_collapse() {
        let client = Arc::new(CountingClient::new(false));
        let cache = Arc::new(ZoneShapeCache::new());

        let mut tasks = vec![];
        for _ in 0..8 {
            let client = client.clone();
            let cache = cache.clone();
            tasks.push(tokio::spawn(async move {
                cache.resolve(&*client, &policy(), "zone/ANZ680").await
            }));
        }
        for task in tasks {
            assert!(task.await.unwrap().is_some());
        }

        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
    }
}
